//! Inventory action list of a Bedrock InventoryTransaction (0x1E): Client → Server.
//!
//! A "normal" transaction reports what the client already did to its own
//! inventory as a list of per-slot before/after pairs. Only the action list
//! is decoded here; the surrounding transaction header is handled by the
//! packet dispatcher.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item_stack::ItemStack;
use crate::types::{VarInt, VarUInt32};

/// Bedrock container ids used by inventory sources.
pub mod container_id {
    pub const INVENTORY: i32 = 0;
    pub const OFFHAND: i32 = 119;
    pub const ARMOR: i32 = 120;
    /// The UI container. Slot 0 is the cursor.
    pub const UI: i32 = 124;
    pub const CURSOR: i32 = UI;
    pub const CRAFTING_RESULT: i32 = -4;
    pub const CRAFTING_USE_INGREDIENT: i32 = -5;
}

/// Largest action list we accept in one transaction.
const MAX_ACTIONS: u32 = 64;

/// Flag attached to a world-interaction source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFlag {
    DropItem,
    PickupItem,
    None,
    Other(u32),
}

impl SourceFlag {
    fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::DropItem,
            1 => Self::PickupItem,
            0xFFFF_FFFF => Self::None,
            other => Self::Other(other),
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            Self::DropItem => 0,
            Self::PickupItem => 1,
            Self::None => 0xFFFF_FFFF,
            Self::Other(v) => v,
        }
    }
}

/// Where an inventory action happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventorySource {
    Container { container_id: i32 },
    Global,
    WorldInteraction { flag: SourceFlag },
    Creative,
    UntrackedInteractionUi { container_id: i32 },
    NonImplemented { container_id: i32 },
}

impl InventorySource {
    /// Container id for sources that carry one.
    pub fn container_id(&self) -> Option<i32> {
        match *self {
            Self::Container { container_id }
            | Self::UntrackedInteractionUi { container_id }
            | Self::NonImplemented { container_id } => Some(container_id),
            _ => None,
        }
    }

    pub fn is_world_interaction(&self) -> bool {
        matches!(self, Self::WorldInteraction { .. })
    }
}

impl ProtoDecode for InventorySource {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let kind = VarUInt32::proto_decode(buf)?.0;
        Ok(match kind {
            0 => Self::Container {
                container_id: VarInt::proto_decode(buf)?.0,
            },
            1 => Self::Global,
            2 => Self::WorldInteraction {
                flag: SourceFlag::from_u32(VarUInt32::proto_decode(buf)?.0),
            },
            3 => Self::Creative,
            100 => Self::UntrackedInteractionUi {
                container_id: VarInt::proto_decode(buf)?.0,
            },
            99999 => Self::NonImplemented {
                container_id: VarInt::proto_decode(buf)?.0,
            },
            other => return Err(ProtoError::UnknownSourceType(other)),
        })
    }
}

impl ProtoEncode for InventorySource {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        match *self {
            Self::Container { container_id } => {
                VarUInt32(0).proto_encode(buf);
                VarInt(container_id).proto_encode(buf);
            }
            Self::Global => VarUInt32(1).proto_encode(buf),
            Self::WorldInteraction { flag } => {
                VarUInt32(2).proto_encode(buf);
                VarUInt32(flag.to_u32()).proto_encode(buf);
            }
            Self::Creative => VarUInt32(3).proto_encode(buf),
            Self::UntrackedInteractionUi { container_id } => {
                VarUInt32(100).proto_encode(buf);
                VarInt(container_id).proto_encode(buf);
            }
            Self::NonImplemented { container_id } => {
                VarUInt32(99999).proto_encode(buf);
                VarInt(container_id).proto_encode(buf);
            }
        }
    }
}

/// One touched slot: where, which slot, and its contents before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryActionData {
    pub source: InventorySource,
    pub slot: u32,
    pub from_item: ItemStack,
    pub to_item: ItemStack,
}

impl InventoryActionData {
    /// Whether this action describes the cursor (UI container, slot 0).
    pub fn is_cursor(&self) -> bool {
        self.source.container_id() == Some(container_id::CURSOR) && self.slot == 0
    }
}

impl ProtoDecode for InventoryActionData {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let source = InventorySource::proto_decode(buf)?;
        let slot = VarUInt32::proto_decode(buf)?.0;
        let from_item = ItemStack::proto_decode(buf)?;
        let to_item = ItemStack::proto_decode(buf)?;
        Ok(Self {
            source,
            slot,
            from_item,
            to_item,
        })
    }
}

impl ProtoEncode for InventoryActionData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.source.proto_encode(buf);
        VarUInt32(self.slot).proto_encode(buf);
        self.from_item.proto_encode(buf);
        self.to_item.proto_encode(buf);
    }
}

/// The decoded action list of one normal transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryActions {
    pub actions: Vec<InventoryActionData>,
}

impl ProtoDecode for InventoryActions {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let count = VarUInt32::proto_decode(buf)?.0;
        if count > MAX_ACTIONS {
            return Err(ProtoError::TooManyActions(count));
        }
        let mut actions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            actions.push(InventoryActionData::proto_decode(buf)?);
        }
        Ok(Self { actions })
    }
}

impl ProtoEncode for InventoryActions {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.actions.len() as u32).proto_encode(buf);
        for action in &self.actions {
            action.proto_encode(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn cursor_action(from: ItemStack, to: ItemStack) -> InventoryActionData {
        InventoryActionData {
            source: InventorySource::Container {
                container_id: container_id::CURSOR,
            },
            slot: 0,
            from_item: from,
            to_item: to,
        }
    }

    #[test]
    fn decode_pickup_batch() {
        let actions = InventoryActions {
            actions: vec![
                cursor_action(ItemStack::empty(), ItemStack::new(1, 32)),
                InventoryActionData {
                    source: InventorySource::Container {
                        container_id: container_id::INVENTORY,
                    },
                    slot: 12,
                    from_item: ItemStack::new(1, 32),
                    to_item: ItemStack::empty(),
                },
            ],
        };
        let mut buf = BytesMut::new();
        actions.proto_encode(&mut buf);
        let decoded = InventoryActions::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, actions);
        assert!(decoded.actions[0].is_cursor());
        assert!(!decoded.actions[1].is_cursor());
    }

    #[test]
    fn decode_world_drop_source() {
        let mut buf = BytesMut::new();
        VarUInt32(2).proto_encode(&mut buf);
        VarUInt32(0).proto_encode(&mut buf);
        let source = InventorySource::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(
            source,
            InventorySource::WorldInteraction {
                flag: SourceFlag::DropItem
            }
        );
        assert!(source.is_world_interaction());
        assert_eq!(source.container_id(), None);
    }

    #[test]
    fn unknown_source_type_is_error() {
        let mut buf = BytesMut::new();
        VarUInt32(7).proto_encode(&mut buf);
        assert!(matches!(
            InventorySource::proto_decode(&mut buf.freeze()),
            Err(ProtoError::UnknownSourceType(7))
        ));
    }

    #[test]
    fn oversized_action_list_is_rejected() {
        let mut buf = BytesMut::new();
        VarUInt32(1000).proto_encode(&mut buf);
        assert!(matches!(
            InventoryActions::proto_decode(&mut buf.freeze()),
            Err(ProtoError::TooManyActions(1000))
        ));
    }

    #[test]
    fn cursor_requires_slot_zero() {
        let mut action = cursor_action(ItemStack::empty(), ItemStack::empty());
        action.slot = 28;
        assert!(!action.is_cursor());
    }
}
