//! Drop operations: the Q key over a slot, over the held item, or a click
//! outside the window with items on the cursor.

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{
    ClickMode, DiggingStatus, PlayerDigging, WindowClick, OUTSIDE_SLOT,
};

use crate::inventory::InventoryMirror;
use crate::outbox::DownstreamPacket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    OneFromSlot,
    StackFromSlot,
    OneFromHand,
    StackFromHand,
    OneFromCursor,
    StackFromCursor,
}

impl DropKind {
    /// Hand drops travel as a player action, which carries no action number.
    pub fn is_hand(self) -> bool {
        matches!(self, Self::OneFromHand | Self::StackFromHand)
    }

    /// Remove the dropped items from the mirror.
    pub fn apply(self, mirror: &mut InventoryMirror, slot: usize) {
        match self {
            Self::OneFromSlot | Self::OneFromHand => {
                let item = mirror.get_item(slot);
                let remaining = item.with_count(item.count.saturating_sub(1));
                mirror.set_item(slot, remaining);
            }
            Self::StackFromSlot | Self::StackFromHand => {
                mirror.set_item(slot, ItemStack::empty());
            }
            Self::OneFromCursor => {
                let cursor = &mirror.cursor;
                mirror.cursor = cursor.with_count(cursor.count.saturating_sub(1));
            }
            Self::StackFromCursor => mirror.cursor = ItemStack::empty(),
        }
    }

    /// Build the downstream request. `action_id` is ignored for hand drops.
    pub fn request(self, window_id: u8, action_id: i16, slot: usize) -> DownstreamPacket {
        match self {
            Self::OneFromSlot | Self::StackFromSlot => DownstreamPacket::WindowClick(WindowClick {
                window_id,
                slot: slot as i16,
                button: i8::from(self == Self::StackFromSlot),
                action_id,
                mode: ClickMode::Throw,
                clicked_item: ItemStack::empty(),
            }),
            Self::OneFromCursor | Self::StackFromCursor => {
                DownstreamPacket::WindowClick(WindowClick {
                    window_id,
                    slot: OUTSIDE_SLOT,
                    // Right click outside drops one, left click drops everything.
                    button: i8::from(self == Self::OneFromCursor),
                    action_id,
                    mode: ClickMode::Pickup,
                    clicked_item: ItemStack::empty(),
                })
            }
            Self::OneFromHand => {
                DownstreamPacket::PlayerDigging(PlayerDigging::drop(DiggingStatus::DropItem))
            }
            Self::StackFromHand => {
                DownstreamPacket::PlayerDigging(PlayerDigging::drop(DiggingStatus::DropItemStack))
            }
        }
    }
}
