//! InventorySlot (0x32): Server → Client.
//!
//! Updates a single slot in a container. The cursor is slot 0 of the UI
//! container.

use bytes::BufMut;
use serde::Serialize;

use crate::codec::ProtoEncode;
use crate::item_stack::ItemStack;
use crate::packets::inventory_transaction::container_id;
use crate::types::VarUInt32;

/// Update a single container slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySlot {
    /// Container window ID.
    pub window_id: u32,
    /// Slot index within the container.
    pub slot: u32,
    /// The item to set in the slot.
    pub item: ItemStack,
}

impl InventorySlot {
    /// Set the client's cursor.
    pub fn cursor(item: ItemStack) -> Self {
        Self {
            window_id: container_id::CURSOR as u32,
            slot: 0,
            item,
        }
    }
}

impl ProtoEncode for InventorySlot {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        VarUInt32(self.slot).proto_encode(buf);
        self.item.proto_encode(buf);
    }
}
