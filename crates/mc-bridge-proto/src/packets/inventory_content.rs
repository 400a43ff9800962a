//! InventoryContent (0x31): Server → Client.
//!
//! Replaces every slot of a container at once. Used to resync the client.

use bytes::BufMut;
use serde::Serialize;

use crate::codec::ProtoEncode;
use crate::item_stack::ItemStack;
use crate::types::VarUInt32;

/// Full contents of a container window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryContent {
    /// Container window ID.
    pub window_id: u32,
    /// All items in the container, indexed by slot.
    pub items: Vec<ItemStack>,
}

impl ProtoEncode for InventoryContent {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        VarUInt32(self.items.len() as u32).proto_encode(buf);
        for item in &self.items {
            item.proto_encode(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_empty_container() {
        let pkt = InventoryContent {
            window_id: 0,
            items: vec![ItemStack::empty(); 3],
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x03, 0x00, 0x00, 0x00]);
    }
}
