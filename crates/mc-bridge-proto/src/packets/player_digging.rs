//! PlayerDigging (0x1B): Client → Server (Java).
//!
//! Besides mining, this packet carries the drop-key actions for the item in
//! the selected hotbar slot.

use bytes::BufMut;
use serde::Serialize;

use crate::codec::ProtoEncode;
use crate::types::{BlockPos, JavaVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiggingStatus {
    DropItemStack = 3,
    DropItem = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerDigging {
    pub status: DiggingStatus,
    pub position: BlockPos,
    /// Block face; drops always use 0 (down).
    pub face: i8,
}

impl PlayerDigging {
    /// A hand drop: position and face are ignored by the server.
    pub fn drop(status: DiggingStatus) -> Self {
        Self {
            status,
            position: BlockPos::default(),
            face: 0,
        }
    }
}

impl ProtoEncode for PlayerDigging {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        JavaVarInt(self.status as i32).proto_encode(buf);
        self.position.proto_encode(buf);
        buf.put_i8(self.face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_drop_stack() {
        let mut buf = BytesMut::new();
        PlayerDigging::drop(DiggingStatus::DropItemStack).proto_encode(&mut buf);
        assert_eq!(buf.len(), 1 + 8 + 1);
        assert_eq!(buf[0], 3);
        assert!(buf[1..].iter().all(|b| *b == 0));
    }
}
