//! WindowConfirmation (0x07): Client → Server (Java).
//!
//! After the server rejects a click, it ignores further clicks in that window
//! until the client answers with an accepting confirmation for the same
//! action number.

use bytes::BufMut;
use serde::Serialize;

use crate::codec::ProtoEncode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmTransaction {
    pub window_id: u8,
    pub action_id: i16,
    pub accepted: bool,
}

impl ProtoEncode for ConfirmTransaction {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_i16(self.action_id);
        buf.put_u8(self.accepted as u8);
    }
}
