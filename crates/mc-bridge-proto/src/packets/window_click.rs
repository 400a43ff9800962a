//! ClickWindow (0x09): Client → Server (Java).
//!
//! One click on one slot of the open window. The server answers with a
//! WindowConfirmation carrying the same action number.

use bytes::BufMut;
use serde::Serialize;

use crate::codec::ProtoEncode;
use crate::item_stack::ItemStack;
use crate::types::JavaVarInt;

/// Slot index meaning "outside the window" (drops from the cursor).
pub const OUTSIDE_SLOT: i16 = -999;

/// Click mode; together with `button` it selects the vanilla click behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickMode {
    /// Plain left (button 0) or right (button 1) click.
    Pickup = 0,
    /// Shift click.
    QuickMove = 1,
    /// Drop key over a slot: button 0 drops one, button 1 drops the stack.
    Throw = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowClick {
    pub window_id: u8,
    pub slot: i16,
    pub button: i8,
    pub action_id: i16,
    pub mode: ClickMode,
    /// What the client believes is in the slot before the click.
    pub clicked_item: ItemStack,
}

impl ProtoEncode for WindowClick {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_i16(self.slot);
        buf.put_i8(self.button);
        buf.put_i16(self.action_id);
        JavaVarInt(self.mode as i32).proto_encode(buf);
        self.clicked_item.write_java_slot(buf);
    }
}
