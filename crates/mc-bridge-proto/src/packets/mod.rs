//! Packet definitions for both editions.
//!
//! Bedrock (upstream): the inventory action list and the two packets used to
//! push inventory state back to the client. Java (downstream): the window
//! requests the bridge sends on the client's behalf.

pub mod confirm_transaction;
pub mod inventory_content;
pub mod inventory_slot;
pub mod inventory_transaction;
pub mod player_digging;
pub mod window_click;

pub use confirm_transaction::ConfirmTransaction;
pub use inventory_content::InventoryContent;
pub use inventory_slot::InventorySlot;
pub use inventory_transaction::{
    container_id, InventoryActionData, InventoryActions, InventorySource, SourceFlag,
};
pub use player_digging::{DiggingStatus, PlayerDigging};
pub use window_click::{ClickMode, WindowClick, OUTSIDE_SLOT};

/// Java serverbound packet IDs (1.16.x play state).
pub mod java_id {
    pub const WINDOW_CONFIRMATION: i32 = 0x07;
    pub const CLICK_WINDOW: i32 = 0x09;
    pub const PLAYER_DIGGING: i32 = 0x1B;
}

/// Bedrock clientbound packet IDs.
pub mod bedrock_id {
    pub const INVENTORY_CONTENT: u32 = 0x31;
    pub const INVENTORY_SLOT: u32 = 0x32;
}
