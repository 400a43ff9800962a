//! Inventory reconciliation: turns Bedrock before/after slot deltas into
//! acknowledged Java window clicks while keeping a local mirror of the
//! server-side window in step.

pub mod action;
pub mod click;
pub mod drop;
pub mod inventory;
pub mod outbox;
pub mod planner;
pub mod reconciler;
pub mod transaction;
pub mod translator;

pub use action::{Action, ActionKind};
pub use click::Click;
pub use drop::DropKind;
pub use inventory::{Inventory, InventoryMirror};
pub use outbox::{DownstreamPacket, Outbound, Outbox, PendingRetry, UpstreamPacket};
pub use planner::{CraftFollowUp, Plan, Planner};
pub use reconciler::{InventoryReconciler, ReconcilerConfig};
pub use transaction::{Transaction, TransactionHandle, TransactionQueue};
pub use translator::{InventoryTranslator, Layout, SlotType};
