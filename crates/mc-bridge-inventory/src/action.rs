//! Actions: the atomic steps of a plan.
//!
//! Each action is one click, one drop, or a full client resync. Actions are
//! ordered by `(weight, sequence)`; the sequence is a process-wide counter
//! taken at creation, so actions of equal weight run in creation order.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tracing::debug;

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{InventorySlot, WindowClick};

use crate::click::Click;
use crate::drop::DropKind;
use crate::inventory::InventoryMirror;
use crate::outbox::{DownstreamPacket, Outbox, UpstreamPacket};
use crate::translator::InventoryTranslator;

/// Weight of a resync so it sorts after every click of the same transaction.
pub const REFRESH_WEIGHT: i32 = 10;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Click {
        click: Click,
        slot: usize,
        /// Send the refresh sentinel instead of the mirrored item.
        refresh: bool,
    },
    Drop {
        kind: DropKind,
        slot: usize,
    },
    /// Push the mirrored window and cursor to the client.
    Refresh,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub kind: ActionKind,
    pub weight: i32,
    sequence: u64,
}

/// What running an action left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// A request carrying this action number is waiting for the server's answer.
    AwaitConfirm(i16),
    /// Sent with this action number but the transaction moves on at once.
    Released(i16),
    Continue,
}

/// How to react to the server's answer for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Confirmation {
    /// Move on to the next action.
    Advance,
    /// Accept the server's correction after the retry delay, then move on.
    RetryAfterDelay,
    /// Accept the server's correction right away; nothing is waiting on it.
    AcceptNow,
    Settled,
}

/// Mutable state an action runs against.
pub struct ExecContext<'a> {
    pub mirror: &'a mut InventoryMirror,
    pub translator: &'a dyn InventoryTranslator,
    pub outbox: &'a mut Outbox,
}

impl ExecContext<'_> {
    /// Queue the full window and the cursor for the client.
    pub fn send_resync(&mut self) {
        let content = self.translator.update_inventory(&self.mirror.inventory);
        self.outbox.upstream(UpstreamPacket::InventoryContent(content));
        let cursor = self.translator.translate_to_upstream(&self.mirror.cursor);
        self.outbox
            .upstream(UpstreamPacket::InventorySlot(InventorySlot::cursor(cursor)));
    }
}

impl Action {
    pub fn new(kind: ActionKind, weight: i32) -> Self {
        Self {
            kind,
            weight,
            sequence: NEXT_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    pub fn click(click: Click, slot: usize) -> Self {
        Self::new(
            ActionKind::Click {
                click,
                slot,
                refresh: false,
            },
            0,
        )
    }

    pub fn drop(kind: DropKind, slot: usize) -> Self {
        Self::new(ActionKind::Drop { kind, slot }, 0)
    }

    pub fn refresh() -> Self {
        Self::new(ActionKind::Refresh, REFRESH_WEIGHT)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn key(&self) -> (i32, u64) {
        (self.weight, self.sequence)
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self.kind, ActionKind::Refresh)
    }

    /// Run the action: update the mirror and queue its request.
    pub(crate) fn execute(&self, ctx: &mut ExecContext<'_>) -> Step {
        match self.kind {
            ActionKind::Click {
                click,
                slot,
                refresh,
            } => {
                let window_id = ctx.mirror.inventory.window_id;
                let action_id = ctx.mirror.inventory.next_action_id();
                let clicked_item = if refresh {
                    ItemStack::refresh_sentinel()
                } else {
                    ctx.mirror.get_item(slot).clone()
                };
                click.apply(ctx.mirror, slot, ctx.translator.slot_type(slot));
                debug!(
                    "click {:?} slot={} action_id={} refresh={}",
                    click, slot, action_id, refresh
                );
                ctx.outbox.downstream(DownstreamPacket::WindowClick(WindowClick {
                    window_id,
                    slot: slot as i16,
                    button: click.button(),
                    action_id,
                    mode: click.mode(),
                    clicked_item,
                }));
                Step::AwaitConfirm(action_id)
            }
            ActionKind::Drop { kind, slot } => {
                let window_id = ctx.mirror.inventory.window_id;
                kind.apply(ctx.mirror, slot);
                if kind.is_hand() {
                    debug!("drop {:?} from held slot {}", kind, slot);
                    ctx.outbox.downstream(kind.request(window_id, 0, slot));
                    return Step::Continue;
                }
                let action_id = ctx.mirror.inventory.next_action_id();
                debug!("drop {:?} slot={} action_id={}", kind, slot, action_id);
                ctx.outbox.downstream(kind.request(window_id, action_id, slot));
                Step::Released(action_id)
            }
            ActionKind::Refresh => {
                debug!("resyncing window {}", ctx.mirror.inventory.window_id);
                ctx.send_resync();
                Step::Continue
            }
        }
    }

    /// Reaction to the server accepting or rejecting this action's request.
    pub(crate) fn confirmation(&self, accepted: bool) -> Confirmation {
        match (&self.kind, accepted) {
            (ActionKind::Click { .. }, true) => Confirmation::Advance,
            (ActionKind::Click { .. }, false) => Confirmation::RetryAfterDelay,
            (ActionKind::Drop { .. }, true) => Confirmation::Settled,
            (ActionKind::Drop { .. }, false) => Confirmation::AcceptNow,
            (ActionKind::Refresh, _) => Confirmation::Settled,
        }
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Action {}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
