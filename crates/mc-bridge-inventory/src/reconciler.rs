//! Per-session reconciler: the mirror, the planner, the transaction queue
//! and the outbox behind one synchronous API.
//!
//! Every entry point leaves its effects in the outbox; the caller drains
//! them with [`InventoryReconciler::drain_outbound`] and routes them.
//!
//! A batch is planned only once every earlier transaction has finished, so
//! the planner always reads the mirror in the state the client saw before
//! the gesture.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{InventoryActionData, InventorySlot};

use crate::action::ExecContext;
use crate::inventory::{Inventory, InventoryMirror, HOTBAR_SLOTS};
use crate::outbox::{Outbound, Outbox, PendingRetry, UpstreamPacket};
use crate::planner::Planner;
use crate::transaction::{TransactionHandle, TransactionQueue};
use crate::translator::InventoryTranslator;

/// Java window id that addresses the cursor in a set-slot update.
const CURSOR_WINDOW: i8 = -1;
const CURSOR_SLOT: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Wait before accepting the server's correction of a rejected click.
    pub retry_delay: Duration,
    /// How many fire-and-forget drop ids to remember.
    pub drop_ack_window: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(200),
            drop_ack_window: 32,
        }
    }
}

pub struct InventoryReconciler {
    mirror: InventoryMirror,
    translator: Box<dyn InventoryTranslator + Send>,
    queue: TransactionQueue,
    planner: Planner,
    /// Batches that arrived while a transaction was still running.
    waiting: VecDeque<Vec<InventoryActionData>>,
    outbox: Outbox,
}

impl InventoryReconciler {
    pub fn new(
        window_id: u8,
        translator: Box<dyn InventoryTranslator + Send>,
        config: ReconcilerConfig,
    ) -> Self {
        let inventory = Inventory::new(window_id, translator.size());
        Self {
            mirror: InventoryMirror::new(inventory),
            translator,
            queue: TransactionQueue::new(config.retry_delay, config.drop_ack_window),
            planner: Planner::new(),
            waiting: VecDeque::new(),
            outbox: Outbox::new(),
        }
    }

    pub fn mirror(&self) -> &InventoryMirror {
        &self.mirror
    }

    pub fn queue(&self) -> &TransactionQueue {
        &self.queue
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn set_held_slot(&mut self, slot: u8) {
        if usize::from(slot) >= HOTBAR_SLOTS {
            warn!("ignoring held slot {}", slot);
            return;
        }
        self.mirror.held_slot = slot;
    }

    /// Seed the mirror without telling the client, e.g. from a recorded scenario.
    pub fn load(&mut self, items: Vec<ItemStack>, cursor: ItemStack) {
        self.mirror.inventory.set_items(items);
        self.mirror.cursor = cursor;
    }

    fn split(&mut self) -> (&mut TransactionQueue, ExecContext<'_>) {
        (
            &mut self.queue,
            ExecContext {
                mirror: &mut self.mirror,
                translator: self.translator.as_ref(),
                outbox: &mut self.outbox,
            },
        )
    }

    /// Queue a Bedrock inventory batch behind earlier ones.
    ///
    /// Returns the transaction when the batch could be planned right away.
    /// `None` means it was ignored or is waiting for the running transaction.
    pub fn handle_actions(&mut self, actions: &[InventoryActionData]) -> Option<TransactionHandle> {
        self.waiting.push_back(actions.to_vec());
        if !self.queue.is_idle() {
            debug!(
                "batch waits behind transaction {:?} ({} waiting)",
                self.queue.active_id(),
                self.waiting.len()
            );
            return None;
        }
        self.drive()
    }

    /// Run the queue and plan waiting batches whenever it drains. Returns
    /// the last transaction submitted.
    fn drive(&mut self) -> Option<TransactionHandle> {
        let mut submitted = None;
        loop {
            let (queue, mut ctx) = self.split();
            queue.pump(&mut ctx);
            if !self.queue.is_idle() {
                return submitted;
            }
            let Some(batch) = self.waiting.pop_front() else {
                return submitted;
            };
            let Some(plan) = self
                .planner
                .plan(&batch, &self.mirror, self.translator.as_ref())
            else {
                continue;
            };
            let handle = self.queue.submit(plan.into_actions());
            debug!("submitted transaction {}", handle.id());
            submitted = Some(handle);
        }
    }

    /// The server answered a click or drop.
    pub fn confirm(&mut self, window_id: u8, action_id: i16, accepted: bool) {
        let (queue, mut ctx) = self.split();
        queue.confirm(window_id, action_id, accepted, &mut ctx);
        self.drive();
    }

    pub fn retry_elapsed(&mut self, retry: PendingRetry) {
        let (queue, mut ctx) = self.split();
        queue.retry_elapsed(retry, &mut ctx);
        self.drive();
    }

    /// Batches not yet planned.
    pub fn waiting_batches(&self) -> usize {
        self.waiting.len()
    }

    /// Abandon every queued and running transaction and every waiting batch.
    pub fn cancel_all(&mut self) -> usize {
        self.planner.reset();
        let waiting = self.waiting.len();
        self.waiting.clear();
        self.queue.cancel_all() + waiting
    }

    /// Push the mirrored window and cursor to the client.
    pub fn resync(&mut self) {
        let (_, mut ctx) = self.split();
        ctx.send_resync();
    }

    /// Cancel everything, then resync; already-sent requests can't be recalled.
    pub fn hard_resync(&mut self) {
        let cancelled = self.cancel_all();
        info!("hard resync, {} transactions abandoned", cancelled);
        self.resync();
    }

    /// Authoritative window contents from the server.
    pub fn apply_window_items(&mut self, window_id: u8, items: Vec<ItemStack>) {
        if window_id != self.mirror.inventory.window_id {
            debug!("ignoring contents of window {}", window_id);
            return;
        }
        self.mirror.inventory.set_items(items);
        let content = self.translator.update_inventory(&self.mirror.inventory);
        self.outbox.upstream(UpstreamPacket::InventoryContent(content));
    }

    /// Authoritative single slot from the server. Window -1 slot -1 is the cursor.
    pub fn apply_set_slot(&mut self, window_id: i8, slot: i16, item: ItemStack) {
        if window_id == CURSOR_WINDOW && slot == CURSOR_SLOT {
            self.mirror.cursor = item;
            let cursor = self.translator.translate_to_upstream(&self.mirror.cursor);
            self.outbox
                .upstream(UpstreamPacket::InventorySlot(InventorySlot::cursor(cursor)));
            return;
        }
        let in_window = u8::try_from(window_id).ok() == Some(self.mirror.inventory.window_id);
        let index = usize::try_from(slot).ok().filter(|&s| s < self.mirror.inventory.size());
        let Some(index) = index.filter(|_| in_window) else {
            debug!("ignoring slot {} of window {}", slot, window_id);
            return;
        };
        self.mirror.set_item(index, item);
        // Bedrock slot numbering differs per layout; resend the whole window.
        let content = self.translator.update_inventory(&self.mirror.inventory);
        self.outbox.upstream(UpstreamPacket::InventoryContent(content));
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle() && self.waiting.is_empty()
    }

    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        self.outbox.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::DownstreamPacket;
    use crate::planner::CraftFollowUp;
    use crate::translator::Layout;
    use mc_bridge_proto::packets::{container_id, InventorySource};

    fn reconciler() -> InventoryReconciler {
        let mut r = InventoryReconciler::new(0, Layout::Player.translator(), ReconcilerConfig::default());
        let mut items = vec![ItemStack::empty(); 46];
        items[20] = ItemStack::new(5, 32);
        r.load(items, ItemStack::empty());
        r
    }

    fn inv(slot: u32, from: ItemStack, to: ItemStack) -> InventoryActionData {
        InventoryActionData {
            source: InventorySource::Container {
                container_id: container_id::INVENTORY,
            },
            slot,
            from_item: from,
            to_item: to,
        }
    }

    fn pickup_all() -> Vec<InventoryActionData> {
        vec![
            InventoryActionData {
                source: InventorySource::Container {
                    container_id: container_id::CURSOR,
                },
                slot: 0,
                from_item: ItemStack::empty(),
                to_item: ItemStack::new(5, 32),
            },
            InventoryActionData {
                source: InventorySource::Container {
                    container_id: container_id::INVENTORY,
                },
                slot: 20,
                from_item: ItemStack::new(5, 32),
                to_item: ItemStack::empty(),
            },
        ]
    }

    #[test]
    fn pickup_round_trip() {
        let mut r = reconciler();
        let handle = r.handle_actions(&pickup_all());
        assert!(handle.is_some());
        let out = r.drain_outbound();
        assert!(matches!(
            out.as_slice(),
            [Outbound::Downstream(DownstreamPacket::WindowClick(c))] if c.slot == 20 && c.action_id == 1
        ));
        assert_eq!(r.mirror().cursor, ItemStack::new(5, 32));
        assert!(!r.is_idle());

        r.confirm(0, 1, true);
        assert!(r.is_idle());
        assert!(r.drain_outbound().is_empty());
    }

    #[test]
    fn later_batch_is_planned_after_earlier_one_finishes() {
        let mut r = InventoryReconciler::new(0, Layout::Player.translator(), ReconcilerConfig::default());
        let mut items = vec![ItemStack::empty(); 46];
        items[20] = ItemStack::new(10, 20);
        items[21] = ItemStack::new(10, 4);
        items[22] = ItemStack::new(10, 5);
        r.load(items, ItemStack::new(20, 3));

        let partial_move = [
            inv(20, ItemStack::new(10, 20), ItemStack::new(10, 12)),
            inv(21, ItemStack::new(10, 4), ItemStack::new(10, 12)),
        ];
        let full_move = [
            inv(22, ItemStack::new(10, 5), ItemStack::empty()),
            inv(23, ItemStack::empty(), ItemStack::new(10, 5)),
        ];
        assert!(r.handle_actions(&partial_move).is_some());
        // The cursor is parked in a temp slot right now; planning must wait.
        assert!(r.handle_actions(&full_move).is_none());
        assert_eq!(r.waiting_batches(), 1);

        let mut clicks = Vec::new();
        loop {
            for out in r.drain_outbound() {
                if let Outbound::Downstream(DownstreamPacket::WindowClick(c)) = out {
                    clicks.push(c);
                }
            }
            let Some(action_id) = r.queue().awaiting() else {
                break;
            };
            r.confirm(0, action_id, true);
        }

        assert!(r.is_idle());
        assert_eq!(clicks.len(), 16);
        assert!(clicks
            .iter()
            .all(|c| c.clicked_item != ItemStack::refresh_sentinel()));
        let second: Vec<i16> = clicks[12..].iter().map(|c| c.slot).collect();
        assert_eq!(second, vec![9, 22, 23, 9]);

        let mirror = r.mirror();
        assert_eq!(mirror.cursor, ItemStack::new(20, 3));
        assert_eq!(*mirror.get_item(20), ItemStack::new(10, 12));
        assert_eq!(*mirror.get_item(21), ItemStack::new(10, 12));
        assert!(mirror.get_item(22).is_empty());
        assert_eq!(*mirror.get_item(23), ItemStack::new(10, 5));
        assert!(mirror.get_item(9).is_empty());
    }

    #[test]
    fn resync_is_idempotent() {
        let mut r = reconciler();
        r.resync();
        let first = r.drain_outbound();
        let mirror = r.mirror().clone();
        r.resync();
        let second = r.drain_outbound();

        assert_eq!(first, second);
        assert_eq!(r.mirror().inventory.items(), mirror.inventory.items());
        assert_eq!(r.mirror().cursor, mirror.cursor);
    }

    #[test]
    fn hard_resync_cancels_and_pushes_state() {
        let mut r = reconciler();
        r.handle_actions(&pickup_all());
        r.handle_actions(&pickup_all());
        r.drain_outbound();

        assert_eq!(r.waiting_batches(), 1);

        r.hard_resync();
        assert!(r.is_idle());
        assert_eq!(r.waiting_batches(), 0);
        assert_eq!(r.queue().generation(), 1);
        assert_eq!(r.planner().craft_follow_up(), CraftFollowUp::None);
        let out = r.drain_outbound();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| matches!(o, Outbound::Upstream(_))));
    }

    #[test]
    fn server_set_slot_updates_cursor_and_slots() {
        let mut r = reconciler();
        r.apply_set_slot(-1, -1, ItemStack::new(9, 1));
        assert_eq!(r.mirror().cursor, ItemStack::new(9, 1));

        r.apply_set_slot(0, 21, ItemStack::new(9, 2));
        assert_eq!(*r.mirror().get_item(21), ItemStack::new(9, 2));

        // Other windows and out-of-range slots are not ours.
        r.apply_set_slot(4, 21, ItemStack::empty());
        r.apply_set_slot(0, 99, ItemStack::empty());
        assert_eq!(*r.mirror().get_item(21), ItemStack::new(9, 2));
        assert_eq!(r.drain_outbound().len(), 2);
    }

    #[test]
    fn server_window_items_replace_the_mirror() {
        let mut r = reconciler();
        r.apply_window_items(0, vec![ItemStack::new(1, 1); 10]);
        assert_eq!(r.mirror().inventory.size(), 46);
        assert!(r.mirror().get_item(20).is_empty());
        assert_eq!(*r.mirror().get_item(9), ItemStack::new(1, 1));
        assert!(matches!(
            r.drain_outbound().as_slice(),
            [Outbound::Upstream(UpstreamPacket::InventoryContent(c))] if c.items.len() == 46
        ));

        r.apply_window_items(2, Vec::new());
        assert!(r.drain_outbound().is_empty());
    }

    #[test]
    fn held_slot_is_bounded() {
        let mut r = reconciler();
        r.set_held_slot(4);
        r.set_held_slot(9);
        assert_eq!(r.mirror().held_slot, 4);
    }
}
