//! Transactions and the per-session transaction queue.
//!
//! A transaction runs one plan. Its actions pop in `(weight, sequence)`
//! order and at most one of them is in flight at a time. The queue runs
//! one transaction at a time in submission order; a later batch never
//! starts before every action of an earlier one has been confirmed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

use tracing::{debug, warn};

use mc_bridge_proto::packets::ConfirmTransaction;

use crate::action::{Action, Confirmation, ExecContext, Step};
use crate::outbox::{DownstreamPacket, PendingRetry};

/// A click waiting for the server's answer.
#[derive(Debug)]
struct InFlight {
    action: Action,
    action_id: i16,
    /// Rejected; the retry timer is running.
    retrying: bool,
}

#[derive(Debug)]
pub struct Transaction {
    id: u64,
    actions: BinaryHeap<Reverse<Action>>,
    in_flight: Option<InFlight>,
}

impl Transaction {
    pub fn new(id: u64, actions: Vec<Action>) -> Self {
        Self {
            id,
            actions: actions.into_iter().map(Reverse).collect(),
            in_flight: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Actions not yet executed.
    pub fn remaining(&self) -> usize {
        self.actions.len()
    }

    /// Empty queue and nothing in flight.
    pub fn is_complete(&self) -> bool {
        self.actions.is_empty() && self.in_flight.is_none()
    }

    /// Action number the transaction is blocked on, if any.
    pub fn awaiting(&self) -> Option<i16> {
        self.in_flight.as_ref().map(|f| f.action_id)
    }

    fn start(&mut self, ctx: &mut ExecContext<'_>, released: &mut ReleasedDrops) {
        debug!("transaction {} starting with {} actions", self.id, self.remaining());
        self.run(ctx, released);
    }

    /// The in-flight action is settled; move on.
    fn advance(&mut self, ctx: &mut ExecContext<'_>, released: &mut ReleasedDrops) {
        self.in_flight = None;
        self.run(ctx, released);
    }

    /// Execute actions until one has to wait for the server or none are left.
    fn run(&mut self, ctx: &mut ExecContext<'_>, released: &mut ReleasedDrops) {
        while self.in_flight.is_none() {
            let Some(Reverse(action)) = self.actions.pop() else {
                return;
            };
            match action.execute(ctx) {
                Step::AwaitConfirm(action_id) => {
                    self.in_flight = Some(InFlight {
                        action,
                        action_id,
                        retrying: false,
                    });
                }
                Step::Released(action_id) => released.push(action_id, action),
                Step::Continue => {}
            }
        }
    }
}

/// Bounded memory of drops that were sent without waiting for their answer.
#[derive(Debug)]
struct ReleasedDrops {
    entries: VecDeque<(i16, Action)>,
    capacity: usize,
}

impl ReleasedDrops {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, action_id: i16, action: Action) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((action_id, action));
    }

    fn take(&mut self, action_id: i16) -> Option<Action> {
        let pos = self.entries.iter().position(|(id, _)| *id == action_id)?;
        self.entries.remove(pos).map(|(_, action)| action)
    }
}

/// Identifies a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    id: u64,
}

impl TransactionHandle {
    pub fn id(self) -> u64 {
        self.id
    }
}

/// FIFO of transactions for one session.
#[derive(Debug)]
pub struct TransactionQueue {
    pending: VecDeque<Transaction>,
    active: Option<Transaction>,
    /// Bumped by every cancel so timers scheduled before it are recognised as stale.
    generation: u64,
    next_id: u64,
    released: ReleasedDrops,
    retry_delay: Duration,
}

impl TransactionQueue {
    pub fn new(retry_delay: Duration, drop_ack_window: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            active: None,
            generation: 0,
            next_id: 1,
            released: ReleasedDrops::new(drop_ack_window),
            retry_delay,
        }
    }

    /// Queue a plan's actions as a new transaction. Nothing runs until [`pump`](Self::pump).
    pub fn submit(&mut self, actions: Vec<Action>) -> TransactionHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push_back(Transaction::new(id, actions));
        TransactionHandle { id }
    }

    /// Start queued transactions until one is blocked on a confirmation or
    /// the queue is empty.
    pub fn pump(&mut self, ctx: &mut ExecContext<'_>) {
        loop {
            if let Some(tx) = &self.active {
                if !tx.is_complete() {
                    return;
                }
                debug!("transaction {} complete", tx.id);
            }
            self.active = None;
            let Some(mut tx) = self.pending.pop_front() else {
                return;
            };
            tx.start(ctx, &mut self.released);
            self.active = Some(tx);
        }
    }

    /// Handle the server's answer to action `action_id` in `window_id`.
    pub fn confirm(
        &mut self,
        window_id: u8,
        action_id: i16,
        accepted: bool,
        ctx: &mut ExecContext<'_>,
    ) {
        if window_id != ctx.mirror.inventory.window_id {
            warn!(
                "ignoring confirmation {} for window {} while window {} is open",
                action_id, window_id, ctx.mirror.inventory.window_id
            );
            return;
        }

        if let Some(tx) = self.active.as_mut() {
            if let Some(in_flight) = tx.in_flight.as_mut() {
                if in_flight.action_id == action_id {
                    if in_flight.retrying {
                        warn!("duplicate answer for action {} while retrying", action_id);
                        return;
                    }
                    match in_flight.action.confirmation(accepted) {
                        Confirmation::Advance => {
                            debug!("action {} accepted", action_id);
                            tx.advance(ctx, &mut self.released);
                            self.pump(ctx);
                        }
                        Confirmation::RetryAfterDelay => {
                            warn!(
                                "action {} rejected, accepting correction in {:?}",
                                action_id, self.retry_delay
                            );
                            in_flight.retrying = true;
                            ctx.outbox.schedule_retry(PendingRetry {
                                generation: self.generation,
                                transaction: tx.id,
                                action_id,
                                delay: self.retry_delay,
                            });
                        }
                        Confirmation::AcceptNow => {
                            accept_correction(ctx, action_id);
                            tx.advance(ctx, &mut self.released);
                            self.pump(ctx);
                        }
                        Confirmation::Settled => {
                            tx.advance(ctx, &mut self.released);
                            self.pump(ctx);
                        }
                    }
                    return;
                }
            }
        }

        if let Some(action) = self.released.take(action_id) {
            match action.confirmation(accepted) {
                Confirmation::AcceptNow | Confirmation::RetryAfterDelay => {
                    warn!("drop {} rejected, resyncing", action_id);
                    accept_correction(ctx, action_id);
                }
                Confirmation::Advance | Confirmation::Settled => {
                    debug!("drop {} accepted", action_id);
                }
            }
            return;
        }

        warn!(
            "confirmation for action {} does not match any pending request (awaiting {:?})",
            action_id,
            self.awaiting()
        );
    }

    /// Timer for a rejected click fired. Stale timers are dropped.
    pub fn retry_elapsed(&mut self, retry: PendingRetry, ctx: &mut ExecContext<'_>) {
        if retry.generation != self.generation {
            debug!("dropping retry for action {} from a cancelled queue", retry.action_id);
            return;
        }
        let Some(tx) = self.active.as_mut() else {
            debug!("dropping retry for action {}, queue idle", retry.action_id);
            return;
        };
        let live = tx.id == retry.transaction
            && tx
                .in_flight
                .as_ref()
                .is_some_and(|f| f.retrying && f.action_id == retry.action_id);
        if !live {
            debug!("dropping stale retry for action {}", retry.action_id);
            return;
        }

        accept_correction(ctx, retry.action_id);
        tx.advance(ctx, &mut self.released);
        self.pump(ctx);
    }

    /// Drop every queued and active transaction. Requests already sent are
    /// not retracted, so the caller has to follow up with a resync.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len() + usize::from(self.active.is_some());
        self.pending.clear();
        self.active = None;
        self.generation += 1;
        if dropped > 0 {
            debug!("cancelled {} transactions", dropped);
        }
        dropped
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }

    /// Whether a transaction is still queued or running.
    pub fn is_live(&self, handle: TransactionHandle) -> bool {
        self.active.as_ref().is_some_and(|tx| tx.id == handle.id)
            || self.pending.iter().any(|tx| tx.id == handle.id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_id(&self) -> Option<u64> {
        self.active.as_ref().map(|tx| tx.id)
    }

    /// Action number the active transaction is blocked on.
    pub fn awaiting(&self) -> Option<i16> {
        self.active.as_ref().and_then(Transaction::awaiting)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Tell the server we accept its correction, then push our mirror to the client.
fn accept_correction(ctx: &mut ExecContext<'_>, action_id: i16) {
    ctx.outbox
        .downstream(DownstreamPacket::ConfirmTransaction(ConfirmTransaction {
            window_id: ctx.mirror.inventory.window_id,
            action_id,
            accepted: true,
        }));
    ctx.send_resync();
}
