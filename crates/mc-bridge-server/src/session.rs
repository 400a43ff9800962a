//! Per-session inventory event loop.
//!
//! All inventory work for one player runs on a single task: upstream
//! batches, server answers, server window updates and retry timers are
//! funnelled through one channel and handled in order, so no two actions
//! ever touch the mirror at the same time.

use bytes::Buf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use mc_bridge_inventory::{
    DownstreamPacket, InventoryReconciler, Outbound, PendingRetry, UpstreamPacket,
};
use mc_bridge_proto::codec::ProtoDecode;
use mc_bridge_proto::error::ProtoError;
use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::{InventoryActionData, InventoryActions};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to decode inventory actions: {0}")]
    Decode(#[from] ProtoError),

    #[error("session channel closed")]
    ChannelClosed,
}

#[derive(Debug)]
pub enum SessionEvent {
    /// A decoded Bedrock inventory action batch.
    UpstreamActions(Vec<InventoryActionData>),
    /// The player selected another hotbar slot.
    HeldSlot(u8),
    /// The server's answer to one of our window requests.
    Confirm {
        window_id: u8,
        action_id: i16,
        accepted: bool,
    },
    WindowItems {
        window_id: u8,
        items: Vec<ItemStack>,
    },
    SetSlot {
        window_id: i8,
        slot: i16,
        item: ItemStack,
    },
    RetryElapsed(PendingRetry),
    HardResync,
    /// Resolved once no transaction is queued or running.
    WhenIdle(oneshot::Sender<()>),
    Disconnect,
}

/// Cloneable entry point into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub async fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Decode a Bedrock inventory action list and hand it to the session.
    pub async fn upstream_packet(&self, mut buf: impl Buf) -> Result<(), SessionError> {
        let actions = InventoryActions::proto_decode(&mut buf)?;
        self.send(SessionEvent::UpstreamActions(actions.actions)).await
    }

    pub async fn confirm(
        &self,
        window_id: u8,
        action_id: i16,
        accepted: bool,
    ) -> Result<(), SessionError> {
        self.send(SessionEvent::Confirm {
            window_id,
            action_id,
            accepted,
        })
        .await
    }

    /// Wait until every submitted transaction has finished.
    pub async fn idle(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionEvent::WhenIdle(tx)).await?;
        rx.await.map_err(|_| SessionError::ChannelClosed)
    }
}

/// Receiving ends of the session's two output directions.
#[derive(Debug)]
pub struct SessionOutputs {
    pub downstream: mpsc::UnboundedReceiver<DownstreamPacket>,
    pub upstream: mpsc::UnboundedReceiver<UpstreamPacket>,
}

pub struct InventorySession {
    reconciler: InventoryReconciler,
    events: mpsc::Receiver<SessionEvent>,
    /// Weak so that pending timers don't keep the session alive.
    retry_tx: mpsc::WeakSender<SessionEvent>,
    downstream: mpsc::UnboundedSender<DownstreamPacket>,
    upstream: mpsc::UnboundedSender<UpstreamPacket>,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl InventorySession {
    pub fn new(
        reconciler: InventoryReconciler,
        event_buffer: usize,
    ) -> (Self, SessionHandle, SessionOutputs) {
        let (events_tx, events_rx) = mpsc::channel(event_buffer);
        let (downstream_tx, downstream_rx) = mpsc::unbounded_channel();
        let (upstream_tx, upstream_rx) = mpsc::unbounded_channel();
        let session = Self {
            reconciler,
            events: events_rx,
            retry_tx: events_tx.downgrade(),
            downstream: downstream_tx,
            upstream: upstream_tx,
            idle_waiters: Vec::new(),
        };
        let handle = SessionHandle { events: events_tx };
        let outputs = SessionOutputs {
            downstream: downstream_rx,
            upstream: upstream_rx,
        };
        (session, handle, outputs)
    }

    /// Run until disconnect, shutdown, or every handle is dropped. Returns
    /// the reconciler so its final state can be inspected.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<InventoryReconciler, SessionError> {
        info!(
            "inventory session started for window {}",
            self.reconciler.mirror().inventory.window_id
        );
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        debug!("all session handles dropped");
                        break;
                    };
                    if !self.handle(event)? {
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let cancelled = self.reconciler.cancel_all();
                        if cancelled > 0 {
                            warn!("shutting down with {} transactions pending", cancelled);
                        }
                        info!("inventory session shutting down");
                        break;
                    }
                }
            }
        }
        Ok(self.reconciler)
    }

    /// Handle one event. Returns `false` when the session should end.
    fn handle(&mut self, event: SessionEvent) -> Result<bool, SessionError> {
        match event {
            SessionEvent::UpstreamActions(actions) => {
                debug!("upstream batch of {} actions", actions.len());
                self.reconciler.handle_actions(&actions);
            }
            SessionEvent::HeldSlot(slot) => self.reconciler.set_held_slot(slot),
            SessionEvent::Confirm {
                window_id,
                action_id,
                accepted,
            } => self.reconciler.confirm(window_id, action_id, accepted),
            SessionEvent::WindowItems { window_id, items } => {
                self.reconciler.apply_window_items(window_id, items)
            }
            SessionEvent::SetSlot {
                window_id,
                slot,
                item,
            } => self.reconciler.apply_set_slot(window_id, slot, item),
            SessionEvent::RetryElapsed(retry) => self.reconciler.retry_elapsed(retry),
            SessionEvent::HardResync => self.reconciler.hard_resync(),
            SessionEvent::WhenIdle(waiter) => self.idle_waiters.push(waiter),
            SessionEvent::Disconnect => {
                let cancelled = self.reconciler.cancel_all();
                info!("player disconnected, {} transactions dropped", cancelled);
                self.flush()?;
                return Ok(false);
            }
        }
        self.flush()?;
        if self.reconciler.is_idle() {
            for waiter in self.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
        Ok(true)
    }

    /// Route everything the reconciler produced.
    fn flush(&mut self) -> Result<(), SessionError> {
        for outbound in self.reconciler.drain_outbound() {
            match outbound {
                Outbound::Downstream(packet) => self
                    .downstream
                    .send(packet)
                    .map_err(|_| SessionError::ChannelClosed)?,
                Outbound::Upstream(packet) => self
                    .upstream
                    .send(packet)
                    .map_err(|_| SessionError::ChannelClosed)?,
                Outbound::ScheduleRetry(retry) => self.schedule_retry(retry),
            }
        }
        Ok(())
    }

    fn schedule_retry(&self, retry: PendingRetry) {
        let tx = self.retry_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(retry.delay).await;
            match tx.upgrade() {
                Some(tx) => {
                    if tx.send(SessionEvent::RetryElapsed(retry)).await.is_err() {
                        debug!("session gone before retry of action {}", retry.action_id);
                    }
                }
                None => debug!("session gone before retry of action {}", retry.action_id),
            }
        });
    }
}
