//! Effects produced while reconciling, drained by the session loop.
//!
//! The core never does I/O itself: it queues packets for either side and
//! asks the session to schedule retry timers.

use std::time::Duration;

use bytes::BytesMut;
use serde::Serialize;

use mc_bridge_proto::codec::ProtoEncode;
use mc_bridge_proto::packets::{
    bedrock_id, java_id, ConfirmTransaction, InventoryContent, InventorySlot, PlayerDigging,
    WindowClick,
};

/// A request for the Java server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "packet", rename_all = "snake_case")]
pub enum DownstreamPacket {
    WindowClick(WindowClick),
    ConfirmTransaction(ConfirmTransaction),
    PlayerDigging(PlayerDigging),
}

impl DownstreamPacket {
    pub fn packet_id(&self) -> i32 {
        match self {
            Self::WindowClick(_) => java_id::CLICK_WINDOW,
            Self::ConfirmTransaction(_) => java_id::WINDOW_CONFIRMATION,
            Self::PlayerDigging(_) => java_id::PLAYER_DIGGING,
        }
    }

    /// Packet body, without id or length framing.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        match self {
            Self::WindowClick(p) => p.proto_encode(&mut buf),
            Self::ConfirmTransaction(p) => p.proto_encode(&mut buf),
            Self::PlayerDigging(p) => p.proto_encode(&mut buf),
        }
        buf
    }
}

/// A state push to the Bedrock client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "packet", rename_all = "snake_case")]
pub enum UpstreamPacket {
    InventoryContent(InventoryContent),
    InventorySlot(InventorySlot),
}

impl UpstreamPacket {
    pub fn packet_id(&self) -> u32 {
        match self {
            Self::InventoryContent(_) => bedrock_id::INVENTORY_CONTENT,
            Self::InventorySlot(_) => bedrock_id::INVENTORY_SLOT,
        }
    }

    /// Packet body, without the batch header.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        match self {
            Self::InventoryContent(p) => p.proto_encode(&mut buf),
            Self::InventorySlot(p) => p.proto_encode(&mut buf),
        }
        buf
    }
}

/// Timer request for a rejected click. The retry carries everything needed
/// to check on re-entry that it still refers to the same in-flight click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRetry {
    /// Queue generation at scheduling time; bumped by every cancel.
    pub generation: u64,
    pub transaction: u64,
    pub action_id: i16,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Downstream(DownstreamPacket),
    Upstream(UpstreamPacket),
    ScheduleRetry(PendingRetry),
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downstream(&mut self, packet: DownstreamPacket) {
        self.queue.push(Outbound::Downstream(packet));
    }

    pub fn upstream(&mut self, packet: UpstreamPacket) {
        self.queue.push(Outbound::Upstream(packet));
    }

    pub fn schedule_retry(&mut self, retry: PendingRetry) {
        self.queue.push(Outbound::ScheduleRetry(retry));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Take everything queued so far, in emission order.
    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.queue)
    }

    /// Downstream packets queued so far, without draining.
    pub fn downstream_packets(&self) -> impl Iterator<Item = &DownstreamPacket> {
        self.queue.iter().filter_map(|o| match o {
            Outbound::Downstream(p) => Some(p),
            _ => None,
        })
    }
}
