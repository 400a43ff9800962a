//! Drive a session from a recorded scenario against a scripted server.
//!
//! The scripted server acknowledges every click it receives, rejecting the
//! action numbers listed in the scenario, and never sends window updates of
//! its own. What is left in the mirror afterwards is what the bridge
//! believes the server holds.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use mc_bridge_inventory::{DownstreamPacket, InventoryReconciler, Layout, UpstreamPacket};
use mc_bridge_proto::item_stack::ItemStack;
use mc_bridge_proto::packets::InventoryActionData;

use crate::config::BridgeConfig;
use crate::session::{InventorySession, SessionError, SessionEvent, SessionHandle};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("replay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Deserialize)]
pub struct SlotEntry {
    pub slot: usize,
    pub item: ItemStack,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub layout: Layout,
    #[serde(default)]
    pub window_id: u8,
    #[serde(default)]
    pub held_slot: u8,
    #[serde(default)]
    pub slots: Vec<SlotEntry>,
    #[serde(default)]
    pub cursor: ItemStack,
    /// Bedrock inventory action batches, sent in order.
    pub batches: Vec<Vec<InventoryActionData>>,
    /// Action numbers the scripted server rejects.
    #[serde(default)]
    pub reject: Vec<i16>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn reconciler(&self, config: &BridgeConfig) -> InventoryReconciler {
        let mut reconciler = InventoryReconciler::new(
            self.window_id,
            self.layout.translator(),
            config.inventory.reconciler_config(),
        );
        reconciler.set_held_slot(self.held_slot);
        let mut items = vec![ItemStack::empty(); reconciler.mirror().inventory.size()];
        for entry in &self.slots {
            match items.get_mut(entry.slot) {
                Some(slot) => *slot = entry.item.clone(),
                None => warn!("scenario slot {} is outside the window", entry.slot),
            }
        }
        reconciler.load(items, self.cursor.clone());
        reconciler
    }
}

/// Final state of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub window_id: u8,
    pub held_slot: u8,
    pub cursor: ItemStack,
    pub slots: Vec<ItemStack>,
    pub downstream_packets: usize,
    pub upstream_packets: usize,
}

/// Replay `scenario` through a real session and report the final mirror.
pub async fn run(
    scenario: Scenario,
    config: &BridgeConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<ReplayReport, ReplayError> {
    let reconciler = scenario.reconciler(config);
    let (session, handle, outputs) = InventorySession::new(reconciler, config.session.event_buffer);
    let session = tokio::spawn(session.run(shutdown));

    let reject: HashSet<i16> = scenario.reject.iter().copied().collect();
    let server = tokio::spawn(scripted_server(outputs.downstream, handle.clone(), reject));
    let client = tokio::spawn(log_upstream(outputs.upstream));

    for (i, batch) in scenario.batches.into_iter().enumerate() {
        info!("replaying batch {} ({} actions)", i, batch.len());
        handle.send(SessionEvent::UpstreamActions(batch)).await?;
    }
    handle.idle().await?;
    handle.send(SessionEvent::Disconnect).await?;

    let reconciler = session.await??;
    let downstream_packets = server.await?;
    let upstream_packets = client.await?;

    let mirror = reconciler.mirror();
    Ok(ReplayReport {
        window_id: mirror.inventory.window_id,
        held_slot: mirror.held_slot,
        cursor: mirror.cursor.clone(),
        slots: mirror.inventory.items().to_vec(),
        downstream_packets,
        upstream_packets,
    })
}

/// Answer every click, rejecting the listed action numbers.
async fn scripted_server(
    mut packets: mpsc::UnboundedReceiver<DownstreamPacket>,
    handle: SessionHandle,
    reject: HashSet<i16>,
) -> usize {
    let mut seen = 0;
    while let Some(packet) = packets.recv().await {
        seen += 1;
        log_packet("downstream", packet.packet_id() as u32, packet.encode().len(), &packet);
        let DownstreamPacket::WindowClick(click) = &packet else {
            continue;
        };
        let accepted = !reject.contains(&click.action_id);
        if handle
            .confirm(click.window_id, click.action_id, accepted)
            .await
            .is_err()
        {
            break;
        }
    }
    seen
}

async fn log_upstream(mut packets: mpsc::UnboundedReceiver<UpstreamPacket>) -> usize {
    let mut seen = 0;
    while let Some(packet) = packets.recv().await {
        seen += 1;
        log_packet("upstream", packet.packet_id(), packet.encode().len(), &packet);
    }
    seen
}

fn log_packet(direction: &str, id: u32, len: usize, packet: &impl Serialize) {
    match serde_json::to_string(packet) {
        Ok(json) => info!("{} 0x{:02X} ({} bytes) {}", direction, id, len, json),
        Err(e) => warn!("{} packet not serializable: {}", direction, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "layout": { "kind": "player" },
        "slots": [
            { "slot": 20, "item": { "runtime_id": 10, "count": 20 } },
            { "slot": 21, "item": { "runtime_id": 10, "count": 4 } }
        ],
        "cursor": { "runtime_id": 20, "count": 3 },
        "batches": [[
            {
                "source": { "type": "container", "container_id": 0 },
                "slot": 20,
                "from_item": { "runtime_id": 10, "count": 20 },
                "to_item": { "runtime_id": 10, "count": 12 }
            },
            {
                "source": { "type": "container", "container_id": 0 },
                "slot": 21,
                "from_item": { "runtime_id": 10, "count": 4 },
                "to_item": { "runtime_id": 10, "count": 12 }
            }
        ]],
        "reject": [2]
    }"#;

    #[test]
    fn scenario_parses() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.layout, Layout::Player);
        assert_eq!(scenario.slots.len(), 2);
        assert_eq!(scenario.batches[0].len(), 2);
        assert_eq!(scenario.reject, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_move_replays_to_expected_mirror() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let report = run(scenario, &BridgeConfig::default(), shutdown_rx)
            .await
            .unwrap();

        assert_eq!(report.slots[20], ItemStack::new(10, 12));
        assert_eq!(report.slots[21], ItemStack::new(10, 12));
        assert_eq!(report.cursor, ItemStack::new(20, 3));
        assert!(report.slots[9].is_empty());
        // 12 clicks plus the acceptance of the rejected one.
        assert_eq!(report.downstream_packets, 13);
        // One resync after the rejection.
        assert_eq!(report.upstream_packets, 2);
    }
}
