// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Peer coordinator: snapshot broadcast and inbound merge.
//!
//! Outbound, the coordinator publishes this process's [`PeerSnapshot`] to the
//! shared channel, fire-and-forget. Inbound, a listener task subscribes to
//! the shared and direct channels and merges snapshots one at a time, so the
//! processing of one snapshot always completes before the next begins.
//!
//! Cross-process convergence is eventually consistent, confidence-wins:
//! two peers racing on the same key with equal confidence each keep whatever
//! they observed first. A hostile or malformed snapshot is dropped and
//! logged; it can never crash this process.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::pattern::{PatternTable, PeerSnapshot};
use crate::infrastructure::bus::{direct_channel, BroadcastBus, BROADCAST_CHANNEL};

pub struct PeerCoordinator {
    bus: Arc<dyn BroadcastBus>,
    table: Arc<Mutex<PatternTable>>,
    agent_id: String,
    broadcast_channel: String,
    shutdown_token: CancellationToken,
}

impl PeerCoordinator {
    pub fn new(
        bus: Arc<dyn BroadcastBus>,
        table: Arc<Mutex<PatternTable>>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            table,
            agent_id: agent_id.into(),
            broadcast_channel: BROADCAST_CHANNEL.to_string(),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn with_broadcast_channel(mut self, channel: impl Into<String>) -> Self {
        self.broadcast_channel = channel.into();
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Publish a snapshot to the shared channel.
    /// Fire-and-forget: a failed publish is logged and never aborts the
    /// learning cycle that requested it.
    pub async fn broadcast(&self, snapshot: &PeerSnapshot) {
        let payload = match serde_json::to_string(snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize peer snapshot");
                return;
            }
        };

        if let Err(e) = self.bus.publish(&self.broadcast_channel, payload).await {
            warn!(error = %e, "Failed to publish peer snapshot");
        }
    }

    /// Start the inbound listener task
    pub fn start_listener(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        let mut shared = match self.bus.subscribe(&self.broadcast_channel).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Failed to subscribe to broadcast channel, peer listener disabled");
                return;
            }
        };
        let mut direct = match self.bus.subscribe(&direct_channel(&self.agent_id)).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Failed to subscribe to direct channel, peer listener disabled");
                return;
            }
        };

        info!(agent_id = %self.agent_id, "Peer listener started");

        loop {
            tokio::select! {
                payload = shared.recv() => match payload {
                    Some(payload) => self.handle_payload(&payload).await,
                    None => break,
                },
                payload = direct.recv() => match payload {
                    Some(payload) => self.handle_payload(&payload).await,
                    None => break,
                },
                _ = self.shutdown_token.cancelled() => break,
            }
        }

        info!(agent_id = %self.agent_id, "Peer listener stopped");
    }

    async fn handle_payload(&self, payload: &str) {
        match serde_json::from_str::<PeerSnapshot>(payload) {
            Ok(snapshot) => self.merge(snapshot).await,
            Err(e) => warn!(error = %e, "Dropping malformed peer snapshot"),
        }
    }

    /// Merge one peer snapshot into the local table.
    /// Self-echoes are ignored; every other pattern goes through the
    /// strict confidence-wins adoption rule.
    pub async fn merge(&self, snapshot: PeerSnapshot) {
        if snapshot.agent_id == self.agent_id {
            debug!("Ignoring self-echoed snapshot");
            return;
        }

        let PeerSnapshot { agent_id: peer, patterns, .. } = snapshot;

        let mut table = self.table.lock().await;
        let mut adopted = 0usize;
        for pattern in patterns {
            if table.adopt_if_stronger(&peer, pattern) {
                adopted += 1;
            }
        }

        if adopted > 0 {
            debug!(peer = %peer, adopted, "Adopted peer patterns");
        }
    }
}
