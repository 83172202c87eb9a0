// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pub/sub collaborator contract.
//!
//! Peer snapshots travel as JSON payloads over named channels: one shared
//! broadcast channel plus one direct channel per agent. Delivery is
//! best-effort; a subscriber that never sees a payload simply never adopts
//! the patterns it carried.

use anyhow::Result;
use async_trait::async_trait;

/// Name of the channel every agent broadcasts snapshots on
pub const BROADCAST_CHANNEL: &str = "coordination:broadcast";

/// Direct channel name for one agent
pub fn direct_channel(agent_id: &str) -> String {
    format!("coordination:{agent_id}")
}

/// A live subscription to one channel.
/// `recv` resolves to `None` once the channel is closed.
#[async_trait]
pub trait BusSubscription: Send {
    async fn recv(&mut self) -> Option<String>;
}

/// Broadcast bus carrying serialized snapshot payloads
#[async_trait]
pub trait BroadcastBus: Send + Sync {
    /// Publish a payload to every current subscriber of `channel`
    async fn publish(&self, channel: &str, payload: String) -> Result<()>;

    /// Subscribe to `channel`; only payloads published after this call are seen
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscription>>;
}
