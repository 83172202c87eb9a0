// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process store and bus backends.
//!
//! Used by tests and single-process deployments where all agents share one
//! runtime. The bus bridges each channel onto a tokio broadcast sender, so
//! publish/subscribe semantics match the external collaborator: subscribers
//! only see payloads published after they subscribed, and a slow subscriber
//! that lags simply loses the oldest payloads.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;

use crate::infrastructure::bus::{BroadcastBus, BusSubscription};
use crate::infrastructure::store::KeyValueStore;

/// Hash-shaped store over a guarded nested map
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut hashes = self.hashes.write().await;
        hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(key).and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hash_len(&self, key: &str) -> Result<usize> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(key).map(|hash| hash.len()).unwrap_or(0))
    }
}

const CHANNEL_CAPACITY: usize = 256;

/// One broadcast sender per channel, created lazily
#[derive(Default)]
pub struct InMemoryBroadcastBus {
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl InMemoryBroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.write().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl BroadcastBus for InMemoryBroadcastBus {
    async fn publish(&self, channel: &str, payload: String) -> Result<()> {
        let sender = self.sender(channel).await;
        // send() only fails when there are no subscribers, which is fine
        let _ = sender.send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscription>> {
        let sender = self.sender(channel).await;
        Ok(Box::new(BroadcastSubscription {
            channel: channel.to_string(),
            receiver: sender.subscribe(),
        }))
    }
}

struct BroadcastSubscription {
    channel: String,
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl BusSubscription for BroadcastSubscription {
    async fn recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "Bus subscription lagged, payloads dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
