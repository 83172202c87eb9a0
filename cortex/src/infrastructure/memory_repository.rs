// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Persistence of memory entries for one agent identity.
//!
//! Entries live in the external store under the hash `memories:{agent_id}`,
//! keyed by entry id, mirrored by a local read cache. Writes are
//! write-through: the cache is only updated after the external store
//! accepted the record, so a failed persist never leaves phantom entries
//! behind. Reads always hit the external store first because sibling
//! processes may have written since the last refresh.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::memory::MemoryEntry;
use crate::infrastructure::store::KeyValueStore;

pub struct MemoryRepository {
    store: Arc<dyn KeyValueStore>,
    agent_id: String,
    cache: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, agent_id: impl Into<String>) -> Self {
        Self {
            store,
            agent_id: agent_id.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn collection_key(&self) -> String {
        format!("memories:{}", self.agent_id)
    }

    /// Write-through persist: external store first, cache second
    pub async fn persist(&self, entry: &MemoryEntry) -> Result<()> {
        let payload = serde_json::to_string(entry)?;
        self.store
            .hash_set(&self.collection_key(), &entry.id, payload)
            .await?;

        let mut cache = self.cache.write().await;
        cache.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    /// All entries for this agent, freshly loaded from the external store.
    /// Unparsable persisted records are skipped with a warning rather than
    /// failing the whole load. Refreshes the read cache as a side effect.
    pub async fn load_all(&self) -> Result<Vec<MemoryEntry>> {
        let raw = self.store.hash_get_all(&self.collection_key()).await?;

        let mut entries = Vec::with_capacity(raw.len());
        for (id, payload) in raw {
            match serde_json::from_str::<MemoryEntry>(&payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(entry_id = %id, error = %e, "Skipping unparsable memory entry"),
            }
        }

        let mut cache = self.cache.write().await;
        cache.clear();
        for entry in &entries {
            cache.insert(entry.id.clone(), entry.clone());
        }

        Ok(entries)
    }

    /// The `window` most recent entries, newest first
    pub async fn recent(&self, window: usize) -> Result<Vec<MemoryEntry>> {
        let mut entries = self.load_all().await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(window);
        Ok(entries)
    }

    /// Number of persisted entries, straight from the external store
    pub async fn count(&self) -> Result<usize> {
        self.store.hash_len(&self.collection_key()).await
    }

    /// Cached entry lookup without touching the external store
    pub async fn cached(&self, id: &str) -> Option<MemoryEntry> {
        self.cache.read().await.get(id).cloned()
    }
}
