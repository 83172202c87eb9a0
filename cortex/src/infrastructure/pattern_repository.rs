// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Persistence of the pattern table.
//!
//! The full table is serialized into the hash `learning:patterns:{agent_id}`,
//! one JSON record per pattern key. `load` runs once at startup to rebuild
//! the in-process table; `persist` runs once per learning cycle and once at
//! shutdown, not on every reinforcement, to bound write volume.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::domain::pattern::{LearningPattern, PatternTable};
use crate::infrastructure::store::KeyValueStore;

pub struct PatternRepository {
    store: Arc<dyn KeyValueStore>,
    agent_id: String,
}

impl PatternRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, agent_id: impl Into<String>) -> Self {
        Self {
            store,
            agent_id: agent_id.into(),
        }
    }

    fn collection_key(&self) -> String {
        format!("learning:patterns:{}", self.agent_id)
    }

    /// Write every pattern in the table to the external store
    pub async fn persist(&self, table: &PatternTable) -> Result<()> {
        let key = self.collection_key();
        for pattern in table.iter() {
            let payload = serde_json::to_string(pattern)?;
            self.store.hash_set(&key, &pattern.key, payload).await?;
        }
        Ok(())
    }

    /// Rebuild a table from the external store.
    /// Corrupt persisted records are skipped with a warning.
    pub async fn load(&self) -> Result<PatternTable> {
        let raw = self.store.hash_get_all(&self.collection_key()).await?;

        let mut patterns = Vec::with_capacity(raw.len());
        for (key, payload) in raw {
            match serde_json::from_str::<LearningPattern>(&payload) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => warn!(pattern_key = %key, error = %e, "Skipping unparsable pattern record"),
            }
        }

        Ok(PatternTable::from_patterns(patterns))
    }
}
