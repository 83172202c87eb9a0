// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # MemoryService — caller-facing memory & learning facade
//!
//! One instance per agent process. Construction ([`MemoryService::connect`])
//! wires the injected store and bus handles into the repositories, the
//! pattern table, the peer listener and the learning cycle, then starts both
//! background tasks; [`shutdown`](MemoryService::shutdown) tears everything
//! down and is guaranteed to flush the pattern table before returning.
//!
//! ## Error surface
//!
//! Only `store` and `retrieve` can fail, and only with
//! [`MemoryError::StoreUnavailable`]: a caller must know when its write did
//! not land. Background learning and peer merging log their failures and
//! carry on; [`learning_insights`](MemoryService::learning_insights) always
//! returns a value.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::learning_cycle::{LearningCycle, LearningCycleConfig};
use crate::application::peer_coordinator::PeerCoordinator;
use crate::domain::extraction::PatternExtractor;
use crate::domain::memory::{MemoryEntry, MemoryKind};
use crate::domain::pattern::{LearningInsights, PatternTable};
use crate::domain::scoring;
use crate::infrastructure::bus::BroadcastBus;
use crate::infrastructure::memory_repository::MemoryRepository;
use crate::infrastructure::pattern_repository::PatternRepository;
use crate::infrastructure::store::KeyValueStore;

/// Errors surfaced to direct callers of the memory service
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl MemoryError {
    fn store_unavailable(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(err)
    }
}

/// Configuration for one agent's memory service
#[derive(Debug, Clone)]
pub struct MemoryServiceConfig {
    pub agent_id: String,
    pub cycle: LearningCycleConfig,
    /// How many top patterns `learning_insights` reports
    pub insight_top_k: usize,
}

impl MemoryServiceConfig {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            cycle: LearningCycleConfig::default(),
            insight_top_k: 5,
        }
    }

    pub fn with_cycle(mut self, cycle: LearningCycleConfig) -> Self {
        self.cycle = cycle;
        self
    }
}

pub struct MemoryService {
    agent_id: String,
    memories: Arc<MemoryRepository>,
    patterns: Arc<PatternRepository>,
    table: Arc<Mutex<PatternTable>>,
    extractor: PatternExtractor,
    cycle: Arc<LearningCycle>,
    coordinator: Arc<PeerCoordinator>,
    background_tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    insight_top_k: usize,
}

impl MemoryService {
    /// Connect the subsystem: rebuild the pattern table from the store, then
    /// start the peer listener and the learning cycle.
    ///
    /// Fails with [`MemoryError::StoreUnavailable`] when the initial table
    /// load cannot reach the store.
    pub async fn connect(
        config: MemoryServiceConfig,
        store: Arc<dyn KeyValueStore>,
        bus: Arc<dyn BroadcastBus>,
    ) -> Result<Self, MemoryError> {
        let memories = Arc::new(MemoryRepository::new(store.clone(), &config.agent_id));
        let patterns = Arc::new(PatternRepository::new(store, &config.agent_id));

        let loaded = patterns.load().await.map_err(MemoryError::store_unavailable)?;
        info!(
            agent_id = %config.agent_id,
            patterns = loaded.len(),
            "Rebuilt pattern table from store"
        );
        let table = Arc::new(Mutex::new(loaded));

        let coordinator = Arc::new(PeerCoordinator::new(bus, table.clone(), &config.agent_id));
        let extractor = PatternExtractor::default();
        let cycle = Arc::new(LearningCycle::new(
            memories.clone(),
            patterns.clone(),
            table.clone(),
            extractor.clone(),
            coordinator.clone(),
            &config.agent_id,
            config.cycle.clone(),
        ));

        let listener_handle = coordinator.clone().start_listener();
        let cycle_handle = cycle.clone().start();

        info!(agent_id = %config.agent_id, "Memory service connected");

        Ok(Self {
            agent_id: config.agent_id,
            memories,
            patterns,
            table,
            extractor,
            cycle,
            coordinator,
            background_tasks: Mutex::new(vec![listener_handle, cycle_handle]),
            insight_top_k: config.insight_top_k,
        })
    }

    /// Persist one new memory entry and return its id.
    ///
    /// Importance is computed once here; the entry is then written through to
    /// the store and mined for patterns as a synchronous side effect. A store
    /// failure propagates and leaves no local trace of the entry.
    pub async fn store(
        &self,
        kind: MemoryKind,
        content: impl Into<String>,
        related_ids: Vec<String>,
    ) -> Result<String, MemoryError> {
        let content = content.into();
        let now = Utc::now();

        let importance = scoring::calculate_importance(kind, &content, related_ids.len());
        let id = format!(
            "{}_{}_{}",
            self.agent_id,
            now.timestamp_millis(),
            Uuid::new_v4().simple()
        );

        let entry = MemoryEntry {
            id: id.clone(),
            agent_id: self.agent_id.clone(),
            kind,
            content,
            created_at: now,
            importance,
            related_ids,
        };

        self.memories
            .persist(&entry)
            .await
            .map_err(MemoryError::store_unavailable)?;

        let keys = self.extractor.extract(&entry.content);
        if !keys.is_empty() {
            let mut table = self.table.lock().await;
            for key in &keys {
                table.reinforce(key, now);
            }
        }

        debug!(
            entry_id = %entry.id,
            kind = kind.as_str(),
            importance,
            mined = keys.len(),
            "Stored memory entry"
        );
        Ok(id)
    }

    /// The `limit` entries best matching `query`, ranked by
    /// relevance × importance with more recent entries breaking ties.
    /// An empty store yields an empty list, never an error.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        let entries = self
            .memories
            .load_all()
            .await
            .map_err(MemoryError::store_unavailable)?;

        let now = Utc::now();
        let mut ranked: Vec<(MemoryEntry, f64)> = entries
            .into_iter()
            .map(|entry| {
                let score = scoring::calculate_relevance(&entry, query, now) * entry.importance;
                (entry, score)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        });

        Ok(ranked.into_iter().take(limit).map(|(entry, _)| entry).collect())
    }

    /// Snapshot of the learning state. Never errors: a failed store read
    /// reports a zero memory count.
    pub async fn learning_insights(&self) -> LearningInsights {
        let (total_patterns, top_patterns) = {
            let table = self.table.lock().await;
            (table.len(), table.top_k(self.insight_top_k))
        };

        let memory_count = match self.memories.count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Could not read memory count for insights");
                0
            }
        };

        LearningInsights {
            total_patterns,
            top_patterns,
            memory_count,
            last_learning_activity: self.cycle.last_activity().await,
        }
    }

    /// Stop the background tasks and flush the pattern table.
    /// The final persist runs to completion before this returns.
    pub async fn shutdown(&self) -> Result<(), MemoryError> {
        info!(agent_id = %self.agent_id, "Shutting down memory service");

        self.cycle.shutdown_token().cancel();
        self.coordinator.shutdown_token().cancel();

        let mut tasks = self.background_tasks.lock().await;
        for handle in tasks.drain(..) {
            let _ = handle.await;
        }
        drop(tasks);

        let table = self.table.lock().await;
        self.patterns
            .persist(&table)
            .await
            .map_err(MemoryError::store_unavailable)?;

        info!(agent_id = %self.agent_id, patterns = table.len(), "Memory service shut down");
        Ok(())
    }
}
