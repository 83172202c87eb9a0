// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Learning cycle scheduler - recurring background pattern mining.
//!
//! Every fire: load the most recent window of memory entries, run the
//! extractor over each, reinforce the pattern table, persist it, then hand a
//! snapshot of the top patterns to the peer coordinator for broadcast.
//!
//! At most one cycle runs per process: a fire that arrives while a cycle is
//! in flight is skipped, not queued. The cycle is best-effort maintenance;
//! any step failure is logged and the next timer fire still occurs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::extraction::PatternExtractor;
use crate::domain::pattern::{PatternTable, PeerSnapshot, PeerStatus};
use crate::application::peer_coordinator::PeerCoordinator;
use crate::infrastructure::memory_repository::MemoryRepository;
use crate::infrastructure::pattern_repository::PatternRepository;

/// Configuration for the learning cycle
#[derive(Debug, Clone)]
pub struct LearningCycleConfig {
    /// Seconds between cycle fires
    pub interval_seconds: u64,

    /// How many recent memory entries each cycle re-scans
    pub window: usize,

    /// How many top patterns each snapshot carries
    pub top_k: usize,

    /// Whether the background cycle runs at all
    pub enabled: bool,
}

impl Default for LearningCycleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            window: 100,
            top_k: 10,
            enabled: true,
        }
    }
}

/// Recurring background learning task
pub struct LearningCycle {
    memories: Arc<MemoryRepository>,
    patterns: Arc<PatternRepository>,
    table: Arc<Mutex<PatternTable>>,
    extractor: PatternExtractor,
    coordinator: Arc<PeerCoordinator>,
    agent_id: String,
    config: LearningCycleConfig,
    running: AtomicBool,
    last_completed: RwLock<Option<DateTime<Utc>>>,
    shutdown_token: CancellationToken,
}

impl LearningCycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        memories: Arc<MemoryRepository>,
        patterns: Arc<PatternRepository>,
        table: Arc<Mutex<PatternTable>>,
        extractor: PatternExtractor,
        coordinator: Arc<PeerCoordinator>,
        agent_id: impl Into<String>,
        config: LearningCycleConfig,
    ) -> Self {
        Self {
            memories,
            patterns,
            table,
            extractor,
            coordinator,
            agent_id: agent_id.into(),
            config,
            running: AtomicBool::new(false),
            last_completed: RwLock::new(None),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Completion time of the most recent successful cycle
    pub async fn last_activity(&self) -> Option<DateTime<Utc>> {
        *self.last_completed.read().await
    }

    /// Start the background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Learning cycle is disabled");
            return;
        }

        info!(
            agent_id = %self.agent_id,
            interval_seconds = self.config.interval_seconds,
            window = self.config.window,
            top_k = self.config.top_k,
            "Starting learning cycle background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds));
        // The first tick completes immediately; consume it so the first
        // cycle runs one full interval after startup
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.run_cycle().await {
                        Ok(reinforced) => {
                            debug!(reinforced, "Learning cycle completed");
                        }
                        Err(e) => {
                            warn!(error = %e, "Learning cycle failed");
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!(agent_id = %self.agent_id, "Shutdown signal received, stopping learning cycle");
                    break;
                }
            }
        }
    }

    /// Execute one cycle, guarded so that overlapping fires are skipped.
    /// Returns the number of reinforcements applied.
    pub async fn run_cycle(&self) -> Result<usize> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Learning cycle already in progress, skipping fire");
            return Ok(0);
        }

        let result = self.cycle_inner().await;
        self.running.store(false, Ordering::Release);
        result
    }

    async fn cycle_inner(&self) -> Result<usize> {
        let entries = self.memories.recent(self.config.window).await?;
        let now = Utc::now();

        let mut reinforced = 0usize;
        let snapshot_patterns = {
            let mut table = self.table.lock().await;
            for entry in &entries {
                for key in self.extractor.extract(&entry.content) {
                    table.reinforce(&key, now);
                    reinforced += 1;
                }
            }

            self.patterns.persist(&table).await?;
            table.top_k(self.config.top_k)
        };

        let memory_count = self.memories.count().await?;
        let snapshot = PeerSnapshot {
            agent_id: self.agent_id.clone(),
            timestamp: now,
            patterns: snapshot_patterns,
            memory_count,
            status: PeerStatus::Active,
        };

        // Broadcast is fire-and-forget; the coordinator logs its own failures
        self.coordinator.broadcast(&snapshot).await;

        *self.last_completed.write().await = Some(Utc::now());
        Ok(reinforced)
    }
}
