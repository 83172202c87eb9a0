// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # aegis-cortex — distributed agent memory & pattern learning
//!
//! Persists agent experience records, scores their importance at write time
//! and their relevance at read time, mines behavioral patterns from them on a
//! recurring background cycle, and propagates learned patterns across
//! independent agent processes through broadcast coordination.
//!
//! The external key/value store and pub/sub bus are collaborators behind the
//! [`KeyValueStore`] and [`BroadcastBus`] traits; in-memory backends are
//! provided for tests and single-process deployments. Cross-process pattern
//! state is eventually consistent: merges are confidence-wins, best-effort,
//! with no distributed locking.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Entry point:** [`MemoryService::connect`]

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;
