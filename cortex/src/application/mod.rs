// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application layer: the caller-facing memory service plus the two
//! background processes (learning cycle, peer coordination).

pub mod learning_cycle;
pub mod memory_service;
pub mod peer_coordinator;

pub use learning_cycle::{LearningCycle, LearningCycleConfig};
pub use memory_service::{MemoryError, MemoryService, MemoryServiceConfig};
pub use peer_coordinator::PeerCoordinator;
