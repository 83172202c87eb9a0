// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer: external collaborator contracts, in-process
//! backends and the per-agent repositories built on top of them.

pub mod bus;
pub mod in_memory;
pub mod memory_repository;
pub mod pattern_repository;
pub mod store;

pub use bus::{direct_channel, BroadcastBus, BusSubscription, BROADCAST_CHANNEL};
pub use in_memory::{InMemoryBroadcastBus, InMemoryKeyValueStore};
pub use memory_repository::MemoryRepository;
pub use pattern_repository::PatternRepository;
pub use store::KeyValueStore;
