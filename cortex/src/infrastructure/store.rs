// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Key/value collaborator contract.
//!
//! The subsystem persists memory entries and the pattern table as JSON
//! strings inside per-agent hash collections. The transport behind this
//! trait (redis, an embedded store, a test double) is supplied by the
//! embedding process; the subsystem relies on the store's own resilience
//! and adds no retry layer of its own.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

/// Hash-shaped key/value store: `key -> {field -> value}`
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Set one field of a hash, creating the hash if needed
    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()>;

    /// Read one field of a hash
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Read every field of a hash; empty map for an unknown key
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Number of fields in a hash; zero for an unknown key
    async fn hash_len(&self, key: &str) -> Result<usize>;
}
