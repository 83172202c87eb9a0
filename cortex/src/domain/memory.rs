// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Memory entry types for the distributed cortex
//! An entry is one atomic record of agent experience; entries are append-only
//! and never mutated or deleted after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a memory entry, used by the importance scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Experience,
    Learning,
    Coordination,
    Feedback,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Experience => "experience",
            MemoryKind::Learning => "learning",
            MemoryKind::Coordination => "coordination",
            MemoryKind::Feedback => "feedback",
        }
    }
}

/// One persisted record of agent experience.
///
/// `importance` is computed once at creation by the scoring engine and never
/// recomputed; `content` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique within the agent's namespace: `{agent_id}_{millis}_{suffix}`
    pub id: String,
    pub agent_id: String,
    pub kind: MemoryKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Write-once importance score in `[0, 1]`
    pub importance: f64,
    /// Ids of other entries this entry references
    pub related_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization_is_snake_case() {
        let json = serde_json::to_string(&MemoryKind::Coordination).unwrap();
        assert_eq!(json, "\"coordination\"");

        let kind: MemoryKind = serde_json::from_str("\"learning\"").unwrap();
        assert_eq!(kind, MemoryKind::Learning);
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = MemoryEntry {
            id: "agent-1_1700000000000_ab12".to_string(),
            agent_id: "agent-1".to_string(),
            kind: MemoryKind::Experience,
            content: "deployed successfully".to_string(),
            created_at: Utc::now(),
            importance: 0.45,
            related_ids: vec!["agent-1_1699999999999_cd34".to_string()],
        };

        let json = serde_json::to_string(&entry).unwrap();
        let decoded: MemoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, entry.id);
        assert_eq!(decoded.kind, entry.kind);
        assert_eq!(decoded.related_ids, entry.related_ids);
    }
}
