// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Learned patterns and the in-process pattern table.
//!
//! A [`LearningPattern`] aggregates statistics for one mined pattern key.
//! Confidence grows monotonically under local reinforcement (+0.1 per
//! observation, capped at 1.0) and may only be replaced wholesale by a peer
//! record with strictly higher confidence. Provenance is append-only: the
//! trail of peer agents a pattern was adopted from is never rewritten.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence assigned to a pattern on first local observation
const SEED_CONFIDENCE: f64 = 0.3;

/// Confidence gained per local reinforcement
const REINFORCEMENT_STEP: f64 = 0.1;

/// Aggregated statistics for one mined pattern key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPattern {
    pub key: String,
    /// Estimated reliability in `[0, 1]`, non-decreasing under local reinforcement
    pub confidence: f64,
    /// Count of local observations
    pub occurrences: u64,
    /// Most recent observation or adoption
    pub last_seen: DateTime<Utc>,
    /// Peer agents this pattern was adopted from, oldest first
    pub provenance: Vec<String>,
}

impl LearningPattern {
    /// A freshly observed, purely local pattern
    pub fn seeded(key: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            confidence: SEED_CONFIDENCE,
            occurrences: 1,
            last_seen: observed_at,
            provenance: Vec::new(),
        }
    }

    /// Ranking weight used for snapshot selection
    pub fn strength(&self) -> f64 {
        self.confidence * self.occurrences as f64
    }
}

/// Liveness tag carried on peer snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    Active,
}

/// Ephemeral broadcast payload: a sender's top patterns plus liveness info.
/// Serialized to JSON on the wire, consumed immediately by peers, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSnapshot {
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
    pub patterns: Vec<LearningPattern>,
    pub memory_count: usize,
    pub status: PeerStatus,
}

/// Read model returned by `learning_insights()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningInsights {
    pub total_patterns: usize,
    pub top_patterns: Vec<LearningPattern>,
    pub memory_count: usize,
    pub last_learning_activity: Option<DateTime<Utc>>,
}

/// In-process map of pattern key to learned statistics.
///
/// All mutation goes through [`reinforce`](Self::reinforce) (local
/// observation) or [`adopt_if_stronger`](Self::adopt_if_stronger) (peer
/// merge); callers serialize access through a single mutex.
#[derive(Debug, Default)]
pub struct PatternTable {
    patterns: HashMap<String, LearningPattern>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: impl IntoIterator<Item = LearningPattern>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| (p.key.clone(), p))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LearningPattern> {
        self.patterns.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearningPattern> {
        self.patterns.values()
    }

    /// Record a direct local observation of `key`.
    ///
    /// Existing patterns gain +0.1 confidence (capped at 1.0) and an
    /// occurrence; unknown keys are seeded at confidence 0.3. This path never
    /// decreases confidence.
    pub fn reinforce(&mut self, key: &str, observed_at: DateTime<Utc>) {
        match self.patterns.get_mut(key) {
            Some(pattern) => {
                pattern.occurrences += 1;
                pattern.last_seen = observed_at;
                pattern.confidence = (pattern.confidence + REINFORCEMENT_STEP).min(1.0);
            }
            None => {
                self.patterns
                    .insert(key.to_string(), LearningPattern::seeded(key, observed_at));
            }
        }
    }

    /// Up to `k` patterns ranked by `confidence × occurrences`, ties broken
    /// by higher occurrences, then lexicographic key order.
    pub fn top_k(&self, k: usize) -> Vec<LearningPattern> {
        let mut ranked: Vec<&LearningPattern> = self.patterns.values().collect();
        ranked.sort_by(|a, b| {
            b.strength()
                .partial_cmp(&a.strength())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.occurrences.cmp(&a.occurrences))
                .then_with(|| a.key.cmp(&b.key))
        });
        ranked.into_iter().take(k).cloned().collect()
    }

    /// Confidence-wins merge of one peer pattern.
    ///
    /// Adopts the peer record only when no local pattern exists for the key
    /// or the local confidence is strictly lower (equal confidence keeps the
    /// local entry; local knowledge is never downgraded). On adoption the new
    /// provenance is the local trail, then the peer's trail, then one
    /// `learned_from_<peer>` marker. Returns whether the record was adopted.
    pub fn adopt_if_stronger(&mut self, peer_agent: &str, mut incoming: LearningPattern) -> bool {
        let local_provenance = match self.patterns.get(&incoming.key) {
            Some(local) if incoming.confidence <= local.confidence => return false,
            Some(local) => local.provenance.clone(),
            None => Vec::new(),
        };

        let mut provenance = local_provenance;
        provenance.append(&mut incoming.provenance);
        provenance.push(format!("learned_from_{peer_agent}"));
        incoming.provenance = provenance;

        self.patterns.insert(incoming.key.clone(), incoming);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(key: &str, confidence: f64, occurrences: u64) -> LearningPattern {
        LearningPattern {
            key: key.to_string(),
            confidence,
            occurrences,
            last_seen: Utc::now(),
            provenance: Vec::new(),
        }
    }

    #[test]
    fn test_reinforce_seeds_then_accumulates() {
        let mut table = PatternTable::new();
        let now = Utc::now();

        for _ in 0..5 {
            table.reinforce("error login", now);
        }

        let learned = table.get("error login").unwrap();
        assert_eq!(learned.occurrences, 5);
        // 0.3 + 0.1 * 4
        assert!((learned.confidence - 0.7).abs() < 1e-9);
        assert!(learned.provenance.is_empty());
    }

    #[test]
    fn test_reinforce_confidence_saturates_at_one() {
        let mut table = PatternTable::new();
        let now = Utc::now();

        for _ in 0..20 {
            table.reinforce("error login", now);
        }

        let learned = table.get("error login").unwrap();
        assert_eq!(learned.occurrences, 20);
        assert!((learned.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_k_orders_by_strength_then_occurrences_then_key() {
        let table = PatternTable::from_patterns(vec![
            pattern("alpha", 0.5, 4),  // strength 2.0
            pattern("beta", 0.4, 5),   // strength 2.0, more occurrences
            pattern("gamma", 0.9, 1),  // strength 0.9
            pattern("delta", 0.45, 2), // strength 0.9, more occurrences than gamma
        ]);

        let top = table.top_k(3);
        let keys: Vec<&str> = top.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["beta", "alpha", "delta"]);
    }

    #[test]
    fn test_top_k_equal_strength_equal_occurrences_uses_key_order() {
        let table = PatternTable::from_patterns(vec![
            pattern("zulu", 0.5, 2),
            pattern("alpha", 0.5, 2),
        ]);

        let top = table.top_k(2);
        assert_eq!(top[0].key, "alpha");
        assert_eq!(top[1].key, "zulu");
    }

    #[test]
    fn test_merge_lower_confidence_is_rejected() {
        let mut table = PatternTable::from_patterns(vec![pattern("error login", 0.6, 3)]);

        let adopted = table.adopt_if_stronger("agent-b", pattern("error login", 0.4, 10));
        assert!(!adopted);

        let local = table.get("error login").unwrap();
        assert!((local.confidence - 0.6).abs() < 1e-9);
        assert_eq!(local.occurrences, 3);
    }

    #[test]
    fn test_merge_equal_confidence_keeps_local() {
        let mut table = PatternTable::from_patterns(vec![pattern("error login", 0.4, 3)]);

        let adopted = table.adopt_if_stronger("agent-b", pattern("error login", 0.4, 99));
        assert!(!adopted);
        assert_eq!(table.get("error login").unwrap().occurrences, 3);
    }

    #[test]
    fn test_merge_adoption_appends_provenance_in_order() {
        let mut local = pattern("error login", 0.2, 1);
        local.provenance = vec!["learned_from_B".to_string()];
        let mut table = PatternTable::from_patterns(vec![local]);

        let adopted = table.adopt_if_stronger("agent-c", pattern("error login", 0.5, 7));
        assert!(adopted);

        let merged = table.get("error login").unwrap();
        assert!((merged.confidence - 0.5).abs() < 1e-9);
        assert_eq!(merged.occurrences, 7);
        assert_eq!(
            merged.provenance,
            vec!["learned_from_B".to_string(), "learned_from_agent-c".to_string()]
        );
    }

    #[test]
    fn test_merge_unknown_key_is_adopted_with_single_marker() {
        let mut table = PatternTable::new();

        let adopted = table.adopt_if_stronger("agent-b", pattern("success deploy", 0.5, 2));
        assert!(adopted);

        let merged = table.get("success deploy").unwrap();
        assert_eq!(merged.provenance, vec!["learned_from_agent-b".to_string()]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = PeerSnapshot {
            agent_id: "agent-a".to_string(),
            timestamp: Utc::now(),
            patterns: vec![pattern("error login", 0.5, 2)],
            memory_count: 12,
            status: PeerStatus::Active,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: PeerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.agent_id, "agent-a");
        assert_eq!(decoded.patterns.len(), 1);
        assert_eq!(decoded.status, PeerStatus::Active);
    }
}
