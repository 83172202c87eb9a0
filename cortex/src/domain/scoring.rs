// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scoring engine: importance at write time, relevance at read time.
//!
//! Both functions are pure and always return a value in `[0, 1]`.
//! Importance is computed once when an entry is created and never
//! recomputed; relevance is computed per query against a caller-supplied
//! `now` so results are deterministic and testable.

use chrono::{DateTime, Utc};

use crate::domain::memory::{MemoryEntry, MemoryKind};

const BASE_IMPORTANCE: f64 = 0.5;
const KEYWORD_BONUS: f64 = 0.1;
const RELATED_BONUS: f64 = 0.05;

/// Keywords that mark an entry as likely valuable for future retrieval.
/// Each is counted at most once per entry.
const IMPORTANCE_KEYWORDS: [&str; 5] = ["error", "success", "learn", "improve", "coordinate"];

const VERBATIM_MATCH_BONUS: f64 = 0.8;
const WORD_OVERLAP_WEIGHT: f64 = 0.5;
const LEARNING_AFFINITY_BONUS: f64 = 0.3;

/// Half-decay window for the recency factor, in seconds (24 hours)
const RECENCY_DECAY_SECONDS: f64 = 24.0 * 3600.0;

fn kind_weight(kind: MemoryKind) -> f64 {
    match kind {
        MemoryKind::Learning => 0.9,
        MemoryKind::Coordination => 0.8,
        MemoryKind::Experience => 0.7,
        MemoryKind::Feedback => 0.6,
    }
}

/// Write-time importance of a new entry.
///
/// Base 0.5 scaled by the per-kind weight, plus 0.1 per matched keyword and
/// 0.05 per related entry, clamped to `[0, 1]`.
pub fn calculate_importance(kind: MemoryKind, content: &str, related_count: usize) -> f64 {
    let mut score = BASE_IMPORTANCE * kind_weight(kind);

    let lowered = content.to_lowercase();
    for keyword in IMPORTANCE_KEYWORDS {
        if lowered.contains(keyword) {
            score += KEYWORD_BONUS;
        }
    }

    score += RELATED_BONUS * related_count as f64;
    score.clamp(0.0, 1.0)
}

/// Read-time relevance of an entry against a query, recency-decayed.
///
/// Verbatim (case-insensitive) containment adds 0.8; fractional word overlap
/// contributes up to 0.5; `learning` entries gain 0.3 for queries mentioning
/// "learn". The sum is scaled by `0.5 + 0.5·e^(-age/24h)` and clamped.
pub fn calculate_relevance(entry: &MemoryEntry, query: &str, now: DateTime<Utc>) -> f64 {
    let content = entry.content.to_lowercase();
    let query = query.to_lowercase();

    let mut score = 0.0;

    if !query.is_empty() && content.contains(&query) {
        score += VERBATIM_MATCH_BONUS;
    }

    let words: Vec<&str> = query.split_whitespace().collect();
    if !words.is_empty() {
        let matched = words.iter().filter(|word| content.contains(*word)).count();
        score += matched as f64 / words.len() as f64 * WORD_OVERLAP_WEIGHT;
    }

    if entry.kind == MemoryKind::Learning && query.contains("learn") {
        score += LEARNING_AFFINITY_BONUS;
    }

    let age_seconds = (now - entry.created_at).num_seconds().max(0) as f64;
    let recency = 0.5 + 0.5 * (-age_seconds / RECENCY_DECAY_SECONDS).exp();

    (score * recency).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(kind: MemoryKind, content: &str, age: Duration) -> MemoryEntry {
        MemoryEntry {
            id: "agent-1_0_test".to_string(),
            agent_id: "agent-1".to_string(),
            kind,
            content: content.to_string(),
            created_at: Utc::now() - age,
            importance: 0.5,
            related_ids: Vec::new(),
        }
    }

    #[test]
    fn test_importance_stays_in_unit_interval() {
        let kinds = [
            MemoryKind::Experience,
            MemoryKind::Learning,
            MemoryKind::Coordination,
            MemoryKind::Feedback,
        ];
        let contents = [
            "",
            "plain note",
            "error success learn improve coordinate error error",
        ];

        for kind in kinds {
            for content in contents {
                for related in [0, 1, 5, 100] {
                    let score = calculate_importance(kind, content, related);
                    assert!((0.0..=1.0).contains(&score), "score {score} out of range");
                }
            }
        }
    }

    #[test]
    fn test_importance_kind_ordering_for_identical_content() {
        let content = "the user reported an error with login";

        let learning = calculate_importance(MemoryKind::Learning, content, 0);
        let experience = calculate_importance(MemoryKind::Experience, content, 0);
        let feedback = calculate_importance(MemoryKind::Feedback, content, 0);

        assert!(learning > experience);
        assert!(experience > feedback);
    }

    #[test]
    fn test_importance_counts_each_keyword_once() {
        let single = calculate_importance(MemoryKind::Experience, "error", 0);
        let repeated = calculate_importance(MemoryKind::Experience, "error error error", 0);
        assert!((single - repeated).abs() < 1e-9);

        let two = calculate_importance(MemoryKind::Experience, "error and success", 0);
        assert!(two > single);
    }

    #[test]
    fn test_importance_related_count_bonus() {
        let none = calculate_importance(MemoryKind::Feedback, "note", 0);
        let three = calculate_importance(MemoryKind::Feedback, "note", 3);
        assert!((three - none - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_stays_in_unit_interval() {
        let fresh = entry(
            MemoryKind::Learning,
            "learned to coordinate error recovery with success",
            Duration::zero(),
        );
        let score = calculate_relevance(&fresh, "learn coordinate error success", Utc::now());
        assert!((0.0..=1.0).contains(&score));

        let old = entry(MemoryKind::Feedback, "stale note", Duration::days(365));
        let score = calculate_relevance(&old, "completely unrelated", Utc::now());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_relevance_verbatim_match_beats_partial_overlap() {
        let now = Utc::now();
        let exact = entry(MemoryKind::Experience, "deploy failed on node 3", Duration::zero());
        let partial = entry(MemoryKind::Experience, "deploy succeeded", Duration::zero());

        let exact_score = calculate_relevance(&exact, "deploy failed", now);
        let partial_score = calculate_relevance(&partial, "deploy failed", now);
        assert!(exact_score > partial_score);
    }

    #[test]
    fn test_relevance_learning_affinity() {
        let now = Utc::now();
        let learning = entry(MemoryKind::Learning, "retry with backoff", Duration::zero());
        let experience = entry(MemoryKind::Experience, "retry with backoff", Duration::zero());

        let with_affinity = calculate_relevance(&learning, "what did we learn", now);
        let without = calculate_relevance(&experience, "what did we learn", now);
        assert!(with_affinity > without);
    }

    #[test]
    fn test_relevance_decays_with_age() {
        let now = Utc::now();
        let fresh = entry(MemoryKind::Experience, "cache invalidation bug", Duration::zero());
        let week_old = entry(MemoryKind::Experience, "cache invalidation bug", Duration::days(7));

        let fresh_score = calculate_relevance(&fresh, "cache invalidation", now);
        let old_score = calculate_relevance(&week_old, "cache invalidation", now);
        assert!(fresh_score > old_score);

        // The recency factor floors at 0.5, so old entries keep half strength
        assert!(old_score > fresh_score * 0.49);
    }
}
