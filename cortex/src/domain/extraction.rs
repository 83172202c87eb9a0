// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pattern extractor: mines candidate pattern keys from memory content.
//!
//! Extraction is a fixed, ordered list of keyword-anchored rules rather than
//! inline pattern literals, so new rules can be added without touching the
//! pattern table logic. Each matching rule yields exactly one candidate key
//! built from its prefix and the trailing captured token.

use once_cell::sync::Lazy;
use regex::Regex;

/// One extraction template: a compiled regex whose first capture group is the
/// token the candidate key is built from.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: &'static str,
    pattern: Regex,
    key_prefix: &'static str,
}

impl ExtractionRule {
    pub fn new(name: &'static str, pattern: &str, key_prefix: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            key_prefix,
        })
    }

    fn apply(&self, content: &str) -> Option<String> {
        let token = self.pattern.captures(content)?.get(1)?;
        Some(format!("{} {}", self.key_prefix, token.as_str()))
    }
}

static DEFAULT_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        ExtractionRule::new(
            "error_context",
            r"error[\s:]+(?:with\s+|in\s+|on\s+)?(\w+)",
            "error",
        )
        .expect("error_context rule compiles"),
        ExtractionRule::new(
            "success_context",
            r"success(?:ful|fully)?[\s:]+(?:with\s+|in\s+|at\s+)?(\w+)",
            "success",
        )
        .expect("success_context rule compiles"),
        ExtractionRule::new(
            "user_intent",
            r"user\s+(?:wants?|needs?|requested|asked\s+for)\s+(\w+)",
            "intent",
        )
        .expect("user_intent rule compiles"),
        ExtractionRule::new(
            "coordination_context",
            r"coordinat(?:e|ed|ing|ion)\s+(?:with\s+|on\s+)?(\w+)",
            "coordination",
        )
        .expect("coordination_context rule compiles"),
    ]
});

/// Applies an ordered rule list to memory content
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    rules: Vec<ExtractionRule>,
}

impl PatternExtractor {
    /// Extractor with a caller-supplied rule list
    pub fn with_rules(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    /// Candidate pattern keys for `content`, in rule order.
    /// Returns an empty vec when nothing matches.
    pub fn extract(&self, content: &str) -> Vec<String> {
        let lowered = content.to_lowercase();
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(&lowered))
            .collect()
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }
}
