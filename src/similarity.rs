//! Pattern similarity scoring
//!
//! Scorers map an utterance and one compiled pattern to a strength in
//! `[0, 100]`. Typed patterns are binary; similarity patterns are scored by
//! the selected strategy.

use ahash::AHashSet;

use crate::pattern::CompiledPattern;
use crate::types::NormalizedUtterance;

/// Score when every pattern token appears in order with gaps allowed.
pub const LOOSE_ORDER_FLOOR: f64 = 65.0;
pub const FULL_SCORE: f64 = 100.0;

/// Strategy interface shared by the pattern-mode scorers
pub trait PatternScorer: Send + Sync {
    fn score(&self, utterance: &NormalizedUtterance, pattern: &CompiledPattern) -> f64;
}

/// Keyword coverage: the share of a pattern's keywords found in the utterance.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer;

/// Token overlap refined by token order and an in-order regex floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceScorer;

impl PatternScorer for OverlapScorer {
    fn score(&self, utterance: &NormalizedUtterance, pattern: &CompiledPattern) -> f64 {
        if let Some(matched) = pattern.typed_match(utterance) {
            return binary(matched);
        }
        if contains_either(&utterance.normalized, &pattern.normalized) {
            return FULL_SCORE;
        }

        let pattern_keywords: AHashSet<&str> =
            pattern.keywords.iter().map(String::as_str).collect();
        if pattern_keywords.is_empty() || utterance.keywords.is_empty() {
            return 0.0;
        }
        let utterance_keywords: AHashSet<&str> =
            utterance.keywords.iter().map(String::as_str).collect();

        let shared = pattern_keywords.intersection(&utterance_keywords).count();
        shared as f64 / pattern_keywords.len() as f64 * FULL_SCORE
    }
}

impl PatternScorer for SequenceScorer {
    fn score(&self, utterance: &NormalizedUtterance, pattern: &CompiledPattern) -> f64 {
        if let Some(matched) = pattern.typed_match(utterance) {
            return binary(matched);
        }
        if pattern.tokens.is_empty() || utterance.tokens.is_empty() {
            return 0.0;
        }

        // Fast path: one normalized form contains the other
        if contains_either(&utterance.normalized, &pattern.normalized) {
            return FULL_SCORE;
        }

        let overlap = token_overlap(&utterance.tokens, &pattern.tokens) * FULL_SCORE;
        // Order only refines an overlap that is already complete
        let mut score = if overlap >= FULL_SCORE {
            in_order_ratio(&utterance.tokens, &pattern.tokens) * FULL_SCORE
        } else {
            overlap
        };

        if pattern.matches_in_order(&utterance.normalized) {
            score = score.max(LOOSE_ORDER_FLOOR);
        }

        score.min(FULL_SCORE)
    }
}

fn binary(matched: bool) -> f64 {
    if matched {
        FULL_SCORE
    } else {
        0.0
    }
}

/// Token-boundary containment of either normalized form in the other.
pub fn contains_either(utterance: &str, pattern: &str) -> bool {
    if utterance.is_empty() || pattern.is_empty() {
        return false;
    }
    if utterance == pattern {
        return true;
    }
    let u = format!(" {utterance} ");
    let p = format!(" {pattern} ");
    u.contains(&p) || p.contains(&u)
}

/// Fraction of pattern tokens present anywhere in the utterance (0.0-1.0).
pub fn token_overlap(utterance: &[String], pattern: &[String]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let present: AHashSet<&str> = utterance.iter().map(String::as_str).collect();
    let shared = pattern
        .iter()
        .filter(|t| present.contains(t.as_str()))
        .count();
    shared as f64 / pattern.len() as f64
}

/// Fraction of pattern tokens matched by a single in-order walk over the
/// utterance (0.0-1.0).
pub fn in_order_ratio(utterance: &[String], pattern: &[String]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let mut next = 0;
    for token in utterance {
        if next < pattern.len() && *token == pattern[next] {
            next += 1;
        }
    }
    next as f64 / pattern.len() as f64
}

/// Pattern tokens (or keywords, for keyword scorers) that the utterance shares.
pub fn matched_tokens(utterance: &NormalizedUtterance, pattern: &CompiledPattern) -> Vec<String> {
    let present: AHashSet<&str> = utterance
        .tokens
        .iter()
        .chain(utterance.keywords.iter())
        .map(String::as_str)
        .collect();
    let mut matched: Vec<String> = Vec::new();
    for token in pattern.tokens.iter().chain(pattern.keywords.iter()) {
        if present.contains(token.as_str()) && !matched.contains(token) {
            matched.push(token.clone());
        }
    }
    matched
}
