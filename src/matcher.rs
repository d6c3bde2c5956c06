//! Intent matcher - pattern-mode classification over a compiled vocabulary

use tracing::debug;

use crate::normalize::Normalizer;
use crate::pattern::CompiledPattern;
use crate::similarity::{matched_tokens, PatternScorer, FULL_SCORE};
use crate::types::{Intent, IntentDiagnostics, MatchResult, NormalizedUtterance, PatternDiagnostics};

/// Minimum best-pattern score for an intent to be accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 86.0;
/// At or above this confidence every response style is allowed. Sits above
/// `ACCEPTANCE_THRESHOLD` so that accepted but partial matches fall below it.
pub const HIGH_CONFIDENCE: f64 = 95.0;

/// An intent with its patterns compiled once
#[derive(Debug, Clone)]
pub struct CompiledIntent {
    pub name: String,
    pub priority: i64,
    pub patterns: Vec<CompiledPattern>,
}

impl CompiledIntent {
    pub fn compile(intent: &Intent, normalizer: &Normalizer) -> Self {
        Self {
            name: intent.name.clone(),
            priority: intent.priority,
            patterns: intent
                .patterns
                .iter()
                .map(|p| CompiledPattern::compile(p, normalizer))
                .collect(),
        }
    }

    /// Highest-scoring pattern; the earliest one wins ties.
    pub fn best_pattern(
        &self,
        utterance: &NormalizedUtterance,
        scorer: &dyn PatternScorer,
    ) -> Option<(&CompiledPattern, f64)> {
        let mut best: Option<(&CompiledPattern, f64)> = None;
        for pattern in &self.patterns {
            let score = scorer.score(utterance, pattern);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((pattern, score));
                if score >= FULL_SCORE {
                    break;
                }
            }
        }
        best
    }
}

/// Match an utterance against compiled intents.
///
/// Intents are scanned in vocabulary order and only a strictly higher score
/// replaces the current best, so ties go to the earliest intent. Returns
/// `None` when the best score is below `ACCEPTANCE_THRESHOLD`.
pub fn match_intent(
    utterance: &NormalizedUtterance,
    intents: &[CompiledIntent],
    scorer: &dyn PatternScorer,
) -> Option<MatchResult> {
    if utterance.is_blank() || intents.is_empty() {
        return None;
    }

    let mut best: Option<(&CompiledIntent, &CompiledPattern, f64)> = None;
    for intent in intents {
        let Some((pattern, score)) = intent.best_pattern(utterance, scorer) else {
            continue;
        };
        if best.is_none_or(|(_, _, s)| score > s) {
            best = Some((intent, pattern, score));
            if score >= FULL_SCORE {
                break;
            }
        }
    }

    let (intent, pattern, score) = best?;
    if score < ACCEPTANCE_THRESHOLD {
        debug!(
            best_intent = %intent.name,
            score,
            "best pattern score below acceptance threshold"
        );
        return None;
    }

    Some(MatchResult::new(
        intent.name.clone(),
        score,
        Some(pattern.original.clone()),
    ))
}

/// Best score per intent, highest first; vocabulary order among equals.
pub fn rank_intents(
    utterance: &NormalizedUtterance,
    intents: &[CompiledIntent],
    scorer: &dyn PatternScorer,
) -> Vec<MatchResult> {
    let mut ranked: Vec<MatchResult> = intents
        .iter()
        .filter_map(|intent| {
            intent.best_pattern(utterance, scorer).map(|(pattern, score)| {
                MatchResult::new(intent.name.clone(), score, Some(pattern.original.clone()))
            })
        })
        .collect();

    // Stable sort keeps vocabulary order for equal scores
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Score of every pattern of every intent.
pub fn diagnose(
    utterance: &NormalizedUtterance,
    intents: &[CompiledIntent],
    scorer: &dyn PatternScorer,
) -> Vec<IntentDiagnostics> {
    intents
        .iter()
        .map(|intent| IntentDiagnostics {
            intent: intent.name.clone(),
            priority: intent.priority,
            patterns: intent
                .patterns
                .iter()
                .map(|pattern| PatternDiagnostics {
                    pattern: pattern.original.clone(),
                    kind: pattern.kind.label().to_string(),
                    score: scorer.score(utterance, pattern),
                    matched_tokens: matched_tokens(utterance, pattern),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleProfile;
    use crate::similarity::{OverlapScorer, SequenceScorer};

    fn compile(intents: &[(&str, &[&str])]) -> (Normalizer, Vec<CompiledIntent>) {
        let n = Normalizer::new(LocaleProfile::english()).unwrap();
        let compiled = intents
            .iter()
            .map(|(name, patterns)| {
                let intent = Intent::new(
                    *name,
                    patterns.iter().map(|p| p.to_string()).collect(),
                    vec!["ok".to_string()],
                );
                CompiledIntent::compile(&intent, &n)
            })
            .collect();
        (n, compiled)
    }

    #[test]
    fn test_exact_match() {
        let (n, intents) = compile(&[("greet", &["hello there"]), ("feed", &["i am hungry"])]);

        let m = match_intent(&n.normalize("Hello there!"), &intents, &SequenceScorer).unwrap();
        assert_eq!(m.intent_name, "greet");
        assert_eq!(m.confidence, 100.0);
        assert_eq!(m.matched_pattern.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_no_match() {
        let (n, intents) = compile(&[("greet", &["hello there"])]);
        let unrelated = n.normalize("completely unrelated query");
        assert!(match_intent(&unrelated, &intents, &SequenceScorer).is_none());
        assert!(match_intent(&n.normalize(""), &intents, &SequenceScorer).is_none());
        assert!(match_intent(&n.normalize("   "), &intents, &SequenceScorer).is_none());
    }

    #[test]
    fn test_punctuation_only_utterance_reaches_typed_patterns() {
        let (n, intents) = compile(&[
            ("greet", &["hello there"]),
            ("love", &["exact:<3", "contains:?"]),
        ]);
        for scorer in [&SequenceScorer as &dyn PatternScorer, &OverlapScorer] {
            let m = match_intent(&n.normalize("?"), &intents, scorer).unwrap();
            assert_eq!(m.intent_name, "love");
            assert_eq!(m.confidence, 100.0);
            assert_eq!(m.matched_pattern.as_deref(), Some("contains:?"));
            assert!(match_intent(&n.normalize("!!"), &intents, scorer).is_none());
        }
    }

    #[test]
    fn test_below_threshold_rejected() {
        let (n, intents) = compile(&[("greet", &["hello there"])]);
        // 50% overlap
        assert!(match_intent(&n.normalize("hello you"), &intents, &SequenceScorer).is_none());
    }

    #[test]
    fn test_tie_goes_to_first_intent() {
        let (n, intents) = compile(&[
            ("first", &["good morning"]),
            ("second", &["good morning"]),
        ]);
        let m = match_intent(&n.normalize("good morning"), &intents, &SequenceScorer).unwrap();
        assert_eq!(m.intent_name, "first");
    }

    #[test]
    fn test_higher_score_beats_order() {
        let (n, intents) = compile(&[
            ("partial", &["feed me tuna now please"]),
            ("full", &["feed me"]),
        ]);
        let m = match_intent(&n.normalize("could you feed me"), &intents, &SequenceScorer).unwrap();
        assert_eq!(m.intent_name, "full");
    }

    #[test]
    fn test_typed_pattern_accepted() {
        let (n, intents) = compile(&[("secret", &["regex:^x+y$", "regex:("])]);
        let m = match_intent(&n.normalize("xxxy"), &intents, &OverlapScorer).unwrap();
        assert_eq!(m.intent_name, "secret");
        assert_eq!(m.matched_pattern.as_deref(), Some("regex:^x+y$"));
        assert!(match_intent(&n.normalize("("), &intents, &OverlapScorer).is_none());
    }

    #[test]
    fn test_rank_orders_by_score() {
        let (n, intents) = compile(&[
            ("a", &["open the door"]),
            ("b", &["close the window"]),
            ("c", &["open the window"]),
        ]);
        let ranked = rank_intents(&n.normalize("open the window"), &intents, &SequenceScorer);
        let names: Vec<&str> = ranked.iter().map(|m| m.intent_name.as_str()).collect();
        assert_eq!(names[0], "c");
        assert_eq!(ranked[0].confidence, 100.0);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_diagnose_covers_every_pattern() {
        let (n, intents) = compile(&[("greet", &["hello there", "exact:Hi"])]);
        let report = diagnose(&n.normalize("hello"), &intents, &SequenceScorer);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].patterns.len(), 2);
        assert_eq!(report[0].patterns[0].matched_tokens, vec!["hello"]);
        assert_eq!(report[0].patterns[1].kind, "exact");
        assert_eq!(report[0].patterns[1].score, 0.0);
    }
}
