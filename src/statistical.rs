//! Statistical intent classifier
//!
//! Scores whole intents instead of single patterns: every intent is a bag of
//! the keywords of its similarity patterns, weighted by inverse document
//! frequency across intents (or by Naive-Bayes likelihoods). A winner must
//! beat the runner-up by a margin that grows with utterance length.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::config::Weighting;
use crate::matcher::CompiledIntent;
use crate::similarity::FULL_SCORE;
use crate::types::{MatchResult, NormalizedUtterance};

pub const MIN_MARGIN: f64 = 0.8;
pub const MAX_MARGIN: f64 = 2.5;
const MARGIN_PER_TOKEN: f64 = 0.4;

/// Required lead of the best intent over the second best.
pub fn margin_threshold(token_count: usize) -> f64 {
    (MARGIN_PER_TOKEN * token_count as f64).clamp(MIN_MARGIN, MAX_MARGIN)
}

#[derive(Debug, Clone)]
struct IntentStats {
    name: String,
    term_freq: AHashMap<String, usize>,
    total_tokens: usize,
    log_prior: f64,
}

/// Precomputed per-intent token statistics. Rebuilt on every vocabulary swap.
#[derive(Debug, Clone)]
pub struct StatisticalModel {
    weighting: Weighting,
    intents: Vec<IntentStats>,
    doc_freq: AHashMap<String, usize>,
}

impl StatisticalModel {
    /// Intents without similarity patterns take no part in the model.
    pub fn build(intents: &[CompiledIntent], weighting: Weighting) -> Self {
        let mut stats = Vec::with_capacity(intents.len());
        let mut doc_freq: AHashMap<String, usize> = AHashMap::new();
        let mut pattern_counts = Vec::with_capacity(intents.len());

        for intent in intents {
            let mut term_freq: AHashMap<String, usize> = AHashMap::new();
            let mut total_tokens = 0;
            let mut patterns = 0;
            for pattern in intent.patterns.iter().filter(|p| p.is_similarity()) {
                patterns += 1;
                for keyword in &pattern.keywords {
                    *term_freq.entry(keyword.clone()).or_insert(0) += 1;
                    total_tokens += 1;
                }
            }
            if patterns == 0 {
                continue;
            }
            for keyword in term_freq.keys() {
                *doc_freq.entry(keyword.clone()).or_insert(0) += 1;
            }
            pattern_counts.push(patterns);
            stats.push(IntentStats {
                name: intent.name.clone(),
                term_freq,
                total_tokens,
                log_prior: 0.0,
            });
        }

        let n = stats.len();
        let total_patterns: usize = pattern_counts.iter().sum();
        for (intent, patterns) in stats.iter_mut().zip(pattern_counts) {
            intent.log_prior =
                ((patterns as f64 + 1.0) / (total_patterns as f64 + n as f64)).ln();
        }

        Self {
            weighting,
            intents: stats,
            doc_freq,
        }
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    fn doc_freq(&self, token: &str) -> usize {
        self.doc_freq.get(token).copied().unwrap_or(0)
    }

    /// `ln((N + 1) / (df + 1)) + 1`
    pub fn idf(&self, token: &str) -> f64 {
        let n = self.intents.len() as f64;
        let df = self.doc_freq(token) as f64;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// Log-score of every intent, in model order. Tokens unknown to the whole
    /// model carry no information and are skipped.
    pub fn scores(&self, keywords: &[String]) -> Vec<f64> {
        let known: Vec<&String> = keywords
            .iter()
            .filter(|k| self.doc_freq(k) > 0)
            .collect();
        let vocab_size = self.doc_freq.len() as f64;

        self.intents
            .iter()
            .map(|intent| {
                let likelihood: f64 = known
                    .iter()
                    .map(|token| {
                        let tf = intent.term_freq.get(token.as_str()).copied().unwrap_or(0) as f64;
                        match self.weighting {
                            Weighting::TfIdf => {
                                let idf = self.idf(token);
                                (1.0 + tf * idf).ln() * (1.0 + idf).ln()
                            }
                            Weighting::NaiveBayes => {
                                ((tf + 1.0) / (intent.total_tokens as f64 + vocab_size)).ln()
                            }
                        }
                    })
                    .sum();
                intent.log_prior + likelihood
            })
            .collect()
    }

    pub fn classify(&self, utterance: &NormalizedUtterance) -> Option<MatchResult> {
        let keywords = &utterance.keywords;
        if self.intents.is_empty() || !keywords.iter().any(|k| self.doc_freq(k) > 0) {
            return None;
        }

        let scores = self.scores(keywords);
        let mut best = 0;
        let mut second: Option<usize> = None;
        for i in 1..scores.len() {
            if scores[i] > scores[best] {
                second = Some(best);
                best = i;
            } else if second.is_none_or(|s| scores[i] > scores[s]) {
                second = Some(i);
            }
        }

        let confidence = softmax_share(&scores, best) * FULL_SCORE;
        let margin = second.map_or(f64::INFINITY, |s| scores[best] - scores[s]);
        let required = margin_threshold(keywords.len());
        if margin > required {
            return Some(MatchResult::new(self.intents[best].name.clone(), confidence, None));
        }

        debug!(margin, required, "statistical margin too small, trying rare-token match");
        self.rare_token_match(keywords, &scores)
    }

    /// Every model intent with its softmax share, highest first. Empty when
    /// the utterance has no token the model knows.
    pub fn rank(&self, utterance: &NormalizedUtterance) -> Vec<MatchResult> {
        let keywords = &utterance.keywords;
        if !keywords.iter().any(|k| self.doc_freq(k) > 0) {
            return Vec::new();
        }

        let scores = self.scores(keywords);
        let mut ranked: Vec<MatchResult> = self
            .intents
            .iter()
            .enumerate()
            .map(|(i, intent)| {
                MatchResult::new(intent.name.clone(), softmax_share(&scores, i) * FULL_SCORE, None)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Accept the single intent that owns keywords no other intent has.
    fn rare_token_match(&self, keywords: &[String], scores: &[f64]) -> Option<MatchResult> {
        let mut owners = AHashSet::new();
        for keyword in keywords.iter().filter(|k| self.doc_freq(k) == 1) {
            if let Some(index) = self
                .intents
                .iter()
                .position(|i| i.term_freq.contains_key(keyword.as_str()))
            {
                owners.insert(index);
            }
        }

        if owners.len() != 1 {
            return None;
        }
        let index = owners.into_iter().next()?;
        Some(MatchResult::new(
            self.intents[index].name.clone(),
            softmax_share(scores, index) * FULL_SCORE,
            None,
        ))
    }
}

/// Probability mass of `index` under a softmax over log-scores.
fn softmax_share(scores: &[f64], index: usize) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = scores.iter().map(|s| (s - max).exp()).sum();
    if total > 0.0 {
        (scores[index] - max).exp() / total
    } else {
        0.0
    }
}

/// First typed (non-similarity) pattern that matches, in vocabulary order.
pub fn typed_match(
    utterance: &NormalizedUtterance,
    intents: &[CompiledIntent],
) -> Option<MatchResult> {
    intents.iter().find_map(|intent| {
        intent
            .patterns
            .iter()
            .filter(|p| !p.is_similarity())
            .find(|p| p.typed_match(utterance) == Some(true))
            .map(|p| MatchResult::new(intent.name.clone(), FULL_SCORE, Some(p.original.clone())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleProfile;
    use crate::normalize::Normalizer;
    use crate::types::Intent;

    fn model(intents: &[(&str, &[&str])], weighting: Weighting) -> (Normalizer, StatisticalModel) {
        let n = Normalizer::new(LocaleProfile::english()).unwrap();
        let compiled: Vec<CompiledIntent> = intents
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
        let model = StatisticalModel::build(&compiled, weighting);
        (n, model)
    }

    const GREET: &[&str] = &["hello friend", "hi friend", "good day friend"];
    const FEED: &[&str] = &["feed me", "i am hungry", "want food"];

    #[test]
    fn test_margin_threshold_clamped() {
        assert_eq!(margin_threshold(0), MIN_MARGIN);
        assert_eq!(margin_threshold(1), MIN_MARGIN);
        assert!((margin_threshold(3) - 1.2).abs() < 1e-9);
        assert_eq!(margin_threshold(50), MAX_MARGIN);
    }

    #[test]
    fn test_idf() {
        let (_, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::TfIdf);
        assert!((m.idf("friend") - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-9);
        assert!((m.idf("unknown") - (3.0f64.ln() + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_clear_winner_tfidf() {
        let (n, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::TfIdf);
        let result = m.classify(&n.normalize("I am so hungry, want food")).unwrap();
        assert_eq!(result.intent_name, "feed");
        assert!(result.confidence > 50.0);
        assert!(result.matched_pattern.is_none());
    }

    #[test]
    fn test_clear_winner_naive_bayes() {
        let (n, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::NaiveBayes);
        let result = m.classify(&n.normalize("I am so hungry, want food")).unwrap();
        assert_eq!(result.intent_name, "feed");
    }

    #[test]
    fn test_near_tie_on_short_utterance_rejected() {
        for weighting in [Weighting::TfIdf, Weighting::NaiveBayes] {
            let (n, m) = model(&[("a", &["hello friend"]), ("b", &["hello buddy"])], weighting);
            assert!(m.classify(&n.normalize("hello")).is_none(), "{weighting:?}");
        }
    }

    #[test]
    fn test_rare_token_partial_match() {
        let (n, m) = model(&[("a", &["hello friend"]), ("b", &["hello buddy"])], Weighting::TfIdf);
        let result = m.classify(&n.normalize("hello buddy")).unwrap();
        assert_eq!(result.intent_name, "b");
    }

    #[test]
    fn test_rank_shares_sum_to_full_score() {
        let (n, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::NaiveBayes);
        let ranked = m.rank(&n.normalize("I am so hungry, want food"));
        assert_eq!(ranked[0].intent_name, "feed");
        let total: f64 = ranked.iter().map(|r| r.confidence).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(m.rank(&n.normalize("quantum")).is_empty());
    }

    #[test]
    fn test_unknown_tokens_no_match() {
        let (n, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::TfIdf);
        assert!(m.classify(&n.normalize("quantum chromodynamics")).is_none());
        assert!(m.classify(&n.normalize("")).is_none());
    }

    #[test]
    fn test_scores_are_finite() {
        let (_, m) = model(&[("greet", GREET), ("feed", FEED)], Weighting::NaiveBayes);
        let scores = m.scores(&["friend".to_string(), "never_seen".to_string()]);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_typed_patterns_skip_model() {
        let n = Normalizer::new(LocaleProfile::english()).unwrap();
        let intent = Intent::new(
            "code",
            vec!["regex:^\\d{4}$".to_string()],
            vec!["ok".to_string()],
        );
        let compiled = vec![CompiledIntent::compile(&intent, &n)];
        assert!(StatisticalModel::build(&compiled, Weighting::TfIdf).is_empty());

        let result = typed_match(&n.normalize("1234"), &compiled).unwrap();
        assert_eq!(result.intent_name, "code");
        assert_eq!(result.confidence, 100.0);
    }
}
