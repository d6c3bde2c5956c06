//! Responder engine
//!
//! Owns the compiled vocabulary and answers utterances. Reloads and merges
//! build a complete replacement first and then swap it in, so queries never
//! observe a half-built vocabulary and a failed load leaves the previous one
//! in place.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, info, warn};

use crate::config::{ResponderConfig, Strategy};
use crate::error::{PatternWarning, Result};
use crate::matcher::{self, CompiledIntent, HIGH_CONFIDENCE};
use crate::merge::{merge, overrides_default};
use crate::normalize::Normalizer;
use crate::statistical::{self, StatisticalModel};
use crate::types::{
    IntentDiagnostics, MatchResult, NormalizedUtterance, Vocabulary, VocabularyInfo,
};

/// Answer of last resort when neither the vocabulary nor the locale provide
/// fallback phrases.
const LAST_RESORT: &str = "Meow?";

/// A vocabulary with every pattern compiled and every derived table built
#[derive(Debug)]
pub struct CompiledVocabulary {
    vocabulary: Vocabulary,
    intents: Vec<CompiledIntent>,
    model: Option<StatisticalModel>,
    fallbacks: Vec<String>,
    warnings: Vec<PatternWarning>,
    overlays: Vec<String>,
}

impl CompiledVocabulary {
    fn build(
        vocabulary: Vocabulary,
        normalizer: &Normalizer,
        config: &ResponderConfig,
        overlays: Vec<String>,
    ) -> Self {
        let intents: Vec<CompiledIntent> = vocabulary
            .intents()
            .iter()
            .map(|intent| CompiledIntent::compile(intent, normalizer))
            .collect();

        let mut warnings = Vec::new();
        for intent in &intents {
            for pattern in &intent.patterns {
                if let Some(reason) = pattern.error() {
                    warn!(
                        intent = %intent.name,
                        pattern = %pattern.original,
                        %reason,
                        "invalid pattern never matches"
                    );
                    warnings.push(PatternWarning {
                        intent: intent.name.clone(),
                        pattern: pattern.original.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        let model = match config.strategy {
            Strategy::Statistical(weighting) => Some(StatisticalModel::build(&intents, weighting)),
            _ => None,
        };

        let fallbacks = match vocabulary.default_responses() {
            Some(responses) => responses.to_vec(),
            None if !config.locale.fallbacks.is_empty() => config.locale.fallbacks.clone(),
            None => vec![LAST_RESORT.to_string()],
        };

        info!(
            intents = intents.len(),
            patterns = vocabulary.pattern_count(),
            invalid = warnings.len(),
            strategy = %config.strategy,
            "compiled vocabulary"
        );

        Self {
            vocabulary,
            intents,
            model,
            fallbacks,
            warnings,
            overlays,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn intents(&self) -> &[CompiledIntent] {
        &self.intents
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    fn classify(&self, utterance: &NormalizedUtterance, strategy: Strategy) -> Option<MatchResult> {
        if utterance.is_blank() {
            return None;
        }
        match (strategy, &self.model) {
            (Strategy::Statistical(_), Some(model)) => {
                statistical::typed_match(utterance, &self.intents)
                    .or_else(|| model.classify(utterance))
            }
            _ => matcher::match_intent(utterance, &self.intents, strategy.pattern_scorer()),
        }
    }
}

/// Persona responder: normalizer, scorer strategy and the installed vocabulary
#[derive(Debug)]
pub struct Responder {
    config: ResponderConfig,
    normalizer: Normalizer,
    current: RwLock<Arc<CompiledVocabulary>>,
}

impl Responder {
    /// Engine with an empty vocabulary; every utterance gets a fallback.
    pub fn new(config: ResponderConfig) -> Result<Self> {
        Self::with_vocabulary(config, Vocabulary::default())
    }

    pub fn with_vocabulary(config: ResponderConfig, vocabulary: Vocabulary) -> Result<Self> {
        let normalizer = Normalizer::new(config.locale.clone())?;
        let compiled = CompiledVocabulary::build(vocabulary, &normalizer, &config, Vec::new());
        Ok(Self {
            config,
            normalizer,
            current: RwLock::new(Arc::new(compiled)),
        })
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// The vocabulary in use right now. Later swaps do not affect it.
    pub fn snapshot(&self) -> Arc<CompiledVocabulary> {
        Arc::clone(&self.current.read())
    }

    /// Replace the vocabulary, dropping any applied overlays.
    pub fn install(&self, vocabulary: Vocabulary) {
        let compiled =
            CompiledVocabulary::build(vocabulary, &self.normalizer, &self.config, Vec::new());
        *self.current.write() = Arc::new(compiled);
    }

    /// Parse and install a vocabulary document. On error the previous
    /// vocabulary stays installed.
    pub fn load_json(&self, json: &str) -> Result<()> {
        match Vocabulary::from_json(json) {
            Ok(vocabulary) => {
                self.install(vocabulary);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "rejected vocabulary document, keeping previous one");
                Err(e)
            }
        }
    }

    /// Merge `overlay` into the installed vocabulary at `priority`.
    pub fn apply_overlay(&self, name: &str, overlay: &Vocabulary, priority: i64) {
        let guard = self.current.upgradable_read();
        let merged = merge(&guard.vocabulary, overlay, priority);

        let mut overlays = guard.overlays.clone();
        if !overlays.iter().any(|o| o == name) {
            overlays.push(name.to_string());
        }
        if overrides_default(overlay) {
            debug!(overlay = name, "overlay refreshes fallback responses");
        }

        let compiled = CompiledVocabulary::build(merged, &self.normalizer, &self.config, overlays);
        let mut current = RwLockUpgradableReadGuard::upgrade(guard);
        *current = Arc::new(compiled);
        info!(overlay = name, priority, "applied overlay");
    }

    pub fn normalize(&self, text: &str) -> NormalizedUtterance {
        self.normalizer.normalize(text)
    }

    /// Resolve an utterance to an intent, or `None` for the fallback path.
    pub fn classify(&self, utterance: &str) -> Option<MatchResult> {
        let normalized = self.normalizer.normalize(utterance);
        self.snapshot().classify(&normalized, self.config.strategy)
    }

    /// Pick one response for the utterance. Never fails: no match, empty
    /// input and an empty vocabulary all resolve to a fallback phrase.
    pub fn generate_response(&self, utterance: &str) -> String {
        let snapshot = self.snapshot();
        let normalized = self.normalizer.normalize(utterance);
        let mut rng = rand::rng();

        let chosen = snapshot
            .classify(&normalized, self.config.strategy)
            .and_then(|m| {
                let intent = snapshot.vocabulary.intent(&m.intent_name)?;
                let candidates = self.styled_responses(&intent.responses, m.confidence);
                candidates.choose(&mut rng).map(|r| r.to_string())
            });

        match chosen {
            Some(response) => response,
            None => {
                debug!(utterance, "no intent matched, using fallback");
                snapshot
                    .fallbacks
                    .choose(&mut rng)
                    .cloned()
                    .unwrap_or_else(|| LAST_RESORT.to_string())
            }
        }
    }

    /// `count` responses drawn without repetition until the pool runs out,
    /// then cycling through it again.
    pub fn generate_responses(&self, utterance: &str, count: usize) -> Vec<String> {
        let snapshot = self.snapshot();
        let normalized = self.normalizer.normalize(utterance);

        let mut pool: Vec<String> = snapshot
            .classify(&normalized, self.config.strategy)
            .and_then(|m| snapshot.vocabulary.intent(&m.intent_name))
            .map(|intent| intent.responses.clone())
            .unwrap_or_else(|| snapshot.fallbacks.clone());
        if pool.is_empty() {
            pool.push(LAST_RESORT.to_string());
        }
        pool.shuffle(&mut rand::rng());

        pool.iter().cycle().take(count).cloned().collect()
    }

    /// Below `HIGH_CONFIDENCE`, questions are preferred when the intent has any.
    fn styled_responses<'a>(&self, responses: &'a [String], confidence: f64) -> Vec<&'a str> {
        if self.config.question_bias && confidence < HIGH_CONFIDENCE {
            let questions: Vec<&str> = responses
                .iter()
                .filter(|r| r.contains('?'))
                .map(String::as_str)
                .collect();
            if !questions.is_empty() {
                return questions;
            }
        }
        responses.iter().map(String::as_str).collect()
    }

    /// Intents ranked the way `classify` weighs them: by best pattern score,
    /// or under the statistical strategy by model share after any typed hit.
    pub fn rank(&self, utterance: &str) -> Vec<MatchResult> {
        let snapshot = self.snapshot();
        let normalized = self.normalizer.normalize(utterance);
        match (self.config.strategy, &snapshot.model) {
            (Strategy::Statistical(_), Some(model)) => {
                let typed = statistical::typed_match(&normalized, &snapshot.intents);
                let mut ranked: Vec<MatchResult> = typed.iter().cloned().collect();
                ranked.extend(
                    model
                        .rank(&normalized)
                        .into_iter()
                        .filter(|m| typed.as_ref().is_none_or(|t| t.intent_name != m.intent_name)),
                );
                ranked
            }
            _ => matcher::rank_intents(
                &normalized,
                &snapshot.intents,
                self.config.strategy.pattern_scorer(),
            ),
        }
    }

    /// Per-pattern scores for every intent. These are pattern-level scores
    /// even under the statistical strategy; `rank` shows the model's view.
    pub fn debug_match(&self, utterance: &str) -> Vec<IntentDiagnostics> {
        let normalized = self.normalizer.normalize(utterance);
        matcher::diagnose(
            &normalized,
            &self.snapshot().intents,
            self.config.strategy.pattern_scorer(),
        )
    }

    pub fn warnings(&self) -> Vec<PatternWarning> {
        self.snapshot().warnings.clone()
    }

    pub fn info(&self) -> VocabularyInfo {
        let snapshot = self.snapshot();
        VocabularyInfo {
            intents: snapshot.vocabulary.len(),
            patterns: snapshot.intents.iter().map(|i| i.patterns.len()).sum(),
            invalid_patterns: snapshot.warnings.len(),
            overlays: snapshot.overlays.clone(),
        }
    }
}
