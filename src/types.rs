//! Core data types for vocabularies and classification results

use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{ResponderError, Result};

/// Name of the intent whose responses double as the fallback set.
pub const DEFAULT_INTENT: &str = "default";

/// A named category of user meaning with example patterns and candidate responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
    #[serde(default)]
    pub priority: i64,
}

impl Intent {
    pub fn new(name: impl Into<String>, patterns: Vec<String>, responses: Vec<String>) -> Self {
        Self {
            name: name.into(),
            patterns,
            responses,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// The `default` intent carries fallback responses and may omit patterns.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_INTENT
    }

    fn validate(&self, index: usize) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ResponderError::MalformedVocabulary(format!(
                "intent #{index} has an empty name"
            )));
        }
        if self.patterns.is_empty() && !self.is_default() {
            return Err(ResponderError::MalformedVocabulary(format!(
                "intent '{}' has no patterns",
                self.name
            )));
        }
        if self.responses.is_empty() {
            return Err(ResponderError::MalformedVocabulary(format!(
                "intent '{}' has no responses",
                self.name
            )));
        }
        if self.patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ResponderError::MalformedVocabulary(format!(
                "intent '{}' has an empty pattern",
                self.name
            )));
        }
        if self.responses.iter().any(|r| r.trim().is_empty()) {
            return Err(ResponderError::MalformedVocabulary(format!(
                "intent '{}' has an empty response",
                self.name
            )));
        }
        Ok(())
    }
}

/// Wire shape of a vocabulary document. Every field is optional so that
/// structural problems surface as `MalformedVocabulary` rather than as a
/// bare serde message.
#[derive(Debug, Deserialize)]
struct RawVocabulary {
    intents: Option<Vec<RawIntent>>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    name: Option<String>,
    patterns: Option<Vec<String>>,
    responses: Option<Vec<String>>,
    priority: Option<i64>,
}

/// Ordered, validated collection of intents with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    intents: Vec<Intent>,
}

impl Vocabulary {
    /// Validate and wrap a list of intents.
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        let mut seen = AHashSet::with_capacity(intents.len());
        for (index, intent) in intents.iter().enumerate() {
            intent.validate(index)?;
            if !seen.insert(intent.name.as_str()) {
                return Err(ResponderError::DuplicateIntent(intent.name.clone()));
            }
        }
        Ok(Self { intents })
    }

    /// Parse a `{ "intents": [...] }` document. Nothing is returned unless the
    /// whole document is valid.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawVocabulary = serde_json::from_str(json)?;
        let raw_intents = raw.intents.ok_or_else(|| {
            ResponderError::MalformedVocabulary("missing intents array".to_string())
        })?;

        let mut intents = Vec::with_capacity(raw_intents.len());
        for (index, raw_intent) in raw_intents.into_iter().enumerate() {
            let name = raw_intent.name.ok_or_else(|| {
                ResponderError::MalformedVocabulary(format!("intent #{index} is missing a name"))
            })?;
            let patterns = match raw_intent.patterns {
                Some(patterns) => patterns,
                None if name == DEFAULT_INTENT => Vec::new(),
                None => {
                    return Err(ResponderError::MalformedVocabulary(format!(
                        "intent '{name}' is missing patterns"
                    )))
                }
            };
            let responses = raw_intent.responses.ok_or_else(|| {
                ResponderError::MalformedVocabulary(format!("intent '{name}' is missing responses"))
            })?;
            intents.push(Intent {
                name,
                patterns,
                responses,
                priority: raw_intent.priority.unwrap_or(0),
            });
        }

        Self::new(intents)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn intent(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn pattern_count(&self) -> usize {
        self.intents.iter().map(|i| i.patterns.len()).sum()
    }

    /// Responses of the `default` intent, if the vocabulary defines one.
    pub fn default_responses(&self) -> Option<&[String]> {
        self.intent(DEFAULT_INTENT).map(|i| i.responses.as_slice())
    }

    /// Builds without re-validating; callers guarantee the invariants.
    pub(crate) fn from_validated(intents: Vec<Intent>) -> Self {
        Self { intents }
    }
}

/// Canonical form of one utterance or pattern body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUtterance {
    pub original: String,
    pub normalized: String,
    /// Whitespace-segmented words of `normalized`.
    pub tokens: Vec<String>,
    /// Stop-word filtered, stemmed tokens plus per-character tokens for
    /// logographic scripts.
    pub keywords: Vec<String>,
}

impl NormalizedUtterance {
    /// No word tokens. Typed patterns may still match the raw text.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Nothing but whitespace in the raw text; no pattern can match.
    pub fn is_blank(&self) -> bool {
        self.original.trim().is_empty()
    }
}

/// Represents a matched intent with confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub intent_name: String,
    pub confidence: f64,
    pub matched_pattern: Option<String>,
}

impl MatchResult {
    pub fn new(intent_name: String, confidence: f64, matched_pattern: Option<String>) -> Self {
        Self {
            intent_name,
            confidence,
            matched_pattern,
        }
    }
}

/// Score of a single pattern against an utterance, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct PatternDiagnostics {
    pub pattern: String,
    pub kind: String,
    pub score: f64,
    pub matched_tokens: Vec<String>,
}

/// Per-intent breakdown produced by `Responder::debug_match`
#[derive(Debug, Clone, Serialize)]
pub struct IntentDiagnostics {
    pub intent: String,
    pub priority: i64,
    pub patterns: Vec<PatternDiagnostics>,
}

/// Summary of the currently installed vocabulary
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyInfo {
    pub intents: usize,
    pub patterns: usize,
    pub invalid_patterns: usize,
    pub overlays: Vec<String>,
}
