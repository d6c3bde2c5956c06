use std::io;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading vocabularies or building an engine.
///
/// Per-utterance scoring never produces one of these: every failure on the
/// query path resolves to a fallback response instead.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// Structural validation failure; the document is rejected as a whole.
    #[error("Malformed vocabulary: {0}")]
    MalformedVocabulary(String),

    /// Two intents in one document share a name.
    #[error("Duplicate intent name: {0}")]
    DuplicateIntent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid engine or locale configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ResponderError>;

/// A pattern that compiled to an always-failing matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternWarning {
    pub intent: String,
    pub pattern: String,
    pub reason: String,
}
