//! Pattern compilation
//!
//! A raw pattern string may carry a `kind:` prefix selecting how it matches.
//! Without a recognised prefix the whole string is a similarity pattern.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::normalize::Normalizer;
use crate::types::NormalizedUtterance;

/// Upper bound on compiled regex size for user-supplied patterns.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// How a compiled pattern is tested against an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Token-overlap scoring (the default)
    Similarity,
    /// Whole utterance equals the pattern, case preserved
    ExactCaseSensitive,
    /// Pattern occurs as a whole phrase, case preserved
    ExactPhraseCaseSensitive,
    /// Whole utterance equals the pattern, ignoring case
    ExactCaseInsensitive,
    /// Pattern occurs as a whole phrase, ignoring case
    PhraseCaseInsensitive,
    SubstringCaseSensitive,
    SubstringCaseInsensitive,
    Regex,
    RegexCaseInsensitive,
    /// A pattern that failed to compile; never matches
    Invalid,
}

impl MatchKind {
    /// Parse a pattern prefix (without the colon).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sim" | "similarity" => Some(MatchKind::Similarity),
            "exact" => Some(MatchKind::ExactCaseSensitive),
            "phrase" => Some(MatchKind::ExactPhraseCaseSensitive),
            "iexact" => Some(MatchKind::ExactCaseInsensitive),
            "iphrase" => Some(MatchKind::PhraseCaseInsensitive),
            "contains" => Some(MatchKind::SubstringCaseSensitive),
            "icontains" => Some(MatchKind::SubstringCaseInsensitive),
            "regex" => Some(MatchKind::Regex),
            "iregex" => Some(MatchKind::RegexCaseInsensitive),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Similarity => "similarity",
            MatchKind::ExactCaseSensitive => "exact",
            MatchKind::ExactPhraseCaseSensitive => "phrase",
            MatchKind::ExactCaseInsensitive => "iexact",
            MatchKind::PhraseCaseInsensitive => "iphrase",
            MatchKind::SubstringCaseSensitive => "contains",
            MatchKind::SubstringCaseInsensitive => "icontains",
            MatchKind::Regex => "regex",
            MatchKind::RegexCaseInsensitive => "iregex",
            MatchKind::Invalid => "invalid",
        }
    }

    fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            MatchKind::ExactCaseInsensitive
                | MatchKind::PhraseCaseInsensitive
                | MatchKind::SubstringCaseInsensitive
                | MatchKind::RegexCaseInsensitive
        )
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A pattern pre-processed for scoring. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub original: String,
    pub kind: MatchKind,
    /// Pattern text after the prefix; lower-cased for case-insensitive kinds.
    pub literal: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub keywords: Vec<String>,
    matcher: Option<Regex>,
    loose_order: Option<Regex>,
    error: Option<String>,
}

impl CompiledPattern {
    /// Compile one raw pattern. Never fails: a broken pattern becomes
    /// `MatchKind::Invalid` and reports its reason through `error()`.
    pub fn compile(raw: &str, normalizer: &Normalizer) -> Self {
        let (kind, body) = split_prefix(raw);
        let body = body.trim();
        let normalized = normalizer.normalize(body);

        let mut compiled = Self {
            original: raw.to_string(),
            kind,
            literal: if kind.is_case_insensitive() {
                body.to_lowercase()
            } else {
                body.to_string()
            },
            normalized: normalized.normalized,
            tokens: normalized.tokens,
            keywords: normalized.keywords,
            matcher: None,
            loose_order: None,
            error: None,
        };

        if body.is_empty() {
            return compiled.invalidate("empty pattern body".to_string());
        }

        match kind {
            MatchKind::Regex | MatchKind::RegexCaseInsensitive => {
                let built = RegexBuilder::new(body)
                    .case_insensitive(kind == MatchKind::RegexCaseInsensitive)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build();
                match built {
                    Ok(re) => compiled.matcher = Some(re),
                    Err(e) => return compiled.invalidate(e.to_string()),
                }
            }
            MatchKind::Similarity if !compiled.tokens.is_empty() => {
                let escaped: Vec<String> =
                    compiled.tokens.iter().map(|t| regex::escape(t)).collect();
                compiled.loose_order = Regex::new(&escaped.join(".*")).ok();
            }
            _ => {}
        }

        compiled
    }

    fn invalidate(mut self, reason: String) -> Self {
        self.kind = MatchKind::Invalid;
        self.matcher = None;
        self.error = Some(reason);
        self
    }

    /// Why the pattern is unusable, if it is.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_similarity(&self) -> bool {
        self.kind == MatchKind::Similarity
    }

    /// All pattern tokens appear in the normalized utterance in order,
    /// possibly with other text between them.
    pub fn matches_in_order(&self, normalized: &str) -> bool {
        self.loose_order
            .as_ref()
            .is_some_and(|re| re.is_match(normalized))
    }

    /// Binary outcome for typed kinds; `None` for similarity patterns.
    pub fn typed_match(&self, utterance: &NormalizedUtterance) -> Option<bool> {
        let original = utterance.original.trim();
        let matched = match self.kind {
            MatchKind::Similarity => return None,
            MatchKind::Invalid => false,
            MatchKind::ExactCaseSensitive => original == self.literal,
            MatchKind::ExactCaseInsensitive => original.to_lowercase() == self.literal,
            MatchKind::ExactPhraseCaseSensitive => contains_phrase(original, &self.literal),
            MatchKind::PhraseCaseInsensitive => {
                contains_phrase(&original.to_lowercase(), &self.literal)
            }
            MatchKind::SubstringCaseSensitive => original.contains(self.literal.as_str()),
            MatchKind::SubstringCaseInsensitive => {
                original.to_lowercase().contains(self.literal.as_str())
            }
            MatchKind::Regex | MatchKind::RegexCaseInsensitive => self
                .matcher
                .as_ref()
                .is_some_and(|re| re.is_match(original)),
        };
        Some(matched)
    }
}

/// Split off a recognised `kind:` prefix. Unknown prefixes stay part of the
/// literal text.
fn split_prefix(raw: &str) -> (MatchKind, &str) {
    if let Some((prefix, rest)) = raw.split_once(':') {
        if let Some(kind) = MatchKind::from_prefix(&prefix.trim().to_ascii_lowercase()) {
            return (kind, rest);
        }
    }
    (MatchKind::Similarity, raw)
}

/// `needle` occurs in `haystack` with no alphanumeric character touching
/// either end.
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        before.is_none_or(|c| !c.is_alphanumeric()) && after.is_none_or(|c| !c.is_alphanumeric())
    })
}
