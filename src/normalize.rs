//! Text normalization and tokenization
//!
//! Turns raw text into the canonical form every scorer compares against:
//! lower-case, optionally accent-free, punctuation replaced by spaces,
//! whitespace collapsed and contractions expanded.

use std::sync::LazyLock;

use ahash::{AHashMap, AHashSet};
use regex::{Captures, Regex};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::locale::LocaleProfile;
use crate::types::NormalizedUtterance;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s'-]").expect("Invalid regex: non-word class"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Kana and CJK ideographs, which whitespace segmentation cannot split.
pub fn is_logographic(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}')
}

/// Locale-aware normalizer. Pure: holds only lookup tables built from the
/// profile, never state that changes between calls.
#[derive(Debug, Clone)]
pub struct Normalizer {
    profile: LocaleProfile,
    stop_words: AHashSet<String>,
    keep_words: AHashSet<String>,
    contractions: AHashMap<String, String>,
    contraction_re: Option<Regex>,
}

impl Normalizer {
    pub fn new(profile: LocaleProfile) -> Result<Self> {
        let fold = |s: &str| fold_case(s, profile.strip_accents);

        let stop_words = profile.stop_words.iter().map(|w| fold(w)).collect();
        let keep_words = profile.keep_words.iter().map(|w| fold(w)).collect();
        let contractions: AHashMap<String, String> = profile
            .contractions
            .iter()
            .map(|(from, to)| (fold(from), fold(to)))
            .collect();

        let contraction_re = if contractions.is_empty() {
            None
        } else {
            // Longest first so that alternation prefers "can't" over "can".
            let mut keys: Vec<&String> = contractions.keys().collect();
            keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"\b(?:{alternation})\b"))?)
        };

        Ok(Self {
            profile,
            stop_words,
            keep_words,
            contractions,
            contraction_re,
        })
    }

    pub fn profile(&self) -> &LocaleProfile {
        &self.profile
    }

    /// Canonical text only, without tokenization.
    pub fn normalize_text(&self, text: &str) -> String {
        let folded = fold_case(text, self.profile.strip_accents);
        let cleaned = NON_WORD.replace_all(&folded, " ");
        let collapsed = WHITESPACE.replace_all(&cleaned, " ");
        let trimmed = collapsed.trim();

        match &self.contraction_re {
            Some(re) => {
                let expanded = re.replace_all(trimmed, |caps: &Captures| {
                    self.contractions
                        .get(&caps[0])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                });
                WHITESPACE.replace_all(expanded.trim(), " ").into_owned()
            }
            None => trimmed.to_string(),
        }
    }

    pub fn normalize(&self, text: &str) -> NormalizedUtterance {
        let normalized = self.normalize_text(text);
        let tokens: Vec<String> = normalized
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let keywords = self.keywords(&tokens);

        NormalizedUtterance {
            original: text.to_string(),
            normalized,
            tokens,
            keywords,
        }
    }

    /// Filter tokens down to the ones keyword-based scorers care about.
    pub fn keywords(&self, tokens: &[String]) -> Vec<String> {
        let mut keywords = Vec::with_capacity(tokens.len());

        for token in tokens {
            if self.keep_words.contains(token) {
                keywords.push(token.clone());
            } else if !self.stop_words.contains(token)
                && token.chars().count() >= self.profile.min_token_len
            {
                keywords.push(self.stem(token));
            }

            if self.profile.segment_logographic {
                for c in token.chars().filter(|c| is_logographic(*c)) {
                    let single = c.to_string();
                    if !self.stop_words.contains(&single) && single != *token {
                        keywords.push(single);
                    }
                }
            }
        }

        keywords
    }

    fn stem(&self, token: &str) -> String {
        let len = token.chars().count();
        for suffix in &self.profile.suffixes {
            if token.ends_with(suffix.as_str()) && len >= suffix.chars().count() + 2 {
                return token[..token.len() - suffix.len()].to_string();
            }
        }
        token.to_string()
    }
}

fn fold_case(text: &str, strip_accents: bool) -> String {
    let lower = text.to_lowercase();
    if strip_accents {
        lower.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> Normalizer {
        Normalizer::new(LocaleProfile::english()).unwrap()
    }

    #[test]
    fn test_punctuation_and_whitespace() {
        let n = english();
        assert_eq!(n.normalize_text("  Hello,   THERE!!  "), "hello there");
        assert_eq!(n.normalize_text("well-known o'clock"), "well-known o'clock");
    }

    #[test]
    fn test_accents_stripped() {
        let n = english();
        assert_eq!(n.normalize_text("Café Crème"), "cafe creme");
    }

    #[test]
    fn test_contractions_expanded() {
        let n = english();
        assert_eq!(n.normalize_text("I'm sure you can't"), "i am sure you cannot");
        // Only whole words are replaced.
        assert_eq!(n.normalize_text("scan't"), "scan't");
    }

    #[test]
    fn test_french_contractions() {
        let n = Normalizer::new(LocaleProfile::french()).unwrap();
        assert_eq!(n.normalize_text("C'est génial"), "ce est genial");
    }

    #[test]
    fn test_normalization_idempotent() {
        let n = english();
        for input in [
            "Hello, World!",
            "I'm   SO happy -- it's great!!",
            "Ça va? Très bien.",
            "   ",
            "don't stop_believing 42",
        ] {
            let once = n.normalize(input);
            let twice = n.normalize(&once.normalized);
            assert_eq!(once.normalized, twice.normalized, "input: {input}");
            assert_eq!(once.tokens, twice.tokens, "input: {input}");
            assert_eq!(once.keywords, twice.keywords, "input: {input}");
        }
    }

    #[test]
    fn test_keywords_filter_and_stem() {
        let n = english();
        let u = n.normalize("Hi, the cats are playing");
        assert_eq!(u.tokens, vec!["hi", "the", "cats", "are", "playing"]);
        // "hi" survives through keep-words despite its length.
        assert_eq!(u.keywords, vec!["hi", "cat", "play"]);
    }

    #[test]
    fn test_logographic_segmentation() {
        let n = Normalizer::new(LocaleProfile::chinese()).unwrap();
        let u = n.normalize("你好的世界");
        assert_eq!(u.tokens, vec!["你好的世界"]);
        // Whole token (stem strips nothing: it does not end in 的), then
        // every character except the stop-listed 的.
        assert_eq!(u.keywords, vec!["你好的世界", "你", "好", "世", "界"]);
    }

    #[test]
    fn test_empty_input() {
        let n = english();
        let u = n.normalize("?!...");
        assert!(u.is_empty());
        assert!(u.normalized.is_empty());
    }
}
