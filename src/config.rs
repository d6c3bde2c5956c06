//! Engine configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ResponderError, Result};
use crate::locale::LocaleProfile;
use crate::similarity::{OverlapScorer, PatternScorer, SequenceScorer};

/// Term weighting used by the statistical classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// `ln(1 + tf * idf) * ln(1 + idf)` per utterance token
    #[default]
    TfIdf,
    /// Laplace-smoothed multinomial log-likelihood
    NaiveBayes,
}

/// Which scoring algorithm resolves intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Keyword coverage per pattern
    Overlap,
    /// Token overlap with order refinement and regex floor per pattern
    #[default]
    Sequence,
    /// Whole-intent statistical model
    Statistical(Weighting),
}

impl Strategy {
    /// Scorer used for pattern-level matching. The statistical strategy still
    /// relies on it for typed patterns, which are binary either way.
    pub fn pattern_scorer(&self) -> &'static dyn PatternScorer {
        match self {
            Strategy::Overlap => &OverlapScorer,
            Strategy::Sequence | Strategy::Statistical(_) => &SequenceScorer,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Overlap => "overlap",
            Strategy::Sequence => "sequence",
            Strategy::Statistical(Weighting::TfIdf) => "tfidf",
            Strategy::Statistical(Weighting::NaiveBayes) => "bayes",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Strategy {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overlap" => Ok(Strategy::Overlap),
            "sequence" => Ok(Strategy::Sequence),
            "tfidf" | "statistical" => Ok(Strategy::Statistical(Weighting::TfIdf)),
            "bayes" | "naive_bayes" => Ok(Strategy::Statistical(Weighting::NaiveBayes)),
            other => Err(ResponderError::Config(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Everything a `Responder` needs besides its vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub locale: LocaleProfile,
    pub strategy: Strategy,
    /// Below `HIGH_CONFIDENCE`, prefer responses that ask a question.
    pub question_bias: bool,
}

impl ResponderConfig {
    pub fn new(locale: LocaleProfile, strategy: Strategy) -> Self {
        Self {
            locale,
            strategy,
            question_bias: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Built-in locale by name with the given strategy.
    pub fn for_locale(name: &str, strategy: Strategy) -> Result<Self> {
        let locale = LocaleProfile::builtin(name)
            .ok_or_else(|| ResponderError::Config(format!("unknown locale '{name}'")))?;
        Ok(Self::new(locale, strategy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Overlap".parse::<Strategy>().unwrap(), Strategy::Overlap);
        assert_eq!(
            "bayes".parse::<Strategy>().unwrap(),
            Strategy::Statistical(Weighting::NaiveBayes)
        );
        assert!("magic".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = ResponderConfig::from_json(
            r#"{"strategy":{"statistical":"naive_bayes"},"question_bias":true}"#,
        )
        .unwrap();
        assert_eq!(config.strategy, Strategy::Statistical(Weighting::NaiveBayes));
        assert!(config.question_bias);
        assert_eq!(config.locale.name, "en");
    }

    #[test]
    fn test_unknown_locale() {
        assert!(ResponderConfig::for_locale("xx", Strategy::Sequence).is_err());
        let config = ResponderConfig::for_locale("fr", Strategy::Overlap).unwrap();
        assert_eq!(config.locale.name, "fr");
    }
}
