//! Python bindings for the responder using PyO3

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::{ResponderConfig, Strategy};
use crate::engine::Responder;
use crate::error::ResponderError;
use crate::locale::LocaleProfile;
use crate::normalize::Normalizer;
use crate::pattern::CompiledPattern;
use crate::types::Vocabulary;

fn to_py_err(err: ResponderError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn english() -> PyResult<Normalizer> {
    Normalizer::new(LocaleProfile::english()).map_err(to_py_err)
}

/// Normalize text with the English profile (Python function)
#[pyfunction]
pub fn py_normalize(text: &str) -> PyResult<String> {
    Ok(english()?.normalize_text(text))
}

/// Score one utterance against one raw pattern with the sequence scorer
#[pyfunction]
pub fn py_score(utterance: &str, pattern: &str) -> PyResult<f64> {
    let normalizer = english()?;
    let compiled = CompiledPattern::compile(pattern, &normalizer);
    let scorer = Strategy::Sequence.pattern_scorer();
    Ok(scorer.score(&normalizer.normalize(utterance), &compiled))
}

/// Python wrapper for the responder engine
#[pyclass(name = "Responder")]
pub struct PyResponder {
    inner: Responder,
}

#[pymethods]
impl PyResponder {
    #[new]
    #[pyo3(signature = (locale = "en", strategy = "sequence", question_bias = false))]
    fn new(locale: &str, strategy: &str, question_bias: bool) -> PyResult<Self> {
        let strategy: Strategy = strategy.parse().map_err(to_py_err)?;
        let mut config = ResponderConfig::for_locale(locale, strategy).map_err(to_py_err)?;
        config.question_bias = question_bias;
        Ok(Self {
            inner: Responder::new(config).map_err(to_py_err)?,
        })
    }

    /// Replace the vocabulary from a JSON document
    fn load_json(&self, json: &str) -> PyResult<()> {
        self.inner.load_json(json).map_err(to_py_err)
    }

    /// Merge an overlay vocabulary at the given priority
    fn apply_overlay_json(&self, name: &str, json: &str, priority: i64) -> PyResult<()> {
        let overlay = Vocabulary::from_json(json).map_err(to_py_err)?;
        self.inner.apply_overlay(name, &overlay, priority);
        Ok(())
    }

    fn generate_response(&self, utterance: &str) -> String {
        self.inner.generate_response(utterance)
    }

    /// Match user input; returns None when the fallback path would be taken
    fn classify<'py>(
        &self,
        utterance: &str,
        py: Python<'py>,
    ) -> PyResult<Option<Bound<'py, PyDict>>> {
        let Some(m) = self.inner.classify(utterance) else {
            return Ok(None);
        };
        let dict = PyDict::new_bound(py);
        dict.set_item("intent_name", m.intent_name)?;
        dict.set_item("confidence", m.confidence)?;
        dict.set_item("matched_pattern", m.matched_pattern)?;
        Ok(Some(dict))
    }

    /// Per-pattern diagnostics as a JSON string
    fn debug_match(&self, utterance: &str) -> PyResult<String> {
        serde_json::to_string(&self.inner.debug_match(utterance))
            .map_err(|e| PyValueError::new_err(format!("Failed to serialize diagnostics: {}", e)))
    }

    /// Number of intents in the installed vocabulary
    fn len(&self) -> usize {
        self.inner.info().intents
    }
}
