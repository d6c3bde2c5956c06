//! Responder core - pattern-based intent classification for persona chat bots
//!
//! Normalizes user utterances, matches them against a vocabulary of intents
//! (typed patterns, token-overlap scoring or a statistical model), merges
//! special-occasion overlays by priority and picks a response.

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod locale;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod pattern;
pub mod similarity;
pub mod statistical;
pub mod types;

pub use calendar::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use locale::*;
pub use matcher::*;
pub use merge::*;
pub use normalize::*;
pub use pattern::*;
pub use similarity::*;
pub use statistical::*;
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn responder_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyResponder>()?;
    m.add_function(wrap_pyfunction!(py_normalize, m)?)?;
    m.add_function(wrap_pyfunction!(py_score, m)?)?;
    Ok(())
}
