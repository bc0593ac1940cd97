//! # Droste Placement
//!
//! Turns the analysis model's free-form answer into a validated [`Placement`].
//!
//! Model output is unreliable: JSON wrapped in narration, spurious spacing
//! around punctuation, or every character separated by a space. Extraction is
//! an ordered list of pure strategies (see [`STRATEGIES`]); the first one that
//! yields a complete, in-range record wins, otherwise the result is `None`.
//!
//! [`Placement`]: droste_protocol::Placement

mod error;
mod extractor;
pub mod normalize;
mod validate;

pub use error::{ExtractionError, Result};
pub use extractor::{extract, extract_detailed, Extraction, Strategy, STRATEGIES};
pub use validate::{placement_from_document, CONFIDENCE_RANGE, PERCENT_RANGE};
