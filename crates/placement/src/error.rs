use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Why one extraction strategy could not produce a placement
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No `{ ... }` span in the text
    #[error("No JSON object found in model output")]
    NoJsonSpan,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed object has no nested `placement` record
    #[error("Parsed object has no placement record")]
    MissingPlacement,

    #[error("Placement field missing or not a number: {0}")]
    MissingField(&'static str),

    #[error("Placement field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// Every strategy failed; holds the last failure
    #[error("All extraction strategies failed (last: {0})")]
    Exhausted(Box<ExtractionError>),
}
