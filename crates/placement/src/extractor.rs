use crate::error::{ExtractionError, Result};
use crate::normalize::{compact_json_whitespace, deinterleave, json_span, strip_all_whitespace};
use crate::validate::placement_from_document;
use droste_protocol::Placement;
use serde::Serialize;
use serde_json::Value;

/// One text-to-placement attempt. Strategies are pure and independent; the
/// extractor runs them in order until one succeeds.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&str) -> Result<Placement>,
}

/// Ordered fallback chain.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "verbatim_span",
        run: verbatim_span,
    },
    Strategy {
        name: "compacted_span",
        run: compacted_span,
    },
    Strategy {
        name: "deinterleaved",
        run: deinterleaved,
    },
    Strategy {
        name: "whitespace_stripped",
        run: whitespace_stripped,
    },
];

/// Successful extraction and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub placement: Placement,
    pub strategy: &'static str,
}

/// Recover a placement from free-form analysis output, `None` when no
/// strategy yields a complete, in-range record.
pub fn extract(raw: &str) -> Option<Placement> {
    match extract_detailed(raw) {
        Ok(extraction) => Some(extraction.placement),
        Err(err) => {
            log::debug!("No placement extracted: {err}");
            None
        }
    }
}

pub fn extract_detailed(raw: &str) -> Result<Extraction> {
    let mut last = ExtractionError::NoJsonSpan;
    for strategy in STRATEGIES {
        match (strategy.run)(raw) {
            Ok(placement) => {
                log::debug!("Placement extracted by {}", strategy.name);
                return Ok(Extraction {
                    placement,
                    strategy: strategy.name,
                });
            }
            Err(err) => {
                log::trace!("Strategy {} failed: {err}", strategy.name);
                last = err;
            }
        }
    }
    Err(ExtractionError::Exhausted(Box::new(last)))
}

fn parse(text: &str) -> Result<Placement> {
    let document: Value = serde_json::from_str(text)?;
    placement_from_document(&document)
}

fn parse_span(text: &str) -> Result<Placement> {
    let span = json_span(text).ok_or(ExtractionError::NoJsonSpan)?;
    parse(span)
}

/// Well-formed JSON wrapped in narration or code fences.
fn verbatim_span(raw: &str) -> Result<Placement> {
    parse_span(raw)
}

/// Spurious spacing around JSON punctuation.
fn compacted_span(raw: &str) -> Result<Placement> {
    parse_span(&compact_json_whitespace(raw))
}

/// Every character followed by a space.
fn deinterleaved(raw: &str) -> Result<Placement> {
    let text = deinterleave(raw).ok_or(ExtractionError::NoJsonSpan)?;
    parse_span(&text)
}

/// Last resort: drop all whitespace, including inside strings.
fn whitespace_stripped(raw: &str) -> Result<Placement> {
    let stripped = strip_all_whitespace(raw);
    parse(&stripped).or_else(|_| parse_span(&stripped))
}
