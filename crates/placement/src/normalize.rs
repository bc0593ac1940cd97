//! Pure text transforms applied to analysis-model output before parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static AROUND_STRUCTURAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([{}\[\]:,])\s*").expect("valid regex"));

static SPACED_QUOTE_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r#""\s+""#).expect("valid regex"));

/// Collapse whitespace runs and drop whitespace around JSON structural characters.
pub fn compact_json_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let quotes = SPACED_QUOTE_PAIR.replace_all(&collapsed, "\"\"");
    AROUND_STRUCTURAL
        .replace_all(&quotes, "$1")
        .trim()
        .to_string()
}

/// First `{` through last `}`.
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn strip_all_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Undo "every character followed by a space" output: when every odd position
/// of the trimmed text is whitespace, keep only the even positions.
pub fn deinterleave(text: &str) -> Option<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.len() < 3 {
        return None;
    }
    let interleaved = chars
        .iter()
        .skip(1)
        .step_by(2)
        .all(|c| c.is_whitespace());
    if !interleaved {
        return None;
    }
    Some(chars.iter().step_by(2).collect())
}
