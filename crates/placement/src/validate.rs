use crate::error::{ExtractionError, Result};
use droste_protocol::Placement;
use serde_json::Value;

pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);
pub const CONFIDENCE_RANGE: (f64, f64) = (0.0, 1.0);

/// Build a [`Placement`] from a parsed `{ "placement": { ... } }` document.
///
/// Missing, non-numeric or out-of-range fields fail the whole record; values
/// are never clamped.
pub fn placement_from_document(document: &Value) -> Result<Placement> {
    let record = document
        .get("placement")
        .filter(|value| value.is_object())
        .ok_or(ExtractionError::MissingPlacement)?;

    let placement = Placement {
        x: percent(record, "x")?,
        y: percent(record, "y")?,
        width: percent(record, "width")?,
        height: percent(record, "height")?,
        center_x: percent(record, "centerX")?,
        center_y: percent(record, "centerY")?,
        description: description(record),
        confidence: bounded(record, "confidence", CONFIDENCE_RANGE)?,
    };
    Ok(placement)
}

fn percent(record: &Value, field: &'static str) -> Result<f64> {
    bounded(record, field, PERCENT_RANGE)
}

fn bounded(record: &Value, field: &'static str, (min, max): (f64, f64)) -> Result<f64> {
    let value = record
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(ExtractionError::MissingField(field))?;
    if !value.is_finite() || value < min || value > max {
        return Err(ExtractionError::OutOfRange { field, value });
    }
    Ok(value)
}

fn description(record: &Value) -> String {
    match record.get("description") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "placement": {
                "x": 12.5, "y": 30, "width": 25, "height": 20,
                "centerX": 25, "centerY": 40,
                "description": "poster on the left wall", "confidence": 0.75
            }
        })
    }

    #[test]
    fn accepts_complete_record() {
        let placement = placement_from_document(&document()).expect("valid");
        assert_eq!(placement.x, 12.5);
        assert_eq!(placement.center_y, 40.0);
        assert_eq!(placement.description, "poster on the left wall");
    }

    #[test]
    fn rejects_out_of_range_instead_of_clamping() {
        let mut doc = document();
        doc["placement"]["width"] = json!(140);
        assert!(matches!(
            placement_from_document(&doc),
            Err(ExtractionError::OutOfRange { field: "width", .. })
        ));

        let mut doc = document();
        doc["placement"]["confidence"] = json!(1.5);
        assert!(placement_from_document(&doc).is_err());

        let mut doc = document();
        doc["placement"]["x"] = json!(-0.1);
        assert!(placement_from_document(&doc).is_err());
    }

    #[test]
    fn rejects_missing_or_textual_numbers() {
        let mut doc = document();
        doc["placement"].as_object_mut().unwrap().remove("centerX");
        assert!(matches!(
            placement_from_document(&doc),
            Err(ExtractionError::MissingField("centerX"))
        ));

        let mut doc = document();
        doc["placement"]["y"] = json!("30");
        assert!(placement_from_document(&doc).is_err());
    }

    #[test]
    fn requires_nested_placement_record() {
        let flat = document()["placement"].clone();
        assert!(matches!(
            placement_from_document(&flat),
            Err(ExtractionError::MissingPlacement)
        ));
        assert!(placement_from_document(&json!({ "placement": null })).is_err());
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let mut doc = document();
        doc["placement"].as_object_mut().unwrap().remove("description");
        assert_eq!(placement_from_document(&doc).unwrap().description, "");
    }
}
