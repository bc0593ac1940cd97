use droste_placement::{extract, extract_detailed};
use droste_protocol::Placement;
use pretty_assertions::assert_eq;
use serde_json::json;

fn samples() -> Vec<Placement> {
    vec![
        Placement {
            x: 0.0,
            y: 100.0,
            width: 33.333333333333336,
            height: 0.1,
            center_x: 16.666666666666668,
            center_y: 99.95,
            description: "small framed poster, lower left: above the sofa".into(),
            confidence: 0.87,
        },
        Placement {
            x: 41.2,
            y: 7.75,
            width: 18.0,
            height: 22.5,
            center_x: 50.2,
            center_y: 19.0,
            description: String::new(),
            confidence: 1.0,
        },
    ]
}

fn document(placement: &Placement) -> String {
    json!({ "placement": placement }).to_string()
}

fn pretty_document(placement: &Placement) -> String {
    serde_json::to_string_pretty(&json!({ "placement": placement })).expect("json")
}

fn interleave(text: &str, separator: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        out.push_str(separator);
    }
    out
}

#[test]
fn valid_documents_round_trip_exactly() {
    for placement in samples() {
        assert_eq!(extract(&document(&placement)), Some(placement.clone()));
        assert_eq!(extract(&pretty_document(&placement)), Some(placement));
    }
}

#[test]
fn single_space_between_every_character_recovers_same_placement() {
    for placement in samples() {
        let degenerate = interleave(&pretty_document(&placement), " ");
        let extraction = extract_detailed(&degenerate).expect("extract");
        assert_eq!(extraction.placement, placement);
    }
}

#[test]
fn irregular_spacing_recovers_numbers_and_spaceless_descriptions() {
    let placement = Placement {
        description: "upper-left".into(),
        ..samples().remove(1)
    };
    let text = document(&placement);
    let mut degenerate = String::new();
    for (i, c) in text.chars().enumerate() {
        degenerate.push(c);
        degenerate.push_str(match i % 3 {
            0 => " ",
            1 => "  \n",
            _ => "\t",
        });
    }

    assert_eq!(extract(&degenerate), Some(placement));
}

#[test]
fn narration_around_spaced_json_is_tolerated() {
    let placement = samples().remove(0);
    let raw = format!(
        "I compared both images.\n\n{}\n\nThe poster sits above the sofa.",
        pretty_document(&placement)
    );
    assert_eq!(extract(&raw), Some(placement));
}

#[test]
fn prose_never_produces_a_placement() {
    for raw in [
        "The inserted image appears in the upper left corner of the scene.",
        "I'm unable to locate the first image within the second one.",
        "{ not json at all }",
        "[1, 2, 3]",
        r#"{"result": "no placement"}"#,
    ] {
        assert_eq!(extract(raw), None, "input: {raw}");
    }
}
