use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use otu_dash::document::{Document, DocumentSource};
use otu_dash::domain::SubjectId;
use otu_dash::error::DashError;
use otu_dash::output::JsonRenderer;
use otu_dash::render::{RenderOptions, metadata_lines, present, render};
use otu_dash::selector::find_metadata;

fn fixture() -> Document {
    let path = Utf8PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/samples.json"
    ));
    Document::load(&DocumentSource::Path(path), true).unwrap()
}

#[test]
fn metadata_lines_are_capitalized_in_order() {
    let document = fixture();
    let record = find_metadata(&document, &SubjectId::from_integer(1601)).unwrap();
    let lines: Vec<String> = metadata_lines(record)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        lines,
        vec![
            "Id: 1601",
            "Ethnicity: Caucasian",
            "Gender: M",
            "Age: 59",
            "Location: Raleigh/NC",
            "Bbtype: I",
            "Wfreq: null",
        ]
    );
}

#[test]
fn plan_for_subject() {
    let document = fixture();
    let plan = render(&document, &"940".parse().unwrap(), &RenderOptions::default()).unwrap();
    assert_eq!(plan.subject.as_str(), "940");
    assert_eq!(plan.metadata.len(), 7);
    assert_eq!(plan.bubble.len(), 12);

    let bar_ids: Vec<i64> = plan.bar.iter().map(|obs| obs.otu_id).collect();
    assert_eq!(
        bar_ids,
        vec![1977, 2318, 189, 352, 1189, 41, 2264, 482, 2859, 1167]
    );
    assert_eq!(plan.bubble[0].otu_id, 1167);
    assert_eq!(plan.bubble.last().unwrap().otu_id, 3450);
}

#[test]
fn plan_respects_top_k() {
    let document = fixture();
    let plan = render(
        &document,
        &SubjectId::from_integer(941),
        &RenderOptions { top_k: 1 },
    )
    .unwrap();
    assert_eq!(plan.bar.len(), 1);
    assert_eq!(plan.bar[0].otu_id, 944);
    assert_eq!(plan.bubble.len(), 2);
}

#[test]
fn plan_for_empty_sample() {
    let document = fixture();
    let plan = render(&document, &SubjectId::from_integer(943), &RenderOptions::default()).unwrap();
    assert!(plan.bar.is_empty());
    assert!(plan.bubble.is_empty());
    assert!(!plan.metadata.is_empty());
}

#[test]
fn plan_propagates_errors() {
    let document = fixture();
    assert_matches!(
        render(&document, &SubjectId::from_integer(1601), &RenderOptions::default()),
        Err(DashError::ShapeMismatch { .. })
    );
    assert_matches!(
        render(&document, &SubjectId::from_integer(42), &RenderOptions::default()),
        Err(DashError::SubjectNotFound { .. })
    );
}

#[test]
fn present_calls_every_panel() {
    let document = fixture();
    let plan = render(&document, &SubjectId::from_integer(941), &RenderOptions::default()).unwrap();
    let mut renderer = JsonRenderer::new(Vec::new());
    present(&plan, &mut renderer).unwrap();

    let output = String::from_utf8(renderer.into_inner()).unwrap();
    let panels: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(panels.len(), 3);
    assert_eq!(panels[0]["panel"], "metadata");
    assert_eq!(panels[1]["panel"], "bar");
    assert_eq!(panels[1]["items"][1]["otu_id"], 944);
    assert_eq!(panels[2]["panel"], "bubble");
    assert_eq!(panels[2]["items"][0]["otu_value"], 25.0);
}
