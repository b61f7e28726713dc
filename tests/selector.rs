use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use otu_dash::document::{Document, DocumentSource};
use otu_dash::domain::{MetadataValue, SubjectId};
use otu_dash::error::DashError;
use otu_dash::selector::{find_metadata, find_sample, subjects};

fn fixture() -> Document {
    let path = Utf8PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/samples.json"
    ));
    Document::load(&DocumentSource::Path(path), true).unwrap()
}

#[test]
fn lookup_by_ui_string_matches_numeric_metadata_id() {
    let document = fixture();
    let id: SubjectId = " 0940".parse().unwrap();
    let metadata = find_metadata(&document, &id).unwrap();
    assert_eq!(
        metadata.get("ethnicity"),
        Some(&MetadataValue::Text("Caucasian".to_string()))
    );
    let sample = find_sample(&document, &id).unwrap();
    assert_eq!(sample.otu_ids.len(), 12);
}

#[test]
fn unknown_subject_is_not_found() {
    let document = fixture();
    let id: SubjectId = "999".parse().unwrap();
    assert_matches!(
        find_metadata(&document, &id),
        Err(DashError::SubjectNotFound { kind: "metadata", .. })
    );
    assert_matches!(
        find_sample(&document, &id),
        Err(DashError::SubjectNotFound { kind: "sample", .. })
    );
}

#[test]
fn subjects_in_document_order() {
    let document = fixture();
    let ids: Vec<&str> = subjects(&document).iter().map(SubjectId::as_str).collect();
    assert_eq!(ids, vec!["940", "941", "943", "1601"]);
}

#[test]
fn duplicate_records_resolve_to_first() {
    let document = Document::from_slice(
        br#"{
            "names": ["7"],
            "metadata": [{"id": "7", "age": 1}, {"id": 7, "age": 2}],
            "samples": [
                {"id": 7, "otu_ids": [1], "otu_labels": ["first"], "sample_values": [1]},
                {"id": 7, "otu_ids": [2], "otu_labels": ["second"], "sample_values": [2]}
            ]
        }"#,
    )
    .unwrap();
    let id = SubjectId::from_integer(7);
    assert_eq!(
        find_metadata(&document, &id).unwrap().get("age"),
        Some(&MetadataValue::Integer(1))
    );
    assert_eq!(find_sample(&document, &id).unwrap().otu_labels, vec!["first"]);
    assert_eq!(document.integrity_issues().len(), 2);
}
