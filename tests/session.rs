use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use otu_dash::document::{Document, DocumentSource};
use otu_dash::domain::SubjectId;
use otu_dash::error::DashError;
use otu_dash::render::RenderOptions;
use otu_dash::session::Session;

fn fixture() -> Document {
    let path = Utf8PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/samples.json"
    ));
    Document::load(&DocumentSource::Path(path), true).unwrap()
}

#[test]
fn starts_on_first_subject_and_wraps() {
    let document = fixture();
    let mut session = Session::new(&document, RenderOptions::default(), None).unwrap();
    assert_eq!(session.current().as_str(), "940");

    session.select_previous();
    assert_eq!(session.current().as_str(), "1601");
    session.select_next();
    assert_eq!(session.current().as_str(), "940");

    session.select_last();
    assert_eq!(session.index(), 3);
    session.select_first();
    assert_eq!(session.index(), 0);
}

#[test]
fn initial_subject_and_select() {
    let document = fixture();
    let initial: SubjectId = "941".parse().unwrap();
    let mut session = Session::new(&document, RenderOptions::default(), Some(&initial)).unwrap();
    assert_eq!(session.index(), 1);

    let plan = session.plan().unwrap();
    assert_eq!(plan.subject, initial);

    session.select(&SubjectId::from_integer(943)).unwrap();
    assert!(session.plan().unwrap().bubble.is_empty());

    assert_matches!(
        session.select(&SubjectId::from_integer(1)),
        Err(DashError::SubjectNotFound { kind: "name", .. })
    );
    assert_eq!(session.index(), 2);
}

#[test]
fn unknown_initial_subject_fails() {
    let document = fixture();
    let initial = SubjectId::from_integer(12);
    assert_matches!(
        Session::new(&document, RenderOptions::default(), Some(&initial)),
        Err(DashError::SubjectNotFound { .. })
    );
}

#[test]
fn empty_document_fails() {
    let document =
        Document::from_slice(br#"{"names": [], "metadata": [], "samples": []}"#).unwrap();
    assert_matches!(
        Session::new(&document, RenderOptions::default(), None),
        Err(DashError::EmptyDocument)
    );
}
