//! Subject lookups against a loaded [`Document`].
//!
//! Ids are compared in their normalized form (see [`SubjectId::normalize`]).
//! When the document holds several records with the same id, the first one in
//! document order is returned; [`Document::integrity_issues`] reports those
//! duplicates at load time.

use crate::document::Document;
use crate::domain::{MetadataRecord, SampleRecord, SubjectId};
use crate::error::DashError;

pub fn subjects(document: &Document) -> &[SubjectId] {
    &document.names
}

pub fn find_metadata<'a>(
    document: &'a Document,
    subject: &SubjectId,
) -> Result<&'a MetadataRecord, DashError> {
    tracing::debug!(subject = %subject, "metadata lookup");
    document
        .metadata
        .iter()
        .find(|record| record.id() == subject)
        .ok_or_else(|| DashError::SubjectNotFound {
            kind: "metadata",
            id: subject.to_string(),
        })
}

pub fn find_sample<'a>(
    document: &'a Document,
    subject: &SubjectId,
) -> Result<&'a SampleRecord, DashError> {
    tracing::debug!(subject = %subject, "sample lookup");
    document
        .samples
        .iter()
        .find(|record| &record.id == subject)
        .ok_or_else(|| DashError::SubjectNotFound {
            kind: "sample",
            id: subject.to_string(),
        })
}
