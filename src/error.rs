use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DashError {
    #[error("invalid subject id: {0:?}")]
    InvalidSubjectId(String),

    #[error("no {kind} record for subject {id}")]
    #[diagnostic(help("run `otu-dash subjects` to list the known subject ids"))]
    SubjectNotFound { kind: &'static str, id: String },

    #[error(
        "sample {id} has mismatched arrays: otu_ids={otu_ids}, otu_labels={otu_labels}, sample_values={sample_values}"
    )]
    ShapeMismatch {
        id: String,
        otu_ids: usize,
        otu_labels: usize,
        sample_values: usize,
    },

    #[error("duplicate {kind} record for subject {id}")]
    DuplicateRecord { kind: &'static str, id: String },

    #[error("document contains no subjects")]
    EmptyDocument,

    #[error("failed to read document: {0}")]
    DocumentRead(String),

    #[error("failed to parse document: {0}")]
    DocumentParse(String),

    #[error("document request failed: {0}")]
    FetchHttp(String),

    #[error("document server returned status {status}: {message}")]
    FetchStatus { status: u16, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(String),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
