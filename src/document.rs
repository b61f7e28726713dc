use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::str::FromStr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{MetadataRecord, SampleRecord, SubjectId};
use crate::error::DashError;

/// Where the sample document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(Utf8PathBuf),
    Url(String),
}

impl DocumentSource {
    fn is_gzip(&self) -> bool {
        let name = match self {
            DocumentSource::Path(path) => path.as_str(),
            DocumentSource::Url(url) => url.split(['?', '#']).next().unwrap_or(url.as_str()),
        };
        name.ends_with(".gz")
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => write!(f, "{path}"),
            DocumentSource::Url(url) => write!(f, "{url}"),
        }
    }
}

impl FromStr for DocumentSource {
    type Err = DashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DashError::DocumentRead("empty document source".to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(DocumentSource::Url(trimmed.to_string()));
        }
        Ok(DocumentSource::Path(Utf8PathBuf::from(trimmed)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Name,
    Metadata,
    Sample,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Name => "name",
            RecordKind::Metadata => "metadata",
            RecordKind::Sample => "sample",
        }
    }
}

/// A data-integrity problem found while loading. Lookups still succeed
/// (first record in document order wins) unless the caller asks for strict
/// loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub kind: RecordKind,
    pub id: SubjectId,
}

impl IntegrityIssue {
    pub fn into_error(self) -> DashError {
        DashError::DuplicateRecord {
            kind: self.kind.as_str(),
            id: self.id.to_string(),
        }
    }
}

/// The whole dataset, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub names: Vec<SubjectId>,
    pub metadata: Vec<MetadataRecord>,
    pub samples: Vec<SampleRecord>,
}

impl Document {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DashError> {
        serde_json::from_reader(reader).map_err(|err| DashError::DocumentParse(err.to_string()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DashError> {
        serde_json::from_slice(bytes).map_err(|err| DashError::DocumentParse(err.to_string()))
    }

    pub fn from_path(path: &Utf8Path) -> Result<Self, DashError> {
        let file = File::open(path.as_std_path())
            .map_err(|err| DashError::DocumentRead(format!("open {path}: {err}")))?;
        let reader = BufReader::new(file);
        if path.as_str().ends_with(".gz") {
            Self::from_reader(GzDecoder::new(reader))
        } else {
            Self::from_reader(reader)
        }
    }

    /// Loads the document and reports duplicate ids. With `strict` the first
    /// duplicate is returned as an error instead of a warning.
    pub fn load(source: &DocumentSource, strict: bool) -> Result<Self, DashError> {
        let document = match source {
            DocumentSource::Path(path) => Self::from_path(path)?,
            DocumentSource::Url(url) => {
                let bytes = DocumentHttpClient::new()?.fetch(url)?;
                if source.is_gzip() {
                    Self::from_reader(GzDecoder::new(bytes.as_slice()))?
                } else {
                    Self::from_slice(&bytes)?
                }
            }
        };

        tracing::info!(
            source = %source,
            names = document.names.len(),
            metadata = document.metadata.len(),
            samples = document.samples.len(),
            "document loaded"
        );

        let issues = document.integrity_issues();
        for issue in &issues {
            tracing::warn!(
                kind = issue.kind.as_str(),
                id = %issue.id,
                "duplicate subject id; the first record in document order is used"
            );
        }
        if strict {
            if let Some(issue) = issues.into_iter().next() {
                return Err(issue.into_error());
            }
        }
        Ok(document)
    }

    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        collect_duplicates(self.names.iter(), RecordKind::Name, &mut issues);
        collect_duplicates(
            self.metadata.iter().map(|record| record.id()),
            RecordKind::Metadata,
            &mut issues,
        );
        collect_duplicates(
            self.samples.iter().map(|record| &record.id),
            RecordKind::Sample,
            &mut issues,
        );
        issues
    }
}

fn collect_duplicates<'a>(
    ids: impl Iterator<Item = &'a SubjectId>,
    kind: RecordKind,
    issues: &mut Vec<IntegrityIssue>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            issues.push(IntegrityIssue {
                kind,
                id: id.clone(),
            });
        }
    }
}

pub struct DocumentHttpClient {
    client: Client,
}

impl DocumentHttpClient {
    pub fn new() -> Result<Self, DashError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("otu-dash/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DashError::FetchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| DashError::FetchHttp(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, DashError> {
        tracing::debug!(url, "fetching document");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| DashError::FetchHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "document request failed".to_string());
            return Err(DashError::FetchStatus { status, message });
        }
        let bytes = response
            .bytes()
            .map_err(|err| DashError::FetchHttp(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}
