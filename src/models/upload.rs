use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RecordKind;
use super::record::{FileRef, RecordDetail};
use super::timestamp;

/// A file picked for submission. Lives only for the duration of one
/// submission; never persisted client-side.
#[derive(Clone, PartialEq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(name, bytes))
    }

    /// Lower-cased trailing dot-segment including the dot (`".dcm"`).
    /// `None` when the name has no dot or ends with one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_lowercase()))
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

// Candidate bytes are patient data: keep them out of Debug output.
impl std::fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

/// OCR and translation output for one uploaded report file. Either text
/// may hold a backend error sentinel instead of real content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub translated_text: String,
    #[serde(default)]
    pub ocr_duration_ms: Option<u64>,
    #[serde(default)]
    pub translation_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub id: i64,
    pub original_filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub download_url: String,
    pub translation: ExtractedText,
}

/// Result of a report submission once server-side processing completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReport {
    pub id: i64,
    #[serde(default)]
    pub patient_note: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub files: Vec<ProcessedFile>,
}

/// Successful outcome of one upload track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum TrackPayload {
    Imaging(RecordDetail),
    Report(ProcessedReport),
}

impl TrackPayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Imaging(_) => RecordKind::Imaging,
            Self::Report(_) => RecordKind::Report,
        }
    }

    /// Id of the record the backend created.
    pub fn record_id(&self) -> i64 {
        match self {
            Self::Imaging(detail) => detail.id,
            Self::Report(report) => report.id,
        }
    }

    pub fn stored_files(&self) -> Vec<&str> {
        match self {
            Self::Imaging(detail) => detail
                .files
                .iter()
                .map(|f: &FileRef| f.original_filename.as_str())
                .collect(),
            Self::Report(report) => report
                .files
                .iter()
                .map(|f| f.original_filename.as_str())
                .collect(),
        }
    }
}
