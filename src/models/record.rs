use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RecordKind;
use super::timestamp;

/// One item of a kind-specific list collection, exactly as the backend
/// returns it. The collection does not say which kind it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: i64,
    #[serde(default)]
    pub patient_note: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub file_count: u32,
    /// First 200 characters of the first translation (report lists only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_preview: Option<String>,
}

/// A feed entry. The kind is part of the type, so a summary can only ever
/// route to its own detail and download endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type")]
pub enum RecordSummary {
    #[serde(rename = "radiology")]
    Imaging(RecordRow),
    #[serde(rename = "report")]
    Report(RecordRow),
}

impl RecordSummary {
    /// Stamp a row fetched from the `kind` collection.
    pub fn stamp(kind: RecordKind, row: RecordRow) -> Self {
        match kind {
            RecordKind::Imaging => Self::Imaging(row),
            RecordKind::Report => Self::Report(row),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Imaging(_) => RecordKind::Imaging,
            Self::Report(_) => RecordKind::Report,
        }
    }

    pub fn row(&self) -> &RecordRow {
        match self {
            Self::Imaging(row) | Self::Report(row) => row,
        }
    }

    pub fn id(&self) -> i64 {
        self.row().id
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.kind(), self.id())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.row().created_at
    }

    pub fn patient_note(&self) -> Option<&str> {
        self.row().patient_note.as_deref()
    }

    pub fn file_count(&self) -> u32 {
        self.row().file_count
    }
}

/// Identity of a record across both collections. Ids are only unique
/// within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub kind: RecordKind,
    pub id: i64,
}

impl RecordKey {
    pub fn new(kind: RecordKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

/// Full record payload, fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDetail {
    pub id: i64,
    #[serde(rename = "record_type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub patient_note: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl RecordDetail {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: i64,
    pub original_filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub download_url: String,
    /// Present for report files only; imaging files never carry text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<Translation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub translated_text: String,
    #[serde(default)]
    pub ocr_duration_ms: Option<u64>,
    #[serde(default)]
    pub translation_duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT_ROW: &str = r#"{
        "id": 12,
        "patient_note": "follow-up",
        "created_at": "2024-03-02T08:15:00.5",
        "created_by": "dr.kaya",
        "file_count": 2,
        "translation_preview": "Findings: ..."
    }"#;

    #[test]
    fn row_deserializes_without_kind() {
        let row: RecordRow = serde_json::from_str(REPORT_ROW).unwrap();
        assert_eq!(row.id, 12);
        assert_eq!(row.file_count, 2);
        assert_eq!(row.translation_preview.as_deref(), Some("Findings: ..."));
    }

    #[test]
    fn stamping_fixes_kind_and_key() {
        let row: RecordRow = serde_json::from_str(REPORT_ROW).unwrap();
        let summary = RecordSummary::stamp(RecordKind::Report, row);
        assert_eq!(summary.kind(), RecordKind::Report);
        assert_eq!(summary.key(), RecordKey::new(RecordKind::Report, 12));
        assert_eq!(summary.key().to_string(), "report-12");
        assert_eq!(summary.patient_note(), Some("follow-up"));
    }

    #[test]
    fn summary_serializes_with_record_type_tag() {
        let row: RecordRow = serde_json::from_str(REPORT_ROW).unwrap();
        let json = serde_json::to_value(RecordSummary::stamp(RecordKind::Imaging, row)).unwrap();
        assert_eq!(json["record_type"], "radiology");
        assert_eq!(json["id"], 12);
    }

    #[test]
    fn imaging_detail_has_no_translations() {
        let detail: RecordDetail = serde_json::from_str(
            r#"{
                "id": 4,
                "record_type": "radiology",
                "patient_note": null,
                "created_at": "2024-03-01T10:00:00",
                "created_by": "tech",
                "files": [{"id": 9, "original_filename": "chest.dcm", "file_type": "dcm",
                           "download_url": "/api/radiology/files/9"}]
            }"#,
        )
        .unwrap();
        assert_eq!(detail.key(), RecordKey::new(RecordKind::Imaging, 4));
        assert!(detail.files[0].translations.is_none());
    }

    #[test]
    fn report_detail_carries_translations() {
        let detail: RecordDetail = serde_json::from_str(
            r#"{
                "id": 5,
                "record_type": "report",
                "created_at": "2024-03-01T10:00:00",
                "created_by": "dr.kaya",
                "files": [{"id": 10, "original_filename": "lab.pdf", "file_type": "pdf",
                           "download_url": "/api/reports/files/10",
                           "translations": [{"id": 1, "original_text": "Hb 13", "translated_text": "Hb 13",
                                             "ocr_duration_ms": 1200, "translation_duration_ms": null}]}]
            }"#,
        )
        .unwrap();
        let translations = detail.files[0].translations.as_ref().unwrap();
        assert_eq!(translations[0].ocr_duration_ms, Some(1200));
        assert_eq!(translations[0].translation_duration_ms, None);
    }
}
