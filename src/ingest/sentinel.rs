//! In-band failure markers the report processor writes into text fields.
//!
//! A report submission can succeed as a whole while OCR or translation
//! failed for individual files. Those failures arrive as ordinary text
//! starting with a fixed prefix.

use crate::models::{ExtractedText, ProcessedReport};

pub const OCR_ERROR_PREFIX: &str = "[OCR error:";
pub const TRANSLATION_ERROR_PREFIX: &str = "[Translation error:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFailure {
    Ocr,
    Translation,
}

pub fn is_ocr_failure(original_text: &str) -> bool {
    original_text.starts_with(OCR_ERROR_PREFIX)
}

pub fn is_translation_failure(translated_text: &str) -> bool {
    translated_text.starts_with(TRANSLATION_ERROR_PREFIX)
}

/// The failure recorded for one file, OCR first.
pub fn file_failure(text: &ExtractedText) -> Option<FileFailure> {
    if is_ocr_failure(&text.original_text) {
        Some(FileFailure::Ocr)
    } else if is_translation_failure(&text.translated_text) {
        Some(FileFailure::Translation)
    } else {
        None
    }
}

/// Text between a sentinel prefix and its closing bracket.
pub fn failure_reason(text: &str) -> Option<&str> {
    let rest = text
        .strip_prefix(OCR_ERROR_PREFIX)
        .or_else(|| text.strip_prefix(TRANSLATION_ERROR_PREFIX))?;
    let rest = rest.trim();
    Some(rest.strip_suffix(']').unwrap_or(rest).trim_end())
}

/// True when no file of the report carries a sentinel.
pub fn report_is_clean(report: &ProcessedReport) -> bool {
    report
        .files
        .iter()
        .all(|file| file_failure(&file.translation).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessedFile;

    fn text(original: &str, translated: &str) -> ExtractedText {
        ExtractedText {
            original_text: original.into(),
            translated_text: translated.into(),
            ocr_duration_ms: None,
            translation_duration_ms: None,
        }
    }

    #[test]
    fn detects_prefixes_only_at_start() {
        assert!(is_ocr_failure("[OCR error: TimeoutError()]"));
        assert!(!is_ocr_failure("Result: [OCR error: quoted]"));
        assert!(is_translation_failure("[Translation error: HTTPError(502)]"));
        assert!(!is_translation_failure("[translation error: lower]"));
    }

    #[test]
    fn ocr_failure_takes_precedence() {
        let both = text("[OCR error: x]", "[Translation error: y]");
        assert_eq!(file_failure(&both), Some(FileFailure::Ocr));
        assert_eq!(file_failure(&text("ok", "[Translation error: y]")), Some(FileFailure::Translation));
        assert_eq!(file_failure(&text("ok", "")), None);
    }

    #[test]
    fn reason_is_unwrapped() {
        assert_eq!(failure_reason("[OCR error: ValueError('bad pdf')]"), Some("ValueError('bad pdf')"));
        assert_eq!(failure_reason("plain text"), None);
    }

    #[test]
    fn report_cleanliness_checks_every_file() {
        let file = |original: &str, translated: &str| ProcessedFile {
            id: 1,
            original_filename: "a.pdf".into(),
            file_type: "pdf".into(),
            download_url: String::new(),
            translation: text(original, translated),
        };
        let mut report = ProcessedReport {
            id: 1,
            patient_note: None,
            created_at: chrono::Utc::now(),
            created_by: "dr".into(),
            files: vec![file("a", "b"), file("c", "")],
        };
        assert!(report_is_clean(&report));

        report.files.push(file("[OCR error: boom]", ""));
        assert!(!report_is_clean(&report));
    }
}
