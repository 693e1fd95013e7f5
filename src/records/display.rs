//! How extracted report text is presented.

use crate::ingest::sentinel::{failure_reason, is_ocr_failure, is_translation_failure};
use crate::models::{ExtractedText, FileRef, ProcessedFile, RecordKind, Translation};

/// Presentation of one file's OCR and translation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDisplay<'a> {
    NoTextFound,
    OcrFailed { reason: &'a str },
    /// Text was extracted but no translation was produced.
    OriginalOnly { original: &'a str },
    TranslationFailed { original: &'a str, reason: &'a str },
    Translated { original: &'a str, translated: &'a str },
}

impl TextDisplay<'_> {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::OcrFailed { .. } | Self::TranslationFailed { .. })
    }
}

pub fn classify<'a>(original: &'a str, translated: &'a str) -> TextDisplay<'a> {
    if original.trim().is_empty() {
        return TextDisplay::NoTextFound;
    }
    if is_ocr_failure(original) {
        return TextDisplay::OcrFailed {
            reason: failure_reason(original).unwrap_or_default(),
        };
    }
    if translated.trim().is_empty() {
        return TextDisplay::OriginalOnly { original };
    }
    if is_translation_failure(translated) {
        return TextDisplay::TranslationFailed {
            original,
            reason: failure_reason(translated).unwrap_or_default(),
        };
    }
    TextDisplay::Translated {
        original,
        translated,
    }
}

pub fn classify_extracted(text: &ExtractedText) -> TextDisplay<'_> {
    classify(&text.original_text, &text.translated_text)
}

pub fn classify_translation(translation: &Translation) -> TextDisplay<'_> {
    classify(&translation.original_text, &translation.translated_text)
}

/// One entry per stored translation. Imaging files never carry text and
/// yield nothing; a report file with no translation yields "no text found".
pub fn file_texts(kind: RecordKind, file: &FileRef) -> Vec<TextDisplay<'_>> {
    if kind == RecordKind::Imaging {
        return Vec::new();
    }
    match file.translations.as_deref() {
        Some(translations) if !translations.is_empty() => {
            translations.iter().map(classify_translation).collect()
        }
        _ => vec![TextDisplay::NoTextFound],
    }
}

/// Files of a processed report that need attention.
pub fn failed_files(files: &[ProcessedFile]) -> Vec<&ProcessedFile> {
    files
        .iter()
        .filter(|f| classify_extracted(&f.translation).is_failure())
        .collect()
}

/// `1.5s` from a second up, `850ms` below.
pub fn format_duration(ms: Option<u64>) -> Option<String> {
    let ms = ms?;
    if ms >= 1000 {
        Some(format!("{:.1}s", ms as f64 / 1000.0))
    } else {
        Some(format!("{ms}ms"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(original: &str, translated: &str) -> Translation {
        Translation {
            id: 1,
            original_text: original.into(),
            translated_text: translated.into(),
            ocr_duration_ms: None,
            translation_duration_ms: None,
        }
    }

    fn report_file(translations: Option<Vec<Translation>>) -> FileRef {
        FileRef {
            id: 3,
            original_filename: "lab.pdf".into(),
            file_type: "pdf".into(),
            download_url: "/api/reports/files/3".into(),
            translations,
        }
    }

    #[test]
    fn empty_translation_means_original_only() {
        assert_eq!(
            classify("Hemoglobin 13.2", ""),
            TextDisplay::OriginalOnly { original: "Hemoglobin 13.2" }
        );
    }

    #[test]
    fn empty_original_means_no_text() {
        assert_eq!(classify("", ""), TextDisplay::NoTextFound);
        assert_eq!(classify("   \n", "something"), TextDisplay::NoTextFound);
    }

    #[test]
    fn sentinels_are_classified() {
        assert_eq!(
            classify("[OCR error: TimeoutError()]", ""),
            TextDisplay::OcrFailed { reason: "TimeoutError()" }
        );
        let display = classify("Hb 13", "[Translation error: HTTPStatusError(502)]");
        assert_eq!(
            display,
            TextDisplay::TranslationFailed { original: "Hb 13", reason: "HTTPStatusError(502)" }
        );
        assert!(display.is_failure());
    }

    #[test]
    fn full_translation() {
        let display = classify("Hb 13", "Hemoglobin 13");
        assert_eq!(display, TextDisplay::Translated { original: "Hb 13", translated: "Hemoglobin 13" });
        assert!(!display.is_failure());
    }

    #[test]
    fn report_file_without_translations_has_no_text() {
        assert_eq!(file_texts(RecordKind::Report, &report_file(None)), vec![TextDisplay::NoTextFound]);
        assert_eq!(file_texts(RecordKind::Report, &report_file(Some(vec![]))), vec![TextDisplay::NoTextFound]);
    }

    #[test]
    fn report_file_lists_each_translation() {
        let file = report_file(Some(vec![translation("a", "b"), translation("", "")]));
        assert_eq!(
            file_texts(RecordKind::Report, &file),
            vec![TextDisplay::Translated { original: "a", translated: "b" }, TextDisplay::NoTextFound]
        );
    }

    #[test]
    fn imaging_files_have_no_text_section() {
        assert!(file_texts(RecordKind::Imaging, &report_file(Some(vec![translation("a", "b")]))).is_empty());
    }

    #[test]
    fn failed_files_are_picked_out() {
        let file = |name: &str, original: &str, translated: &str| ProcessedFile {
            id: 1,
            original_filename: name.into(),
            file_type: "pdf".into(),
            download_url: String::new(),
            translation: ExtractedText {
                original_text: original.into(),
                translated_text: translated.into(),
                ocr_duration_ms: None,
                translation_duration_ms: None,
            },
        };
        let files = vec![
            file("ok.pdf", "a", "b"),
            file("ocr.pdf", "[OCR error: x]", ""),
            file("tr.pdf", "a", "[Translation error: y]"),
            file("blank.pdf", "", ""),
        ];
        let names: Vec<&str> = failed_files(&files).iter().map(|f| f.original_filename.as_str()).collect();
        assert_eq!(names, vec!["ocr.pdf", "tr.pdf"]);
    }

    #[test]
    fn durations_format_like_the_feed() {
        assert_eq!(format_duration(None), None);
        assert_eq!(format_duration(Some(0)).as_deref(), Some("0ms"));
        assert_eq!(format_duration(Some(999)).as_deref(), Some("999ms"));
        assert_eq!(format_duration(Some(1000)).as_deref(), Some("1.0s"));
        assert_eq!(format_duration(Some(12_345)).as_deref(), Some("12.3s"));
    }
}
