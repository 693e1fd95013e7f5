//! Client-side gate run on a batch before any upload starts.

use thiserror::Error;

use crate::config::{BYTES_PER_MB, IMAGING_EXTENSIONS, REPORT_EXTENSIONS};
use crate::models::{CandidateFile, RecordKind};

/// Why a batch was refused. Names the first offending file; the whole
/// batch is refused with it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationRejection {
    #[error("\"{file}\" is not a supported file type. Accepted: {accepted}")]
    UnsupportedType { file: String, accepted: String },

    #[error("\"{file}\" exceeds the {max_mb}MB size limit.")]
    TooLarge { file: String, max_mb: u64 },
}

impl ValidationRejection {
    pub fn file(&self) -> &str {
        match self {
            Self::UnsupportedType { file, .. } | Self::TooLarge { file, .. } => file,
        }
    }
}

/// Accepted extensions and size ceiling for one kind of submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    pub accepted_extensions: Vec<String>,
    pub max_mb: u64,
}

impl ValidationPolicy {
    pub fn new(accepted_extensions: &[&str], max_mb: u64) -> Self {
        Self {
            accepted_extensions: accepted_extensions.iter().map(|e| e.to_lowercase()).collect(),
            max_mb,
        }
    }

    pub fn for_kind(kind: RecordKind, max_mb: u64) -> Self {
        match kind {
            RecordKind::Imaging => Self::new(IMAGING_EXTENSIONS, max_mb),
            RecordKind::Report => Self::new(REPORT_EXTENSIONS, max_mb),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn validate<'a>(
        &self,
        files: &'a [CandidateFile],
    ) -> Result<&'a [CandidateFile], ValidationRejection> {
        validate(files, &self.accepted_extensions, self.max_bytes())
    }
}

/// All-or-nothing: every file passes or the batch is refused with the
/// first failure. An empty batch is accepted.
pub fn validate<'a, S: AsRef<str>>(
    files: &'a [CandidateFile],
    accepted_extensions: &[S],
    max_bytes: u64,
) -> Result<&'a [CandidateFile], ValidationRejection> {
    for file in files {
        let supported = file.extension().is_some_and(|ext| {
            accepted_extensions
                .iter()
                .any(|accepted| accepted.as_ref().eq_ignore_ascii_case(&ext))
        });
        if !supported {
            return Err(ValidationRejection::UnsupportedType {
                file: file.name.clone(),
                accepted: accepted_extensions
                    .iter()
                    .map(|e| e.as_ref())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if file.size_bytes > max_bytes {
            return Err(ValidationRejection::TooLarge {
                file: file.name.clone(),
                max_mb: max_bytes / BYTES_PER_MB,
            });
        }
    }
    Ok(files)
}
