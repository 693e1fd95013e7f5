use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Intpatient";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extensions accepted for imaging (radiology) submissions.
pub const IMAGING_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".bmp", ".dcm"];

/// Extensions accepted for report submissions (OCR + translation server-side).
pub const REPORT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".pdf"];

/// Per-file upload ceiling, in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Get the application data directory.
/// ~/Intpatient/ on all platforms; falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Where the bearer token survives between process runs.
pub fn session_file() -> PathBuf {
    app_data_dir().join("session.json")
}

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "intpatient_lib=info,intpatient=info,warn"
}

/// Client-side settings for talking to the intpatient backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_upload_mb: u64,
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` keeps the transport default (no limit),
    /// which report uploads need: server-side OCR can run for minutes.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `INTPATIENT_URL`, `INTPATIENT_MAX_UPLOAD_MB`
    /// and `INTPATIENT_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("INTPATIENT_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("INTPATIENT_MAX_UPLOAD_MB") {
            match raw.trim().parse::<u64>() {
                Ok(mb) if mb > 0 => config.max_upload_mb = mb,
                _ => tracing::warn!(value = %raw, "Ignoring invalid INTPATIENT_MAX_UPLOAD_MB"),
            }
        }

        if let Some(raw) = lookup("INTPATIENT_REQUEST_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(secs) => config.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring invalid INTPATIENT_REQUEST_TIMEOUT_SECS")
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Intpatient"));
    }

    #[test]
    fn session_file_under_app_data() {
        let file = session_file();
        assert!(file.starts_with(app_data_dir()));
        assert!(file.ends_with("session.json"));
    }

    #[test]
    fn defaults_match_upload_pages() {
        let config = ClientConfig::default();
        assert_eq!(config.max_upload_mb, 50);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("INTPATIENT_URL", "https://records.example.org/"),
            ("INTPATIENT_MAX_UPLOAD_MB", "20"),
            ("INTPATIENT_REQUEST_TIMEOUT_SECS", "90"),
        ]));
        assert_eq!(config.base_url, "https://records.example.org");
        assert_eq!(config.max_upload_mb, 20);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn invalid_env_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("INTPATIENT_MAX_UPLOAD_MB", "lots"),
            ("INTPATIENT_REQUEST_TIMEOUT_SECS", "-3"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn extension_sets_differ_per_kind() {
        assert!(IMAGING_EXTENSIONS.contains(&".dcm"));
        assert!(!REPORT_EXTENSIONS.contains(&".dcm"));
        assert!(REPORT_EXTENSIONS.contains(&".pdf"));
        assert!(!IMAGING_EXTENSIONS.contains(&".pdf"));
    }
}
