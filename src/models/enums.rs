use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Wire values follow the backend's `record_type` column.
str_enum!(RecordKind {
    Imaging => "radiology",
    Report => "report",
});

str_enum!(RecordFilter {
    All => "all",
    Imaging => "radiology",
    Report => "report",
});

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Imaging, RecordKind::Report];

    /// Route prefix shared by every endpoint of this kind.
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Self::Imaging => "/api/radiology",
            Self::Report => "/api/reports",
        }
    }

    pub fn upload_path(&self) -> String {
        format!("{}/upload", self.api_prefix())
    }

    pub fn list_path(&self) -> String {
        format!("{}/records", self.api_prefix())
    }

    pub fn detail_path(&self, id: i64) -> String {
        format!("{}/records/{id}", self.api_prefix())
    }

    pub fn download_path(&self, file_id: i64) -> String {
        format!("{}/files/{file_id}", self.api_prefix())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Imaging => "Imaging",
            Self::Report => "Report",
        }
    }
}

impl RecordFilter {
    /// Which collections must be fetched for this filter.
    pub fn kinds(&self) -> &'static [RecordKind] {
        match self {
            Self::All => &RecordKind::ALL,
            Self::Imaging => &[RecordKind::Imaging],
            Self::Report => &[RecordKind::Report],
        }
    }

    pub fn admits(&self, kind: RecordKind) -> bool {
        self.kinds().contains(&kind)
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::All
    }
}
