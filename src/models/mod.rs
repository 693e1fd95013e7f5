//! Wire and domain types shared by the ingestion and feed layers.

pub mod enums;
pub mod record;
pub mod timestamp;
pub mod upload;

pub use enums::*;
pub use record::*;
pub use upload::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
