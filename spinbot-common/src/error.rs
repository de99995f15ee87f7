// ================================================================
// File: spinbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Invalid command format: {0}")]
    InvalidCommandFormat(String),

    #[error("No match found for '{0}'")]
    NoMatchFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Stable, machine-readable name for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidCommandFormat(_) => "invalid_command_format",
            Error::NoMatchFound(_) => "no_match_found",
            Error::StorageUnavailable(_) => "storage_unavailable",
            Error::Validation(_) => "validation_error",
            Error::Json(_) => "json_error",
            Error::Platform(_) => "platform_error",
            Error::Parse(_) => "parse_error",
        }
    }
}
