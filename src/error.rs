//! Error types for Suite export conversion.

use thiserror::Error;

/// Errors that abort the conversion of a project.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Project type or dialect that no conversion path exists for
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// Required field missing or malformed in a project descriptor or label
    #[error("Schema error: {0}")]
    Schema(String),

    /// Image metadata unusable for conversion (e.g. missing dimensions)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Labels reference categories or images the project does not define
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Project version is not a semantic version
    #[error("Invalid project version: {0}")]
    Version(#[from] semver::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn unsupported_schema(message: impl Into<String>) -> Self {
        Self::UnsupportedSchema(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
