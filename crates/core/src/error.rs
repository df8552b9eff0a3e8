//! Error types for slide translation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, translating, or saving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// The presentation package structure is missing required parts.
    #[error("Invalid presentation package: {0}")]
    PackageError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// A requested slide number is outside the presentation.
    #[error("Invalid slide number: {number}. Valid range: 1-{count}")]
    InvalidSlide { number: usize, count: usize },

    /// The translation service call failed.
    #[error("Translation service error: {0}")]
    ServiceError(String),

    /// A text region could not be rebuilt with its captured formatting.
    #[error("Formatting error: {0}")]
    FormattingError(String),

    /// The number of translations does not match the number of items.
    #[error("Translation count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether this error comes from reading or writing the document file itself.
    pub fn is_fatal_io(&self) -> bool {
        matches!(
            self,
            Error::IoError(_) | Error::PackageError(_) | Error::ZipError(_) | Error::XmlError(_)
        )
    }
}
