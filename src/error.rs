//! Error types for paperlint.

use std::io;
use thiserror::Error;

/// Result type alias for paperlint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, checking or annotating a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a zip-based WordprocessingML package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The package was recognised but cannot be read as a document.
    #[error("Corrupted document package: {0}")]
    PackageCorruption(String),

    /// A required part is missing from the package.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Malformed XML inside a package part.
    #[error("XML error: {0}")]
    Xml(String),

    /// Zip container error.
    #[error("Zip error: {0}")]
    Zip(String),

    /// A rule template could not be loaded or is invalid.
    #[error("Template error: {0}")]
    Template(String),

    /// A comment could not be anchored (e.g. the paragraph no longer exists).
    #[error("Invalid comment anchor: {0}")]
    InvalidAnchor(String),

    /// A rule module reported a failure.
    #[error("Rule module '{module}' failed: {message}")]
    ModuleFailed {
        /// Module name
        module: String,
        /// Failure description
        message: String,
    },

    /// A comment table has no cells or was addressed outside its bounds.
    #[error("Invalid comment table: {0}")]
    InvalidTable(String),

    /// Error during report rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The pipeline was cancelled before completion.
    #[error("Processing cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart(err.to_string()),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Template(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format: not a valid DOCX package");

        let err = Error::InvalidTable("cell (3, 0) is outside a 2x2 table".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid comment table: cell (3, 0) is outside a 2x2 table"
        );
    }

    #[test]
    fn test_module_failed_display() {
        let err = Error::ModuleFailed {
            module: "Abstract".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Rule module 'Abstract' failed: boom");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_regex_error_is_template_error() {
        let err: Error = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, Error::Template(_)));
    }
}
