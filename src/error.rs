/*!
 * Error types for bacpac-editor
 */

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_INTEGRITY: i32 = 3;

#[derive(Error, Debug)]
pub enum EditorError {
    /// Container cannot be opened, is not a valid archive, or an entry failed to extract
    #[error("Archive error: {0}")]
    Archive(String),

    /// Model or manifest document is not well-formed markup
    #[error("Invalid XML file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Expected document absent from an extracted container
    #[error("{0} not found in package")]
    MissingResource(String),

    /// Manifest lacks a section or entry the reconciler updates
    #[error("Manifest section missing: {0}")]
    MissingManifestSection(String),

    /// Checksum read back after persisting differs from the computed value
    #[error("Checksum verification failed: expected {expected}, found {actual}")]
    IntegrityFailure { expected: String, actual: String },

    /// Input path does not exist
    #[error("File '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    /// Selection option not present in the catalog
    #[error("Unknown selection option '{0}'")]
    UnknownSelection(String),

    /// Malformed command line
    #[error("{0}")]
    Usage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EditorError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            EditorError::SourceNotFound(_)
            | EditorError::UnknownSelection(_)
            | EditorError::Usage(_)
            | EditorError::Config(_) => EXIT_USAGE,
            EditorError::IntegrityFailure { .. } => EXIT_INTEGRITY,
            _ => EXIT_FAILURE,
        }
    }

    /// Check if this error aborts the run
    ///
    /// Missing manifest sections only skip the step that needed them.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EditorError::MissingManifestSection(_))
    }

    /// Whether the usage text should accompany this error
    pub fn shows_usage(&self) -> bool {
        matches!(
            self,
            EditorError::UnknownSelection(_) | EditorError::Usage(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            EditorError::SourceNotFound(_)
            | EditorError::UnknownSelection(_)
            | EditorError::Usage(_) => ErrorCategory::Validation,
            EditorError::Config(_) => ErrorCategory::Configuration,
            EditorError::Archive(_) => ErrorCategory::Archive,
            EditorError::Parse { .. } => ErrorCategory::Markup,
            EditorError::MissingResource(_) | EditorError::MissingManifestSection(_) => {
                ErrorCategory::Package
            }
            EditorError::IntegrityFailure { .. } => ErrorCategory::Integrity,
            EditorError::Io(_) => ErrorCategory::IoError,
        }
    }
}

impl From<zip::result::ZipError> for EditorError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io_err) => EditorError::Io(io_err),
            other => EditorError::Archive(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for EditorError {
    fn from(err: toml::de::Error) -> Self {
        EditorError::Config(format!("TOML parse error: {}", err))
    }
}

/// Error categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Archive,
    Markup,
    Package,
    Integrity,
    IoError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Archive => "archive",
            ErrorCategory::Markup => "markup",
            ErrorCategory::Package => "package",
            ErrorCategory::Integrity => "integrity",
            ErrorCategory::IoError => "io",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(EditorError::Archive("bad".to_string()).is_fatal());
        assert!(EditorError::MissingResource("model.xml".to_string()).is_fatal());
        assert!(EditorError::IntegrityFailure {
            expected: "A".to_string(),
            actual: "B".to_string()
        }
        .is_fatal());
        assert!(EditorError::Io(io::Error::new(io::ErrorKind::Other, "x")).is_fatal());
    }

    #[test]
    fn test_missing_section_is_not_fatal() {
        let err = EditorError::MissingManifestSection("Checksums".to_string());
        assert!(!err.is_fatal());
        assert_eq!(err.category(), ErrorCategory::Package);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            EditorError::SourceNotFound(PathBuf::from("/nope")).exit_code(),
            EXIT_USAGE
        );
        assert_eq!(
            EditorError::UnknownSelection("--Bogus".to_string()).exit_code(),
            EXIT_USAGE
        );
        assert_eq!(
            EditorError::IntegrityFailure {
                expected: "A".to_string(),
                actual: "B".to_string()
            }
            .exit_code(),
            EXIT_INTEGRITY
        );
        assert_eq!(
            EditorError::Archive("corrupt".to_string()).exit_code(),
            EXIT_FAILURE
        );
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
    }

    #[test]
    fn test_shows_usage() {
        assert!(EditorError::UnknownSelection("--x".to_string()).shows_usage());
        assert!(EditorError::Usage("missing".to_string()).shows_usage());
        assert!(!EditorError::SourceNotFound(PathBuf::from("a")).shows_usage());
    }

    #[test]
    fn test_error_display() {
        let err = EditorError::SourceNotFound(PathBuf::from("db.bacpac"));
        assert_eq!(err.to_string(), "File 'db.bacpac' does not exist");

        let err = EditorError::Parse {
            path: PathBuf::from("model.xml"),
            message: "unexpected end".to_string(),
        };
        assert!(err.to_string().contains("model.xml"));
        assert!(err.to_string().contains("unexpected end"));

        let err = EditorError::MissingResource("model.xml".to_string());
        assert_eq!(err.to_string(), "model.xml not found in package");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: EditorError = io_err.into();

        match &err {
            EditorError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("Expected EditorError::Io, got {:?}", other),
        }
        assert_eq!(err.category(), ErrorCategory::IoError);
    }

    #[test]
    fn test_from_zip_error() {
        let err: EditorError =
            zip::result::ZipError::InvalidArchive("no central directory".into()).into();
        assert!(matches!(err, EditorError::Archive(_)));
        assert_eq!(err.category().to_string(), "archive");
    }
}
