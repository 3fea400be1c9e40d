//! Error taxonomy shared by every page
//!
//! Engine crates report their own errors; they are classified into this
//! taxonomy at the crate boundary so a page only ever deals with one type.

use std::fmt;

use docflow_ooxml::OoxmlError;
use docflow_pdf::PdfError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to a page
#[derive(Error, Debug)]
pub enum Error {
    /// Upload with an extension the page does not accept
    #[error("Invalid file type: {name} (expected a .{expected} file)")]
    InvalidFileType { name: String, expected: String },

    /// Upload could not be read
    #[error("Failed to read {name}: {source}")]
    ReadError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Download could not be written
    #[error("Failed to write {name}: {source}")]
    WriteError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Template bytes are not a usable container or layout
    #[error("Invalid template: {0}")]
    TemplateInvalid(String),

    /// A referenced field has no value and the policy forbids blanking it
    #[error("No value for field \"{field}\"")]
    DataMissing { field: String },

    /// The generation engine failed
    #[error("Engine failure: {0}")]
    EngineFailure(String),

    /// An external widget could not be constructed
    #[error("Widget construction failed: {0}")]
    WidgetConstructionFailure(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable store could not be read or written
    #[error("Store error: {0}")]
    Store(String),
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::MissingValue { field } => Error::DataMissing { field },
            err if err.is_container_error() => Error::TemplateInvalid(err.to_string()),
            err => Error::EngineFailure(err.to_string()),
        }
    }
}

impl From<PdfError> for Error {
    fn from(err: PdfError) -> Self {
        if err.is_template_error() {
            Error::TemplateInvalid(err.to_string())
        } else {
            Error::EngineFailure(err.to_string())
        }
    }
}

/// How prominently a notice is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A user-facing message produced at the page boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

impl Error {
    /// The notice shown to the user for this error
    pub fn notice(&self) -> Notice {
        let severity = match self {
            Error::DataMissing { .. } => Severity::Warning,
            _ => Severity::Error,
        };
        let message = match self {
            Error::InvalidFileType { expected, .. } => {
                format!("Please select a valid .{} file.", expected)
            }
            other => other.to_string(),
        };
        Notice { severity, message }
    }
}

/// Result type for docflow operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ooxml_container_errors_are_template_errors() {
        let err: Error = OoxmlError::MissingFile("word/document.xml".into()).into();
        assert!(matches!(err, Error::TemplateInvalid(_)));
    }

    #[test]
    fn test_ooxml_missing_value_is_data_missing() {
        let err: Error = OoxmlError::MissingValue {
            field: "companyName".into(),
        }
        .into();
        assert!(matches!(err, Error::DataMissing { field } if field == "companyName"));
    }

    #[test]
    fn test_ooxml_tag_errors_are_engine_failures() {
        let err: Error = OoxmlError::UnclosedTag { tag: "{name".into() }.into();
        assert!(matches!(err, Error::EngineFailure(_)));
    }

    #[test]
    fn test_pdf_errors_classified() {
        let err: Error = PdfError::NoPages.into();
        assert!(matches!(err, Error::TemplateInvalid(_)));
        let err: Error = PdfError::PageOutOfRange { page: 3, count: 1 }.into();
        assert!(matches!(err, Error::EngineFailure(_)));
    }

    #[test]
    fn test_invalid_file_type_notice() {
        let notice = Error::InvalidFileType {
            name: "notes.txt".into(),
            expected: "docx".into(),
        }
        .notice();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.message, "Please select a valid .docx file.");
    }

    #[test]
    fn test_data_missing_is_a_warning() {
        let notice = Error::DataMissing {
            field: "title".into(),
        }
        .notice();
        assert_eq!(notice.severity, Severity::Warning);
        assert_eq!(notice.to_string(), "warning: No value for field \"title\"");
    }
}
