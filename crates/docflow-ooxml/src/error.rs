//! Error types for OOXML operations

use thiserror::Error;

/// Errors that can occur during OOXML operations
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required file not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// An opening delimiter with no matching closing delimiter in its paragraph
    #[error("Unclosed tag near \"{tag}\"")]
    UnclosedTag { tag: String },

    /// A closing delimiter with no opening delimiter before it
    #[error("Unopened tag near \"{context}\"")]
    UnopenedTag { context: String },

    /// A placeholder has no bound value and the policy forbids blanking it
    #[error("No value bound for placeholder \"{field}\"")]
    MissingValue { field: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OoxmlError {
    /// Whether the error means the input was not a usable DOCX container
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            OoxmlError::Archive(_)
                | OoxmlError::Io(_)
                | OoxmlError::Xml(_)
                | OoxmlError::MissingFile(_)
                | OoxmlError::InvalidStructure(_)
        )
    }
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
