//! Error types for PDF operations

use thiserror::Error;

/// Errors that can occur while building or reading PDFs
#[derive(Error, Debug)]
pub enum PdfError {
    /// The supplied bytes could not be parsed as a PDF
    #[error("Failed to load PDF: {0}")]
    Load(lopdf::Error),

    /// Error while manipulating or serializing a PDF
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Error writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template JSON could not be parsed or produced
    #[error("Template JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base PDF data URI had an invalid payload
    #[error("Invalid base PDF encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The template is structurally unusable
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// The document has no pages
    #[error("PDF has no pages")]
    NoPages,

    /// A page number outside the document was requested
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
}

impl PdfError {
    /// Whether the error means the input template or base document was unusable
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            PdfError::Load(_)
                | PdfError::Json(_)
                | PdfError::Base64(_)
                | PdfError::InvalidTemplate(_)
                | PdfError::NoPages
        )
    }
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
