//! Generated and uploaded document bytes

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// MIME type of DOCX outputs
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of PDF outputs
pub const PDF_MIME: &str = "application/pdf";

/// Document container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Docx,
    Pdf,
}

impl MimeKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            MimeKind::Docx => DOCX_MIME,
            MimeKind::Pdf => PDF_MIME,
        }
    }

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            MimeKind::Docx => "docx",
            MimeKind::Pdf => "pdf",
        }
    }

    /// Kind implied by a file name's extension, ignoring case
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(MimeKind::Docx),
            "pdf" => Some(MimeKind::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for MimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Immutable document bytes with their kind and suggested filename
///
/// Cloning shares the underlying bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactBuffer {
    bytes: Arc<[u8]>,
    kind: MimeKind,
    filename: String,
    digest: String,
}

impl ArtifactBuffer {
    pub fn new(bytes: Vec<u8>, kind: MimeKind, filename: impl Into<String>) -> Self {
        let digest = hex_digest(&bytes);
        Self {
            bytes: bytes.into(),
            kind,
            filename: filename.into(),
            digest,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> MimeKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the contents, lowercase hex
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Same contents under another download name
    pub fn renamed(&self, filename: impl Into<String>) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            kind: self.kind,
            filename: filename.into(),
            digest: self.digest.clone(),
        }
    }
}

impl fmt::Debug for ArtifactBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBuffer")
            .field("kind", &self.kind)
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .field("digest", &self.digest)
            .finish()
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
