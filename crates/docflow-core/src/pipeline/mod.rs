//! Template + data record to document bytes
//!
//! A [`DocumentPipeline`] wraps one [`DocumentEngine`] and turns its raw
//! output into an [`ArtifactBuffer`]. Engines never see the pipeline's
//! filename and never keep state between calls, so the same template can
//! be regenerated with different data.

mod engines;

pub use engines::{DocxTemplateEngine, FormFillEngine, ReportEngine, RichTextEngine};

use tracing::debug;

use crate::artifact::{ArtifactBuffer, MimeKind};
use crate::error::{Error, Result};
use crate::record::FormRecord;

/// A document generation backend
pub trait DocumentEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Kind of document produced
    fn output_kind(&self) -> MimeKind;

    /// Generate document bytes from template bytes and a record
    ///
    /// Malformed templates fail with [`Error::TemplateInvalid`].
    fn generate(&self, template: &[u8], record: &FormRecord) -> Result<Vec<u8>>;
}

/// One engine plus the filename of what it produces
pub struct DocumentPipeline {
    engine: Box<dyn DocumentEngine>,
    filename: String,
}

impl DocumentPipeline {
    pub fn new(engine: impl DocumentEngine + 'static, filename: impl Into<String>) -> Self {
        Self {
            engine: Box::new(engine),
            filename: filename.into(),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn output_kind(&self) -> MimeKind {
        self.engine.output_kind()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Run the engine; no artifact exists unless generation succeeded
    pub fn generate(&self, template: &[u8], record: &FormRecord) -> Result<ArtifactBuffer> {
        if template.is_empty() {
            return Err(Error::TemplateInvalid("template is empty".to_string()));
        }
        let bytes = self.engine.generate(template, record)?;
        let artifact = ArtifactBuffer::new(bytes, self.engine.output_kind(), &self.filename);
        debug!(
            engine = self.engine.name(),
            filename = %self.filename,
            bytes = artifact.len(),
            digest = %artifact.digest(),
            "generated document"
        );
        Ok(artifact)
    }
}
