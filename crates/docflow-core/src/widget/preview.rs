//! Read-only preview of a generated artifact

use docflow_ooxml::DocxReader;
use docflow_pdf::PdfInfo;

use super::surface::Surface;
use super::Widget;
use crate::artifact::{ArtifactBuffer, MimeKind};
use crate::error::Result;

/// Renders the text of a DOCX or PDF artifact
#[derive(Debug)]
pub struct DocumentPreview {
    digest: String,
    lines: usize,
}

impl DocumentPreview {
    /// Digest of the previewed artifact
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Number of lines rendered
    pub fn line_count(&self) -> usize {
        self.lines
    }
}

/// Extracted text of an artifact
pub fn artifact_text(artifact: &ArtifactBuffer) -> Result<String> {
    match artifact.kind() {
        MimeKind::Docx => Ok(DocxReader::read(artifact.bytes())?.plain_text()),
        MimeKind::Pdf => Ok(PdfInfo::load(artifact.bytes())?.text()?),
    }
}

impl Widget for DocumentPreview {
    type Props = ArtifactBuffer;

    fn construct(props: &ArtifactBuffer, surface: &mut dyn Surface) -> Result<Self> {
        let text = artifact_text(props)?;
        let mut lines = 0;
        for line in text.lines() {
            surface.append(line);
            lines += 1;
        }
        Ok(Self {
            digest: props.digest().to_string(),
            lines,
        })
    }

    fn unchanged(current: &ArtifactBuffer, next: &ArtifactBuffer) -> bool {
        current.kind() == next.kind() && current.digest() == next.digest()
    }
}
