//! Paged PDF viewer with zoom

use docflow_pdf::PdfInfo;

use super::surface::Surface;
use super::Widget;
use crate::artifact::{ArtifactBuffer, MimeKind};
use crate::error::{Error, Result};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const SCALE_STEP: f32 = 0.25;
/// Scale a document opens at
pub const DEFAULT_SCALE: f32 = 1.5;

/// Shows one page of a PDF at a time
pub struct PdfViewer {
    info: PdfInfo,
    digest: String,
    page: usize,
    scale: f32,
}

impl PdfViewer {
    pub fn page_count(&self) -> usize {
        self.info.page_count()
    }

    /// Current page, 1-based
    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Advance one page; stays put on the last page
    pub fn next_page(&mut self, surface: &mut dyn Surface) -> Result<()> {
        if self.page < self.page_count() {
            self.page += 1;
            self.render(surface)?;
        }
        Ok(())
    }

    /// Go back one page; stays put on the first page
    pub fn prev_page(&mut self, surface: &mut dyn Surface) -> Result<()> {
        if self.page > 1 {
            self.page -= 1;
            self.render(surface)?;
        }
        Ok(())
    }

    pub fn go_to(&mut self, page: usize, surface: &mut dyn Surface) -> Result<()> {
        if page == 0 || page > self.page_count() {
            return Err(Error::EngineFailure(format!(
                "page {} is out of range (1-{})",
                page,
                self.page_count()
            )));
        }
        self.page = page;
        self.render(surface)
    }

    pub fn zoom_in(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.set_scale(self.scale + SCALE_STEP, surface)
    }

    pub fn zoom_out(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.set_scale(self.scale - SCALE_STEP, surface)
    }

    fn set_scale(&mut self, scale: f32, surface: &mut dyn Surface) -> Result<()> {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        if scale == self.scale {
            return Ok(());
        }
        self.scale = scale;
        self.render(surface)
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<()> {
        let text = self.info.page_text(self.page)?;
        surface.reset();
        surface.append(&format!(
            "Page {} of {} ({:.0}%)",
            self.page,
            self.page_count(),
            self.scale * 100.0
        ));
        for line in text.lines() {
            surface.append(line);
        }
        Ok(())
    }
}

impl Widget for PdfViewer {
    type Props = ArtifactBuffer;

    fn construct(props: &ArtifactBuffer, surface: &mut dyn Surface) -> Result<Self> {
        if props.kind() != MimeKind::Pdf {
            return Err(Error::InvalidFileType {
                name: props.filename().to_string(),
                expected: MimeKind::Pdf.extension().to_string(),
            });
        }
        let viewer = Self {
            info: PdfInfo::load(props.bytes())?,
            digest: props.digest().to_string(),
            page: 1,
            scale: DEFAULT_SCALE,
        };
        viewer.render(surface)?;
        Ok(viewer)
    }

    fn unchanged(current: &ArtifactBuffer, next: &ArtifactBuffer) -> bool {
        current.digest() == next.digest()
    }
}
