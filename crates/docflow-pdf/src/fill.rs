//! Drawing input values into a form template

use std::collections::BTreeMap;

use lopdf::Document;
use tracing::debug;

use crate::document::{
    append_blank_pages, blank_document, ensure_font, load, overlay_content, page_ids, page_size,
    save, A4_HEIGHT, A4_WIDTH,
};
use crate::error::{PdfError, Result};
use crate::layout::{mm_to_pt, TextBlock};
use crate::schema::{BasePdf, FormTemplate};

/// Output of a fill
#[derive(Debug, Clone)]
pub struct FillOutput {
    /// The filled PDF
    pub pdf: Vec<u8>,
    /// Field names with no value in the inputs (in template order)
    pub missing: Vec<String>,
}

/// Fills [`FormTemplate`]s
pub struct FormFiller;

impl FormFiller {
    /// Draw `inputs` into a copy of the template's base document
    ///
    /// Blank bases get one A4 page per schema page. Uploaded bases must
    /// have at least as many pages as the template has schema pages.
    pub fn fill(template: &FormTemplate, inputs: &BTreeMap<String, String>) -> Result<FillOutput> {
        template.validate()?;
        let mut doc = base_document(template)?;
        let pages = page_ids(&doc);
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }
        if template.schemas.len() > pages.len() {
            return Err(PdfError::PageOutOfRange {
                page: template.schemas.len(),
                count: pages.len(),
            });
        }

        let mut missing = Vec::new();
        for (fields, &page_id) in template.schemas.iter().zip(&pages) {
            let (_, page_height) = page_size(&doc, page_id);
            let mut operations = Vec::new();

            for field in fields {
                let value = match inputs.get(&field.name) {
                    Some(value) => value.as_str(),
                    None => {
                        if !missing.contains(&field.name) {
                            missing.push(field.name.clone());
                        }
                        continue;
                    }
                };
                if value.is_empty() {
                    continue;
                }

                let block = TextBlock {
                    x: mm_to_pt(field.position.x),
                    top: page_height - mm_to_pt(field.position.y),
                    width: mm_to_pt(field.width),
                    height: mm_to_pt(field.height),
                    font_size: field.font_size(),
                };
                let lines = block.fit_lines(value);
                operations.extend(block.operations(&lines));
            }

            if !operations.is_empty() {
                ensure_font(&mut doc, page_id)?;
                overlay_content(&mut doc, page_id, operations)?;
            }
        }

        debug!(
            pages = template.schemas.len(),
            missing = missing.len(),
            "filled form template"
        );
        Ok(FillOutput {
            pdf: save(&mut doc)?,
            missing,
        })
    }
}

fn base_document(template: &FormTemplate) -> Result<Document> {
    match &template.base_pdf {
        BasePdf::Blank => Ok(blank_document(template.schemas.len().max(1))),
        BasePdf::Bytes(bytes) => load(bytes),
    }
}

/// Blank base for a template, padded to the template's page count
pub fn blank_base(pages: usize) -> Result<Vec<u8>> {
    let mut doc = blank_document(1);
    append_blank_pages(&mut doc, pages.saturating_sub(1), (A4_WIDTH, A4_HEIGHT))?;
    save(&mut doc)
}
