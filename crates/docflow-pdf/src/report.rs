//! Labelled report generation
//!
//! A [`ReportLayout`] lists `(label, field)` rows; rendering writes one
//! `Label: value` section per row onto A4 pages, continuing onto new pages
//! when the content runs past the bottom margin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{
    append_blank_pages, blank_document, ensure_font, overlay_content, page_ids, save, A4_HEIGHT,
    A4_WIDTH,
};
use crate::error::Result;
use crate::layout::{wrap_text, TextBlock, LINE_HEIGHT};

/// One labelled line of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub field: String,
}

impl ReportRow {
    pub fn new(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
        }
    }
}

/// Report page layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    /// Optional heading drawn above the rows
    pub title: Option<String>,
    pub rows: Vec<ReportRow>,
    /// Page padding in points
    pub padding: f32,
    /// Body font size in points
    pub font_size: f32,
    /// Space after each row in points
    pub section_gap: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            title: None,
            rows: Vec::new(),
            padding: 30.0,
            font_size: 12.0,
            section_gap: 10.0,
        }
    }
}

/// Output of a report render
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub pdf: Vec<u8>,
    /// Fields referenced by rows but absent from the record
    pub missing: Vec<String>,
}

impl ReportLayout {
    /// Layout with the given rows and default styling
    pub fn with_rows(rows: Vec<ReportRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Render the report for `record`
    pub fn render(&self, record: &BTreeMap<String, String>) -> Result<ReportOutput> {
        let mut missing = Vec::new();
        let mut sections: Vec<(String, f32)> = Vec::new();

        if let Some(title) = &self.title {
            sections.push((title.clone(), self.font_size * 1.5));
        }
        for row in &self.rows {
            let value = match record.get(&row.field) {
                Some(value) => value.as_str(),
                None => {
                    if !missing.contains(&row.field) {
                        missing.push(row.field.clone());
                    }
                    ""
                }
            };
            let line = format!("{}: {}", row.label, value);
            sections.push((line.trim_end().to_string(), self.font_size));
        }

        let width = A4_WIDTH - 2.0 * self.padding;
        let bottom = self.padding;
        let mut pages: Vec<Vec<lopdf::content::Operation>> = vec![Vec::new()];
        let mut cursor = A4_HEIGHT - self.padding;

        for (text, size) in sections {
            let lines = wrap_text(&text, width, size);
            let needed = size + (lines.len().saturating_sub(1)) as f32 * size * LINE_HEIGHT;

            let on_fresh_page = cursor >= A4_HEIGHT - self.padding;
            if cursor - needed < bottom && !on_fresh_page {
                pages.push(Vec::new());
                cursor = A4_HEIGHT - self.padding;
            }

            let block = TextBlock {
                x: self.padding,
                top: cursor,
                width,
                height: needed,
                font_size: size,
            };
            if let Some(ops) = pages.last_mut() {
                ops.extend(block.operations(&lines));
            }
            cursor -= needed + self.section_gap;
        }

        let mut doc = blank_document(1);
        append_blank_pages(&mut doc, pages.len() - 1, (A4_WIDTH, A4_HEIGHT))?;
        let ids = page_ids(&doc);
        for (page_id, operations) in ids.into_iter().zip(pages) {
            if !operations.is_empty() {
                ensure_font(&mut doc, page_id)?;
                overlay_content(&mut doc, page_id, operations)?;
            }
        }

        debug!(rows = self.rows.len(), missing = missing.len(), "rendered report");
        Ok(ReportOutput {
            pdf: save(&mut doc)?,
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::PdfInfo;

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_labelled_rows() {
        let layout = ReportLayout::with_rows(vec![
            ReportRow::new("Company", "companyName"),
            ReportRow::new("Client Phone", "clientPhoneNumber"),
        ]);
        let out = layout
            .render(&record(&[
                ("companyName", "Acme"),
                ("clientPhoneNumber", "032-87654321"),
            ]))
            .unwrap();

        let text = PdfInfo::load(&out.pdf).unwrap().text().unwrap();
        assert_eq!(text, "Company: Acme\nClient Phone: 032-87654321");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let layout = ReportLayout::with_rows(vec![ReportRow::new("Company", "companyName")]);
        let out = layout.render(&record(&[])).unwrap();
        assert_eq!(out.missing, vec!["companyName"]);
        let text = PdfInfo::load(&out.pdf).unwrap().text().unwrap();
        assert_eq!(text, "Company:");
    }

    #[test]
    fn test_long_reports_continue_on_new_pages() {
        let rows = (0..80)
            .map(|i| ReportRow::new(format!("Row {i}"), "v"))
            .collect();
        let out = ReportLayout::with_rows(rows)
            .render(&record(&[("v", "x")]))
            .unwrap();
        let info = PdfInfo::load(&out.pdf).unwrap();
        assert!(info.page_count() > 1);
        assert!(info.page_text(info.page_count()).unwrap().contains("Row 79: x"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let layout = ReportLayout::with_rows(vec![ReportRow::new("Company", "companyName")]);
        let data = record(&[("companyName", "Acme")]);
        assert_eq!(
            layout.render(&data).unwrap().pdf,
            layout.render(&data).unwrap().pdf
        );
    }
}
