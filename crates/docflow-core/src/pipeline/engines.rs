use docflow_ooxml::{
    fill_bound_text, Delimiters, DocxTemplate, DocxWriter, FillOptions, MissingPolicy,
    RichDocument,
};
use docflow_pdf::{FormFiller, FormTemplate, ReportLayout};
use tracing::debug;

use super::DocumentEngine;
use crate::artifact::MimeKind;
use crate::error::{Error, Result};
use crate::record::FormRecord;

/// Apply the missing-value policy to a lenient engine's report
fn check_missing(engine: &str, policy: MissingPolicy, missing: &[String]) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    match policy {
        MissingPolicy::Empty => {
            debug!(engine, fields = ?missing, "substituted empty values");
            Ok(())
        }
        MissingPolicy::Error => Err(Error::DataMissing {
            field: missing[0].clone(),
        }),
    }
}

fn utf8_template(template: &[u8]) -> Result<&str> {
    std::str::from_utf8(template)
        .map_err(|e| Error::TemplateInvalid(format!("template is not UTF-8: {}", e)))
}

/// `{placeholder}` substitution in an uploaded DOCX
#[derive(Debug, Clone, Default)]
pub struct DocxTemplateEngine {
    options: FillOptions,
}

impl DocxTemplateEngine {
    pub fn new(options: FillOptions) -> Self {
        Self { options }
    }
}

impl DocumentEngine for DocxTemplateEngine {
    fn name(&self) -> &'static str {
        "docx-template"
    }

    fn output_kind(&self) -> MimeKind {
        MimeKind::Docx
    }

    fn generate(&self, template: &[u8], record: &FormRecord) -> Result<Vec<u8>> {
        let template = DocxTemplate::from_bytes(template)?;
        let rendered = template.render(record, &self.options)?;
        check_missing(self.name(), self.options.missing, &rendered.missing)?;
        Ok(rendered.document)
    }
}

/// Schema-based PDF form fill; the template is a [`FormTemplate`] JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct FormFillEngine {
    missing: MissingPolicy,
}

impl FormFillEngine {
    pub fn new(missing: MissingPolicy) -> Self {
        Self { missing }
    }
}

impl DocumentEngine for FormFillEngine {
    fn name(&self) -> &'static str {
        "form-fill"
    }

    fn output_kind(&self) -> MimeKind {
        MimeKind::Pdf
    }

    fn generate(&self, template: &[u8], record: &FormRecord) -> Result<Vec<u8>> {
        let template = FormTemplate::from_json(utf8_template(template)?)?;
        let output = FormFiller::fill(&template, record.as_map())?;
        check_missing(self.name(), self.missing, &output.missing)?;
        Ok(output.pdf)
    }
}

/// Labelled PDF report; the template is a [`ReportLayout`] JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportEngine {
    missing: MissingPolicy,
}

impl ReportEngine {
    pub fn new(missing: MissingPolicy) -> Self {
        Self { missing }
    }
}

impl DocumentEngine for ReportEngine {
    fn name(&self) -> &'static str {
        "report"
    }

    fn output_kind(&self) -> MimeKind {
        MimeKind::Pdf
    }

    fn generate(&self, template: &[u8], record: &FormRecord) -> Result<Vec<u8>> {
        let layout: ReportLayout = serde_json::from_slice(template)
            .map_err(|e| Error::TemplateInvalid(format!("report layout: {}", e)))?;
        let output = layout.render(record.as_map())?;
        check_missing(self.name(), self.missing, &output.missing)?;
        Ok(output.pdf)
    }
}

/// Rich-text document to DOCX; the template is a [`RichDocument`] JSON
///
/// Text is exported as typed. With [`with_fields`](Self::with_fields),
/// placeholders naming a record field are filled first; any other
/// delimited text stays untouched.
#[derive(Debug, Clone, Default)]
pub struct RichTextEngine {
    fields: Option<Delimiters>,
}

impl RichTextEngine {
    /// Export without touching the text
    pub fn plain() -> Self {
        Self::default()
    }

    /// Fill record fields marked by `delimiters` before export
    pub fn with_fields(delimiters: Delimiters) -> Self {
        Self {
            fields: Some(delimiters),
        }
    }
}

impl DocumentEngine for RichTextEngine {
    fn name(&self) -> &'static str {
        "rich-text"
    }

    fn output_kind(&self) -> MimeKind {
        MimeKind::Docx
    }

    fn generate(&self, template: &[u8], record: &FormRecord) -> Result<Vec<u8>> {
        let mut document = RichDocument::from_json(utf8_template(template)?)
            .map_err(|e| Error::TemplateInvalid(format!("rich-text document: {}", e)))?;

        if let Some(delimiters) = &self.fields {
            for block in &mut document.blocks {
                for run in block.runs_mut() {
                    run.text = fill_bound_text(&run.text, record, delimiters);
                }
            }
        }
        Ok(DocxWriter::generate(&document)?)
    }
}
