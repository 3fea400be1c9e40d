//! Catalogue of demo pages
//!
//! Every page is described by a [`PageSpec`]: where its form record is
//! persisted, what it accepts as an upload, what it downloads and which
//! engine generates its document.

use std::fmt;
use std::str::FromStr;

use docflow_ooxml::{RichBlock, RichDocument};
use docflow_pdf::{FieldSchema, FormTemplate, ReportLayout, ReportRow};

use crate::artifact::MimeKind;
use crate::config::Settings;
use crate::error::Error;
use crate::pipeline::{
    DocumentPipeline, DocxTemplateEngine, FormFillEngine, ReportEngine, RichTextEngine,
};
use crate::record::FormRecord;

/// Identity of a demo page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    /// Labelled company/client report rendered to PDF
    Report,
    /// Field designer and form fill over a base PDF
    FormDesigner,
    /// `{placeholder}` fill of an uploaded DOCX
    Docxtemplater,
    /// `{placeholder}` fill of an uploaded DOCX, with autosave
    DocxTemplates,
    /// Rich-text document exported to DOCX
    RichText,
    /// Canvas rich-text editor
    CanvasEditor,
    /// Paged PDF viewer
    PdfViewer,
    /// Plain preview of an uploaded PDF
    NativeViewer,
}

impl PageId {
    pub const ALL: [PageId; 8] = [
        PageId::Report,
        PageId::FormDesigner,
        PageId::Docxtemplater,
        PageId::DocxTemplates,
        PageId::RichText,
        PageId::CanvasEditor,
        PageId::PdfViewer,
        PageId::NativeViewer,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            PageId::Report => "report",
            PageId::FormDesigner => "form",
            PageId::Docxtemplater => "docxtemplater",
            PageId::DocxTemplates => "docx-templates",
            PageId::RichText => "rich-text",
            PageId::CanvasEditor => "canvas",
            PageId::PdfViewer => "pdf-viewer",
            PageId::NativeViewer => "native-viewer",
        }
    }

    /// Navigation title
    pub fn title(self) -> &'static str {
        match self {
            PageId::Report => "Report",
            PageId::FormDesigner => "Form designer",
            PageId::Docxtemplater => "DOCX template",
            PageId::DocxTemplates => "DOCX template (autosave)",
            PageId::RichText => "Rich text",
            PageId::CanvasEditor => "Canvas editor",
            PageId::PdfViewer => "PDF viewer",
            PageId::NativeViewer => "Native PDF viewer",
        }
    }

    pub fn spec(self) -> PageSpec {
        let (storage_key, download, upload) = match self {
            PageId::Report => (
                Some("page1FormData"),
                Some("generated_document.pdf"),
                None,
            ),
            PageId::FormDesigner => (
                Some("page2FormData"),
                Some("generated_document.pdf"),
                Some(MimeKind::Pdf),
            ),
            PageId::Docxtemplater => (None, Some("filled_document.docx"), Some(MimeKind::Docx)),
            PageId::DocxTemplates => (
                Some("page4FormData"),
                Some("filled_document.docx"),
                Some(MimeKind::Docx),
            ),
            PageId::RichText | PageId::CanvasEditor => {
                (None, Some("document.docx"), Some(MimeKind::Docx))
            }
            PageId::PdfViewer | PageId::NativeViewer => (None, None, Some(MimeKind::Pdf)),
        };
        PageSpec {
            id: self,
            storage_key,
            download,
            upload,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|page| page.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = PageId::ALL.iter().map(|p| p.slug()).collect();
                Error::Config(format!(
                    "unknown page \"{}\" (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Static description of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pub id: PageId,
    /// Key of the persisted form record, for pages that autosave
    pub storage_key: Option<&'static str>,
    /// Suggested download filename
    pub download: Option<&'static str>,
    /// Accepted upload kind
    pub upload: Option<MimeKind>,
}

impl PageSpec {
    /// Field values a fresh page starts with
    pub fn seed(&self) -> FormRecord {
        match self.id {
            PageId::Report
            | PageId::Docxtemplater
            | PageId::DocxTemplates
            | PageId::RichText => company_seed(),
            PageId::FormDesigner => contract_seed(),
            PageId::CanvasEditor | PageId::PdfViewer | PageId::NativeViewer => FormRecord::new(),
        }
    }

    /// Generation pipeline, for pages that produce a document
    pub fn pipeline(&self, settings: &Settings) -> Option<DocumentPipeline> {
        let filename = self.download?;
        let options = settings.fill_options();
        let missing = options.missing;
        let pipeline = match self.id {
            PageId::Report => DocumentPipeline::new(ReportEngine::new(missing), filename),
            PageId::FormDesigner => DocumentPipeline::new(FormFillEngine::new(missing), filename),
            PageId::Docxtemplater | PageId::DocxTemplates => {
                DocumentPipeline::new(DocxTemplateEngine::new(options), filename)
            }
            PageId::RichText => DocumentPipeline::new(
                RichTextEngine::with_fields(options.delimiters),
                filename,
            ),
            PageId::CanvasEditor => DocumentPipeline::new(RichTextEngine::plain(), filename),
            PageId::PdfViewer | PageId::NativeViewer => return None,
        };
        Some(pipeline)
    }
}

/// Company and client details shared by the report and DOCX pages
pub fn company_seed() -> FormRecord {
    FormRecord::from_pairs([
        ("companyName", "Festcloud.ai"),
        ("companyAddress", "Lviv, Ukraine"),
        ("companyPhoneNumber", "032-12345678"),
        ("clientCompanyName", "Zahidfest"),
        ("clientAddress", "Lviv, Ukraine"),
        ("clientPhoneNumber", "032-87654321"),
    ])
}

/// Empty contract fields of the form designer page
pub fn contract_seed() -> FormRecord {
    FormRecord::from_pairs([("title", ""), ("client", ""), ("details", "")])
}

/// Rows of the company report
pub fn company_report_layout() -> ReportLayout {
    ReportLayout::with_rows(vec![
        ReportRow::new("Company", "companyName"),
        ReportRow::new("Address", "companyAddress"),
        ReportRow::new("Phone", "companyPhoneNumber"),
        ReportRow::new("Client", "clientCompanyName"),
        ReportRow::new("Client Address", "clientAddress"),
        ReportRow::new("Client Phone", "clientPhoneNumber"),
    ])
}

/// Contract form on a blank A4 page
pub fn contract_template() -> FormTemplate {
    FormTemplate::blank(vec![
        FieldSchema::text("title", 10.0, 30.0, 190.0, 20.0),
        FieldSchema::text("client", 10.0, 60.0, 190.0, 20.0),
        FieldSchema::text("details", 10.0, 90.0, 190.0, 60.0),
    ])
}

/// Starting document of the rich-text page
pub fn starter_document() -> RichDocument {
    RichDocument {
        blocks: vec![
            RichBlock::heading(1, "Service agreement"),
            RichBlock::paragraph("Provider: {companyName}, {companyAddress}"),
            RichBlock::paragraph("Client: {clientCompanyName}, {clientAddress}"),
        ],
    }
}
