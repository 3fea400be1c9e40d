//! # docflow-pdf
//!
//! PDF engines for docflow, built on `lopdf`.
//!
//! This crate provides functionality to:
//! - Create blank A4 base documents
//! - Fill schema-based form templates (fields positioned in millimetres)
//! - Render labelled `Label: value` reports
//! - Inspect PDFs: page count, page size and page text
//!
//! ## Example: Filling a Form
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use docflow_pdf::{FieldSchema, FormFiller, FormTemplate};
//!
//! let template = FormTemplate::blank(vec![
//!     FieldSchema::text("title", 10.0, 30.0, 190.0, 20.0),
//! ]);
//! let mut inputs = BTreeMap::new();
//! inputs.insert("title".to_string(), "Supply agreement".to_string());
//!
//! let output = FormFiller::fill(&template, &inputs)?;
//! std::fs::write("generated_document.pdf", output.pdf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod error;
pub mod fill;
pub mod font;
pub mod inspect;
pub mod layout;
pub mod report;
pub mod schema;

pub use document::blank_a4;
pub use error::{PdfError, Result};
pub use fill::{blank_base, FillOutput, FormFiller};
pub use inspect::PdfInfo;
pub use layout::{mm_to_pt, pt_to_mm};
pub use report::{ReportLayout, ReportOutput, ReportRow};
pub use schema::{BasePdf, FieldKind, FieldSchema, FormTemplate, Position, BLANK_PDF};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
