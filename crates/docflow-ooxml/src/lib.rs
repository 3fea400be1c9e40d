//! # docflow-ooxml
//!
//! WordprocessingML (DOCX) handling for docflow.
//!
//! This crate provides functionality to:
//! - Unpack and repack DOCX packages with byte-stable output
//! - Fill `{placeholder}` templates, including placeholders split across runs
//! - Export a rich-text document model to DOCX and import it back
//!
//! ## Example: Filling a Template
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use docflow_ooxml::{DocxTemplate, FillOptions};
//!
//! let template = DocxTemplate::from_bytes(&std::fs::read("template.docx")?)?;
//! let mut data = BTreeMap::new();
//! data.insert("companyName".to_string(), "Acme".to_string());
//!
//! let rendered = template.render(&data, &FillOptions::default())?;
//! std::fs::write("filled_document.docx", rendered.document)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod error;
pub mod reader;
pub mod rich_text;
pub mod template;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use archive::OoxmlArchive;
pub use error::{OoxmlError, Result};
pub use reader::DocxReader;
pub use rich_text::{Alignment, RichBlock, RichDocument, RunMarks, TextRun, VertAlign};
pub use template::{
    fill_bound_text, Bindings, Delimiters, DocxTemplate, FillOptions, MissingPolicy, Rendered,
};
pub use writer::DocxWriter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
