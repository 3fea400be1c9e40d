//! docflow CLI library
//!
//! Command implementations for the `docflow` binary. Every command drives
//! a [`docflow_core::PageSession`] the same way an interactive host does,
//! so the CLI exercises the same uploads, notices and autosave as any
//! other front end.
//!
//! # Library Usage
//!
//! ```ignore
//! use std::path::Path;
//! use docflow_cli::fill_command;
//! use docflow_core::{PageId, Settings};
//!
//! let fields = vec![("companyName".to_string(), "Acme".to_string())];
//! fill_command(
//!     &Settings::default(),
//!     Path::new("template.docx"),
//!     PageId::Docxtemplater,
//!     &fields,
//!     Path::new("out"),
//!     None,
//! )?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Fill a DOCX template
//! docflow fill template.docx --set companyName=Acme
//! docflow fill quick-report.docx --page docx-templates --name report.docx
//!
//! # Render the company report from the saved record
//! docflow report --output out/
//!
//! # Fill a form over an uploaded PDF
//! docflow form --base letterhead.pdf --set title="Supply agreement"
//!
//! # Convert between DOCX and rich-text JSON
//! docflow import notes.docx --output notes.json
//! docflow export notes.json
//!
//! # Read a PDF page
//! docflow view generated_document.pdf --page 2
//!
//! # Saved form records
//! docflow record set report companyName=Acme
//! docflow record get report
//! docflow record reset report
//! ```

pub mod app;

pub use app::{
    export_command, fill_command, form_command, import_command, pages_command,
    record_get_command, record_reset_command, record_set_command, report_command, run_cli,
    view_command, DocxPage,
};
