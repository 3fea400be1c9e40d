//! # docflow-core
//!
//! The pieces every docflow page is built from:
//!
//! - [`ArtifactBuffer`]: immutable document bytes with their MIME kind
//! - [`TemplateBindingStore`]: form records persisted per page with debounced saves
//! - [`DocumentPipeline`]: template + record to document, over pluggable engines
//! - [`WidgetController`]: mount, update and teardown of one widget per surface
//! - [`bridge`]: upload checks and transient download references
//! - [`PageSession`]: a page wiring all of the above, turning errors into notices
//!
//! ## Example: Filling a DOCX template
//!
//! ```no_run
//! use docflow_core::{DocumentPipeline, DocxTemplateEngine, FormRecord};
//!
//! let pipeline = DocumentPipeline::new(DocxTemplateEngine::default(), "filled_document.docx");
//! let record = FormRecord::from_pairs([("companyName", "Acme")]);
//! let template = std::fs::read("template.docx")?;
//!
//! let artifact = pipeline.generate(&template, &record)?;
//! std::fs::write(artifact.filename(), artifact.bytes())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod bridge;
pub mod config;
pub mod error;
pub mod page;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod store;
pub mod widget;

pub use artifact::{ArtifactBuffer, MimeKind, DOCX_MIME, PDF_MIME};
pub use bridge::{
    download, read_upload, BlobRegistry, BlobUrl, DirectorySink, DownloadSink, FileSource,
    LocalFile, MemoryFile,
};
pub use config::{Settings, CONFIG_FILE};
pub use error::{Error, Notice, Result, Severity};
pub use page::{PageId, PageSpec};
pub use pipeline::{
    DocumentEngine, DocumentPipeline, DocxTemplateEngine, FormFillEngine, ReportEngine,
    RichTextEngine,
};
pub use record::FormRecord;
pub use session::{PageSession, TemplateDescriptor};
pub use store::{FileStore, KeyValueStore, MemoryStore, TemplateBindingStore, DEFAULT_DEBOUNCE};
pub use widget::{Surface, TextSurface, Widget, WidgetController, WidgetState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
