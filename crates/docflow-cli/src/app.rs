//! CLI application logic
//!
//! Each command opens the matching page, drives it the way a user would
//! (type fields, upload a file, press generate, download) and turns the
//! page's notices into command errors.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use docflow_core::{
    download, BlobRegistry, DirectorySink, FileStore, FormRecord, LocalFile, MimeKind, PageId,
    PageSession, Settings, TemplateBindingStore, TemplateDescriptor, CONFIG_FILE, VERSION,
};
use docflow_ooxml::RichDocument;
use docflow_pdf::FormTemplate;

#[derive(Parser)]
#[command(name = "docflow")]
#[command(author, version, about = "Fill DOCX templates, generate PDFs and preview documents", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./docflow.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill {placeholders} in a DOCX template
    Fill {
        /// DOCX template to fill
        template: PathBuf,

        /// Page whose form record supplies the values
        #[arg(short, long, value_enum, default_value = "docxtemplater")]
        page: DocxPage,

        /// Field value, repeatable (name=value)
        #[arg(short, long = "set", value_parser = parse_field)]
        set: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Download filename, e.g. report.docx
        #[arg(long)]
        name: Option<String>,
    },

    /// Render the company report to PDF
    Report {
        /// Field value, repeatable (name=value)
        #[arg(short, long = "set", value_parser = parse_field)]
        set: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fill a form template over a base PDF
    Form {
        /// Form template JSON (defaults to the contract form)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Base PDF to draw the fields on
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Field value, repeatable (name=value)
        #[arg(short, long = "set", value_parser = parse_field)]
        set: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a rich-text JSON document to DOCX
    Export {
        /// Rich-text document (JSON)
        input: PathBuf,

        /// Field value, repeatable (name=value)
        #[arg(short, long = "set", value_parser = parse_field)]
        set: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a DOCX file to a rich-text JSON document
    Import {
        /// DOCX file to import
        input: PathBuf,

        /// Output file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the text of one PDF page
    View {
        /// PDF file to view
        input: PathBuf,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Inspect or edit a page's saved form record
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// List the available pages
    Pages,
}

#[derive(Subcommand)]
enum RecordAction {
    /// Print the record as JSON
    Get {
        /// Page slug
        page: PageId,
    },
    /// Set field values and save immediately
    Set {
        /// Page slug
        page: PageId,

        /// Field value, repeatable (name=value)
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Forget the saved record so the page starts from its defaults
    Reset {
        /// Page slug
        page: PageId,
    },
}

/// Pages that fill an uploaded DOCX
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocxPage {
    /// Values from the command line only
    Docxtemplater,
    /// Values from the saved record, updated by --set
    DocxTemplates,
}

impl From<DocxPage> for PageId {
    fn from(page: DocxPage) -> Self {
        match page {
            DocxPage::Docxtemplater => PageId::Docxtemplater,
            DocxPage::DocxTemplates => PageId::DocxTemplates,
        }
    }
}

fn parse_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got \"{}\"", s)),
    }
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Fill {
            template,
            page,
            set,
            output,
            name,
        } => {
            let output = output_dir(&settings, output);
            fill_command(
                &settings,
                &template,
                page.into(),
                &set,
                &output,
                name.as_deref(),
            )?;
        }
        Commands::Report { set, output } => {
            let output = output_dir(&settings, output);
            report_command(&settings, &set, &output)?;
        }
        Commands::Form {
            template,
            base,
            set,
            output,
        } => {
            let output = output_dir(&settings, output);
            form_command(
                &settings,
                template.as_deref(),
                base.as_deref(),
                &set,
                &output,
            )?;
        }
        Commands::Export { input, set, output } => {
            let output = output_dir(&settings, output);
            export_command(&settings, &input, &set, &output)?;
        }
        Commands::Import { input, output } => {
            let json = import_command(&settings, &input, output.as_deref())?;
            if output.is_none() {
                println!("{}", json);
            }
        }
        Commands::View { input, page } => {
            println!("{}", view_command(&settings, &input, page)?);
        }
        Commands::Record { action } => match action {
            RecordAction::Get { page } => {
                let record = record_get_command(&settings, page)?;
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            RecordAction::Set { page, fields } => {
                record_set_command(&settings, page, &fields)?;
            }
            RecordAction::Reset { page } => {
                record_reset_command(&settings, page)?;
            }
        },
        Commands::Pages => pages_command(),
    }

    Ok(())
}

/// Fill a DOCX template through one of the DOCX pages
pub fn fill_command(
    settings: &Settings,
    template: &Path,
    page: PageId,
    fields: &[(String, String)],
    output_dir: &Path,
    name: Option<&str>,
) -> Result<PathBuf> {
    println!("docflow v{}", VERSION);
    println!("Filling: {}", template.display());

    if !template.exists() {
        bail!("Template file not found: {}", template.display());
    }

    let mut session = open_page(settings, page);
    apply_fields(&mut session, fields);

    let file = LocalFile::new(template);
    if !block_on(session.upload(&file))? {
        return Err(page_failure(&mut session, "Upload"));
    }

    match name {
        Some(name) => save_document_as(session, output_dir, name),
        None => save_document(session, output_dir),
    }
}

/// Render the company report to PDF
pub fn report_command(
    settings: &Settings,
    fields: &[(String, String)],
    output_dir: &Path,
) -> Result<PathBuf> {
    println!("docflow v{}", VERSION);
    println!("Generating report");

    let mut session = open_page(settings, PageId::Report);
    apply_fields(&mut session, fields);
    save_document(session, output_dir)
}

/// Fill a form template over a base PDF
pub fn form_command(
    settings: &Settings,
    template: Option<&Path>,
    base: Option<&Path>,
    fields: &[(String, String)],
    output_dir: &Path,
) -> Result<PathBuf> {
    println!("docflow v{}", VERSION);
    println!("Filling form");

    let mut session = open_page(settings, PageId::FormDesigner);
    apply_fields(&mut session, fields);

    if let Some(path) = template {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read form template: {}", path.display()))?;
        let form = FormTemplate::from_json(&json)
            .with_context(|| format!("Failed to parse form template: {}", path.display()))?;
        println!("  Template: {}", path.display());
        if !session.set_template(TemplateDescriptor::Form(form)) {
            return Err(page_failure(&mut session, "Template"));
        }
    }

    if let Some(path) = base {
        if !path.exists() {
            bail!("Base PDF not found: {}", path.display());
        }
        println!("  Base: {}", path.display());
        let file = LocalFile::new(path);
        if !block_on(session.upload(&file))? {
            return Err(page_failure(&mut session, "Upload"));
        }
    }

    save_document(session, output_dir)
}

/// Export a rich-text JSON document to DOCX
pub fn export_command(
    settings: &Settings,
    input: &Path,
    fields: &[(String, String)],
    output_dir: &Path,
) -> Result<PathBuf> {
    println!("docflow v{}", VERSION);
    println!("Exporting: {}", input.display());

    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read document: {}", input.display()))?;
    let document = RichDocument::from_json(&json)
        .with_context(|| format!("Failed to parse document: {}", input.display()))?;

    let mut session = open_page(settings, PageId::RichText);
    apply_fields(&mut session, fields);
    if !session.set_template(TemplateDescriptor::RichText(document)) {
        return Err(page_failure(&mut session, "Template"));
    }

    save_document(session, output_dir)
}

/// Convert a DOCX file to rich-text JSON, returning the JSON
pub fn import_command(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<String> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let mut session = open_page(settings, PageId::RichText);
    let file = LocalFile::new(input);
    if !block_on(session.upload(&file))? {
        return Err(page_failure(&mut session, "Import"));
    }

    let json = match session.template() {
        Some(TemplateDescriptor::RichText(document)) => document
            .to_json()
            .context("Failed to serialize imported document")?,
        _ => bail!("Import produced no document"),
    };
    finish(session);

    if let Some(path) = output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write output: {}", path.display()))?;
        println!("  Created: {}", path.display());
    }

    Ok(json)
}

/// Text of one PDF page as the viewer shows it
pub fn view_command(settings: &Settings, input: &Path, page: usize) -> Result<String> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let mut session = open_page(settings, PageId::PdfViewer);
    let file = LocalFile::new(input);
    if !block_on(session.upload(&file))? {
        return Err(page_failure(&mut session, "Upload"));
    }
    if page != 1 && !session.navigate(|viewer, surface| viewer.go_to(page, surface)) {
        return Err(page_failure(&mut session, "Navigation"));
    }

    let text = session
        .viewer()
        .map(|viewer| viewer.surface().text())
        .ok_or_else(|| anyhow!("Viewer is not available"))?;
    finish(session);
    Ok(text)
}

/// Saved record of a page, or its defaults when nothing is saved
pub fn record_get_command(settings: &Settings, page: PageId) -> Result<FormRecord> {
    storage_key(page)?;
    let session = open_page(settings, page);
    let record = session.record().clone();
    finish(session);
    Ok(record)
}

/// Set fields on a page's record and save it
pub fn record_set_command(
    settings: &Settings,
    page: PageId,
    fields: &[(String, String)],
) -> Result<FormRecord> {
    let key = storage_key(page)?;
    let mut session = open_page(settings, page);
    apply_fields(&mut session, fields);
    let record = session.record().clone();

    let notices = session.close();
    if let Some(notice) = notices.first() {
        bail!("Failed to save {}: {}", key, notice.message);
    }
    println!("Saved {} field(s) to {}", fields.len(), key);
    Ok(record)
}

/// Remove a page's saved record
pub fn record_reset_command(settings: &Settings, page: PageId) -> Result<()> {
    let key = storage_key(page)?;
    open_store(settings)
        .reset(key)
        .with_context(|| format!("Failed to reset {}", key))?;
    println!("Reset {}", key);
    Ok(())
}

/// Print the page catalogue
pub fn pages_command() {
    println!("docflow v{}", VERSION);
    println!();
    for page in PageId::ALL {
        let spec = page.spec();
        println!("  {:<15} {}", page.slug(), page.title());
        if let Some(key) = spec.storage_key {
            println!("  {:<15}   saves to: {}", "", key);
        }
        if let Some(name) = spec.download {
            println!("  {:<15}   downloads: {}", "", name);
        }
    }
}

/// Load settings from an explicit path or the working directory
fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            debug!(path = %path.display(), "loading settings");
            Ok(Settings::load(path)?)
        }
        None => Ok(Settings::load(CONFIG_FILE)?),
    }
}

fn output_dir(settings: &Settings, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| settings.output.dir.clone())
}

fn open_store(settings: &Settings) -> Arc<TemplateBindingStore> {
    let backend = Arc::new(FileStore::new(settings.store.dir.clone()));
    Arc::new(TemplateBindingStore::with_delay(backend, settings.debounce()))
}

fn open_page(settings: &Settings, page: PageId) -> PageSession {
    PageSession::open(page, open_store(settings), settings)
}

fn storage_key(page: PageId) -> Result<&'static str> {
    page.spec()
        .storage_key
        .ok_or_else(|| anyhow!("Page {} does not save its form", page))
}

fn apply_fields(session: &mut PageSession, fields: &[(String, String)]) {
    for (name, value) in fields {
        session.set_field(name, value);
    }
}

/// Generate the page's document and write it under `output_dir`
fn save_document(mut session: PageSession, output_dir: &Path) -> Result<PathBuf> {
    let artifact = session
        .generate()
        .ok_or_else(|| page_failure(&mut session, "Generation"))?;
    debug!(digest = %artifact.digest(), len = artifact.len(), "generated");

    let mut sink = DirectorySink::new(output_dir);
    let path = session
        .download(&mut sink)
        .ok_or_else(|| page_failure(&mut session, "Download"))?;
    finish(session);

    println!("  Created: {}", path.display());
    Ok(path)
}

/// Generate the page's document and write it under another name
fn save_document_as(mut session: PageSession, output_dir: &Path, name: &str) -> Result<PathBuf> {
    let artifact = session
        .generate()
        .ok_or_else(|| page_failure(&mut session, "Generation"))?;
    finish(session);

    if MimeKind::from_file_name(name) != Some(artifact.kind()) {
        bail!(
            "Download name {} must end in .{}",
            name,
            artifact.kind().extension()
        );
    }

    let mut sink = DirectorySink::new(output_dir);
    let path = download(&BlobRegistry::new(), &mut sink, &artifact.renamed(name))
        .with_context(|| format!("Failed to save {}", name))?;

    println!("  Created: {}", path.display());
    Ok(path)
}

/// Close the page, reporting anything it could not save
fn finish(session: PageSession) {
    for notice in session.close() {
        eprintln!("  {}", notice);
    }
}

fn page_failure(session: &mut PageSession, action: &str) -> anyhow::Error {
    let messages: Vec<String> = session
        .take_notices()
        .into_iter()
        .map(|notice| notice.message)
        .collect();
    if messages.is_empty() {
        anyhow!("{} failed", action)
    } else {
        anyhow!("{} failed: {}", action, messages.join("; "))
    }
}

/// Drive an upload to completion on a single-threaded runtime
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_fill() {
        let cli = Cli::try_parse_from(vec![
            "docflow",
            "fill",
            "template.docx",
            "--page",
            "docx-templates",
            "--set",
            "companyName=Acme",
            "-s",
            "clientCompanyName=Zahidfest",
        ])
        .unwrap();

        match cli.command {
            Commands::Fill {
                template,
                page,
                set,
                output,
                name,
            } => {
                assert_eq!(template, PathBuf::from("template.docx"));
                assert_eq!(page, DocxPage::DocxTemplates);
                assert_eq!(set.len(), 2);
                assert_eq!(set[0], ("companyName".to_string(), "Acme".to_string()));
                assert!(output.is_none());
                assert!(name.is_none());
            }
            _ => panic!("Expected Fill command"),
        }
    }

    #[test]
    fn test_cli_parse_fill_defaults() {
        let cli = Cli::try_parse_from(vec!["docflow", "fill", "t.docx"]).unwrap();

        match cli.command {
            Commands::Fill { page, set, .. } => {
                assert_eq!(page, DocxPage::Docxtemplater);
                assert!(set.is_empty());
            }
            _ => panic!("Expected Fill command"),
        }
    }

    #[test]
    fn test_cli_parse_global_config() {
        let cli = Cli::try_parse_from(vec!["docflow", "report", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Report { .. }));
    }

    #[test]
    fn test_cli_parse_view() {
        let cli = Cli::try_parse_from(vec!["docflow", "view", "doc.pdf", "-p", "3"]).unwrap();

        match cli.command {
            Commands::View { input, page } => {
                assert_eq!(input, PathBuf::from("doc.pdf"));
                assert_eq!(page, 3);
            }
            _ => panic!("Expected View command"),
        }
    }

    #[test]
    fn test_cli_parse_record_set() {
        let cli = Cli::try_parse_from(vec![
            "docflow",
            "record",
            "set",
            "report",
            "companyName=Acme",
        ])
        .unwrap();

        match cli.command {
            Commands::Record {
                action: RecordAction::Set { page, fields },
            } => {
                assert_eq!(page, PageId::Report);
                assert_eq!(fields, vec![("companyName".to_string(), "Acme".to_string())]);
            }
            _ => panic!("Expected Record Set command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_page() {
        let result = Cli::try_parse_from(vec!["docflow", "record", "get", "home"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_bad_field() {
        let result = Cli::try_parse_from(vec!["docflow", "report", "--set", "companyName"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_field_keeps_equals_in_value() {
        assert_eq!(
            parse_field("formula=a=b").unwrap(),
            ("formula".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_field("empty=").unwrap().1, "");
        assert!(parse_field("=value").is_err());
    }

    #[test]
    fn test_load_settings_missing_explicit_file() {
        let result = load_settings(Some(Path::new("/nonexistent/docflow.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_key_for_pages_without_record() {
        assert_eq!(storage_key(PageId::Report).unwrap(), "page1FormData");
        assert!(storage_key(PageId::PdfViewer).is_err());
    }
}
