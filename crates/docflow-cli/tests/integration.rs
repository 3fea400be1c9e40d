//! Integration tests for the docflow CLI
//!
//! Commands run against real files in a temporary directory, with the
//! form store kept under the same directory.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use docflow_cli::{
    export_command, fill_command, form_command, import_command, record_get_command,
    record_reset_command, record_set_command, report_command, view_command,
};
use docflow_core::{PageId, Settings};
use docflow_ooxml::{DocxReader, RichBlock, RichDocument};
use docflow_pdf::PdfInfo;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Minimal Word package with one paragraph per line
fn create_test_docx(lines: &[&str]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#).unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#).unwrap();

    let paragraphs: String = lines
        .iter()
        .map(|line| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", line))
        .collect();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{}</w:body>
</w:document>"#,
            paragraphs
        )
        .as_bytes(),
    )
    .unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Settings that keep the form store inside `dir`
fn settings_in(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.store.dir = dir.join("store");
    settings.output.dir = dir.join("out");
    settings
}

fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn docx_text(path: &Path) -> String {
    DocxReader::read(&fs::read(path).unwrap())
        .unwrap()
        .plain_text()
}

// =============================================================================
// PART 1: DOCX FILL
// =============================================================================

#[test]
fn test_fill_writes_filled_document() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let template = temp_dir.path().join("template.docx");
    fs::write(
        &template,
        create_test_docx(&["Company: {companyName}", "Client: {clientCompanyName}"]),
    )
    .unwrap();

    let out = temp_dir.path().join("out");
    let path = fill_command(
        &settings,
        &template,
        PageId::Docxtemplater,
        &fields(&[("companyName", "Acme")]),
        &out,
        None,
    )
    .unwrap();

    assert_eq!(path, out.join("filled_document.docx"));
    let text = docx_text(&path);
    assert!(text.contains("Company: Acme"));
    assert!(text.contains("Client: Zahidfest"));
    assert!(!text.contains('{'));
}

#[test]
fn test_fill_with_autosave_page_updates_record() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let template = temp_dir.path().join("template.docx");
    fs::write(&template, create_test_docx(&["{companyName}"])).unwrap();

    fill_command(
        &settings,
        &template,
        PageId::DocxTemplates,
        &fields(&[("companyName", "Acme")]),
        temp_dir.path(),
        None,
    )
    .unwrap();

    let record = record_get_command(&settings, PageId::DocxTemplates).unwrap();
    assert_eq!(record.get("companyName"), Some("Acme"));
}

#[test]
fn test_fill_rejects_wrong_extension() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let template = temp_dir.path().join("template.txt");
    fs::write(&template, "{companyName}").unwrap();

    let err = fill_command(
        &settings,
        &template,
        PageId::Docxtemplater,
        &[],
        temp_dir.path(),
        None,
    )
    .unwrap_err();

    assert!(err.to_string().contains("Please select a valid .docx file."));
    assert!(!temp_dir.path().join("filled_document.docx").exists());
}

#[test]
fn test_fill_missing_template() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());

    let result = fill_command(
        &settings,
        &temp_dir.path().join("absent.docx"),
        PageId::Docxtemplater,
        &[],
        temp_dir.path(),
        None,
    );
    assert!(result.is_err());
}

#[test]
fn test_fill_under_report_name() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let template = temp_dir.path().join("quick-report.docx");
    fs::write(&template, create_test_docx(&["Report for {clientCompanyName}"])).unwrap();

    let path = fill_command(
        &settings,
        &template,
        PageId::DocxTemplates,
        &[],
        temp_dir.path(),
        Some("report.docx"),
    )
    .unwrap();
    assert_eq!(path, temp_dir.path().join("report.docx"));
    assert_eq!(docx_text(&path).trim_end(), "Report for Zahidfest");

    let wrong = fill_command(
        &settings,
        &template,
        PageId::DocxTemplates,
        &[],
        temp_dir.path(),
        Some("report.pdf"),
    );
    assert!(wrong.is_err());
    assert!(!temp_dir.path().join("report.pdf").exists());
}

// =============================================================================
// PART 2: PDF GENERATION AND VIEWING
// =============================================================================

#[test]
fn test_report_and_view() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());

    let path = report_command(
        &settings,
        &fields(&[("companyName", "Acme")]),
        temp_dir.path(),
    )
    .unwrap();
    assert_eq!(path, temp_dir.path().join("generated_document.pdf"));

    let info = PdfInfo::load(&fs::read(&path).unwrap()).unwrap();
    assert!(info.text().unwrap().contains("Company: Acme"));

    let view = view_command(&settings, &path, 1).unwrap();
    assert!(view.starts_with("Page 1 of 1 (150%)"));
    assert!(view.contains("Company: Acme"));

    assert!(view_command(&settings, &path, 2).is_err());
}

#[test]
fn test_form_over_uploaded_base() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let base = temp_dir.path().join("letterhead.pdf");
    fs::write(&base, docflow_pdf::blank_base(2).unwrap()).unwrap();

    let path = form_command(
        &settings,
        None,
        Some(&base),
        &fields(&[("title", "Supply agreement"), ("client", "Zahidfest")]),
        temp_dir.path(),
    )
    .unwrap();

    let info = PdfInfo::load(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(info.page_count(), 2);
    let text = info.page_text(1).unwrap();
    assert!(text.contains("Supply agreement"));
    assert!(text.contains("Zahidfest"));
}

#[test]
fn test_form_rejects_malformed_template() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let template = temp_dir.path().join("form.json");
    fs::write(&template, "{ not json").unwrap();

    let result = form_command(&settings, Some(&template), None, &[], temp_dir.path());
    assert!(result.is_err());
}

// =============================================================================
// PART 3: RICH TEXT IMPORT AND EXPORT
// =============================================================================

#[test]
fn test_import_then_export() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let source = temp_dir.path().join("notes.docx");
    fs::write(&source, create_test_docx(&["Prepared for {clientCompanyName}"])).unwrap();

    let json_path = temp_dir.path().join("notes.json");
    let json = import_command(&settings, &source, Some(&json_path)).unwrap();
    assert_eq!(fs::read_to_string(&json_path).unwrap(), json);

    let out = temp_dir.path().join("out");
    let path = export_command(&settings, &json_path, &[], &out).unwrap();
    assert_eq!(path, out.join("document.docx"));
    assert_eq!(docx_text(&path).trim_end(), "Prepared for Zahidfest");
}

#[test]
fn test_export_document_with_heading() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let document = RichDocument {
        blocks: vec![
            RichBlock::heading(1, "Offer"),
            RichBlock::paragraph("For {clientCompanyName}"),
        ],
    };
    let input = temp_dir.path().join("offer.json");
    fs::write(&input, document.to_json().unwrap()).unwrap();

    let path = export_command(
        &settings,
        &input,
        &fields(&[("clientCompanyName", "Acme")]),
        temp_dir.path(),
    )
    .unwrap();

    let text = docx_text(&path);
    assert!(text.contains("Offer"));
    assert!(text.contains("For Acme"));
}

// =============================================================================
// PART 4: SAVED RECORDS
// =============================================================================

#[test]
fn test_record_set_get_reset() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());

    let record = record_get_command(&settings, PageId::Report).unwrap();
    assert_eq!(record.get("companyName"), Some("Festcloud.ai"));

    record_set_command(
        &settings,
        PageId::Report,
        &fields(&[("companyName", "Acme")]),
    )
    .unwrap();
    assert!(temp_dir.path().join("store").exists());

    let record = record_get_command(&settings, PageId::Report).unwrap();
    assert_eq!(record.get("companyName"), Some("Acme"));
    assert_eq!(record.get("clientCompanyName"), Some("Zahidfest"));

    record_reset_command(&settings, PageId::Report).unwrap();
    let record = record_get_command(&settings, PageId::Report).unwrap();
    assert_eq!(record.get("companyName"), Some("Festcloud.ai"));
}

#[test]
fn test_record_on_page_without_storage() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());

    assert!(record_get_command(&settings, PageId::CanvasEditor).is_err());
    assert!(record_reset_command(&settings, PageId::PdfViewer).is_err());
}
