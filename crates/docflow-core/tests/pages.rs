//! Page sessions driven the way a host drives them

use std::sync::Arc;
use std::time::Duration;

use docflow_core::widget::{EditorCommand, WidgetState};
use docflow_core::{
    DirectorySink, KeyValueStore, MemoryFile, MemoryStore, MimeKind, Notice, PageId, PageSession,
    Settings, Severity, TemplateBindingStore, TemplateDescriptor,
};
use docflow_ooxml::test_utils::docx_with_paragraphs;
use tempfile::TempDir;

fn store() -> (Arc<MemoryStore>, Arc<TemplateBindingStore>) {
    let backend = Arc::new(MemoryStore::new());
    let store = Arc::new(TemplateBindingStore::new(backend.clone()));
    (backend, store)
}

fn open(id: PageId, store: &Arc<TemplateBindingStore>) -> PageSession {
    PageSession::open(id, Arc::clone(store), &Settings::default())
}

// =============================================================================
// PART 1: DOCX TEMPLATE PAGES
// =============================================================================

mod docx_pages {
    use super::*;

    #[tokio::test]
    async fn test_upload_fill_preview_download() {
        let (_, store) = store();
        let mut page = open(PageId::Docxtemplater, &store);

        let template =
            docx_with_paragraphs(&["Company: {companyName}", "Client: {clientCompanyName}"]);
        assert!(page.upload(&MemoryFile::new("template.docx", template)).await);
        page.set_field("companyName", "Acme");

        let artifact = page.generate().unwrap();
        assert_eq!(artifact.kind(), MimeKind::Docx);
        assert_eq!(
            page.preview().surface().text(),
            "Company: Acme\nClient: Zahidfest"
        );

        let dir = TempDir::new().unwrap();
        let path = page.download(&mut DirectorySink::new(dir.path())).unwrap();
        assert_eq!(path, dir.path().join("filled_document.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes());
        assert!(page.close().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_extension_becomes_notice() {
        let (_, store) = store();
        let mut page = open(PageId::Docxtemplater, &store);

        assert!(!page.upload(&MemoryFile::new("notes.txt", b"hello".to_vec())).await);
        assert_eq!(
            page.take_notices(),
            vec![Notice {
                severity: Severity::Error,
                message: "Please select a valid .docx file.".to_string(),
            }]
        );
        assert!(page.template().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_template_is_rejected() {
        let (_, store) = store();
        let mut page = open(PageId::DocxTemplates, &store);

        assert!(!page.upload(&MemoryFile::new("broken.docx", b"not a zip".to_vec())).await);
        assert!(page.notices()[0].message.starts_with("Invalid template"));
        assert!(page.template().is_none());
    }

    #[test]
    fn test_generate_without_template_keeps_page_usable() {
        let (_, store) = store();
        let mut page = open(PageId::Docxtemplater, &store);

        assert!(page.generate().is_none());
        assert!(page.artifact().is_none());
        assert_eq!(page.preview().state(), WidgetState::Empty);
        assert_eq!(page.notices().len(), 1);

        assert!(page.download(&mut DirectorySink::new("unused")).is_none());
        assert_eq!(page.notices().len(), 2);
    }
}

// =============================================================================
// PART 2: FORM RECORD PERSISTENCE
// =============================================================================

mod persistence {
    use super::*;

    #[test]
    fn test_record_survives_reopen() {
        let (backend, store) = store();
        let mut page = open(PageId::DocxTemplates, &store);
        assert_eq!(page.record().get("companyName"), Some("Festcloud.ai"));

        page.set_field("companyName", "Acme");
        assert!(page.close().is_empty());
        let stored = backend.get("page4FormData").unwrap().unwrap();
        assert!(stored.contains("\"companyName\":\"Acme\""));

        let page = open(PageId::DocxTemplates, &store);
        assert_eq!(page.record().get("companyName"), Some("Acme"));
        assert_eq!(page.record().get("clientCompanyName"), Some("Zahidfest"));
    }

    #[test]
    fn test_pages_do_not_share_records() {
        let (_, store) = store();
        let mut report = open(PageId::Report, &store);
        report.set_field("companyName", "Acme");
        report.close();

        let docx = open(PageId::DocxTemplates, &store);
        assert_eq!(docx.record().get("companyName"), Some("Festcloud.ai"));
    }

    #[test]
    fn test_corrupt_record_falls_back_to_seed() {
        let (backend, store) = store();
        backend.set("page1FormData", "{not json").unwrap();

        let page = open(PageId::Report, &store);
        assert_eq!(page.record().get("companyName"), Some("Festcloud.ai"));
        assert!(page.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_is_one_write() {
        let (backend, store) = store();
        let mut page = open(PageId::DocxTemplates, &store);

        for value in ["A", "Ac", "Acm", "Acme"] {
            page.set_field("companyName", value);
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(backend.get("page4FormData").unwrap().is_none());

        let other = open(PageId::DocxTemplates, &store);
        assert_eq!(other.record().get("companyName"), Some("Acme"));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let stored = backend.get("page4FormData").unwrap().unwrap();
        assert!(stored.contains("Acme"));
        assert!(!store.is_pending("page4FormData"));
    }
}

// =============================================================================
// PART 3: PDF PAGES
// =============================================================================

mod pdf_pages {
    use super::*;

    #[test]
    fn test_report_from_seed() {
        let (_, store) = store();
        let mut page = open(PageId::Report, &store);

        let artifact = page.generate().unwrap();
        assert_eq!(artifact.filename(), "generated_document.pdf");
        let text = page.preview().surface().text();
        assert!(text.starts_with("Company: Festcloud.ai\nAddress: Lviv, Ukraine"));
        assert!(text.ends_with("Client Phone: 032-87654321"));
    }

    #[tokio::test]
    async fn test_form_designer_edit_upload_fill() {
        let (_, store) = store();
        let mut page = open(PageId::FormDesigner, &store);
        page.set_field("title", "Supply agreement");

        assert!(page.edit_form(|designer| designer.move_field(0, "title", 20.0, 40.0)));
        let designer_text = page.designer().unwrap().surface().text();
        assert!(designer_text.contains("title at (20, 40) mm"));

        let base = docflow_pdf::blank_base(1).unwrap();
        assert!(page.upload(&MemoryFile::new("base.PDF", base)).await);
        assert!(page
            .designer()
            .unwrap()
            .surface()
            .text()
            .starts_with("Base: uploaded PDF"));
        let Some(TemplateDescriptor::Form(form)) = page.template() else {
            panic!("form page lost its template");
        };
        assert_eq!(form.schemas[0][0].position.x, 20.0);

        page.generate().unwrap();
        assert!(page.preview().surface().text().contains("Supply agreement"));

        assert!(!page.edit_form(|designer| designer.move_field(0, "nope", 0.0, 0.0)));
        assert_eq!(page.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_viewer_pages_through_upload() {
        let (_, store) = store();
        let mut page = open(PageId::PdfViewer, &store);

        let pdf = docflow_pdf::blank_base(2).unwrap();
        assert!(page.upload(&MemoryFile::new("example.pdf", pdf)).await);
        assert_eq!(page.viewer().unwrap().surface().text(), "Page 1 of 2 (150%)");

        assert!(page.navigate(|viewer, surface| viewer.next_page(surface)));
        assert!(page.navigate(|viewer, surface| viewer.zoom_in(surface)));
        assert_eq!(page.viewer().unwrap().surface().text(), "Page 2 of 2 (175%)");

        assert!(!page.navigate(|viewer, surface| viewer.go_to(5, surface)));
        assert!(page.generate().is_none());
        assert_eq!(page.notices().len(), 2);
    }
}

// =============================================================================
// PART 4: RICH TEXT PAGES
// =============================================================================

mod rich_text_pages {
    use super::*;

    #[test]
    fn test_starter_document_is_filled() {
        let (_, store) = store();
        let mut page = open(PageId::RichText, &store);

        let artifact = page.generate().unwrap();
        assert_eq!(artifact.filename(), "document.docx");
        let text = page.preview().surface().text();
        assert!(text.contains("Provider: Festcloud.ai, Lviv, Ukraine"));
        assert!(!text.contains('{'));
    }

    #[tokio::test]
    async fn test_docx_import_replaces_document() {
        let (_, store) = store();
        let mut page = open(PageId::RichText, &store);

        let upload = docx_with_paragraphs(&["Imported for {clientCompanyName}"]);
        assert!(page.upload(&MemoryFile::new("notes.docx", upload)).await);
        page.generate().unwrap();
        assert_eq!(page.preview().surface().text(), "Imported for Zahidfest");
    }

    #[test]
    fn test_canvas_commands_reach_toolbar_and_export() {
        let (_, store) = store();
        let mut page = open(PageId::CanvasEditor, &store);
        let toolbar = page.subscribe_formatting().unwrap();

        assert!(page.execute(EditorCommand::InsertText("Hello".to_string())));
        assert!(page.execute(EditorCommand::SelectRange { start: 0, end: 5 }));
        assert!(page.execute(EditorCommand::Bold));
        assert!(toolbar.borrow().bold);

        let artifact = page.generate().unwrap();
        assert_eq!(artifact.kind(), MimeKind::Docx);
        assert_eq!(page.preview().surface().text(), "Hello");

        assert!(page.execute(EditorCommand::Undo));
        assert!(!toolbar.borrow().bold);
    }

    #[test]
    fn test_canvas_exports_typed_braces() {
        let (_, store) = store();
        let mut page = open(PageId::CanvasEditor, &store);

        assert!(page.execute(EditorCommand::InsertText("if (ok) { retry }".to_string())));
        assert!(page.generate().is_some());
        assert_eq!(page.preview().surface().text(), "if (ok) { retry }");

        assert!(page.execute(EditorCommand::InsertText(" smile :} {companyName".to_string())));
        assert!(page.generate().is_some());
        assert_eq!(
            page.preview().surface().text(),
            "if (ok) { retry } smile :} {companyName"
        );
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_canvas_import_keeps_braces() {
        let (_, store) = store();
        let mut page = open(PageId::CanvasEditor, &store);

        let upload = docx_with_paragraphs(&["Keep {braces} here", "and {clientCompanyName}"]);
        assert!(page.upload(&MemoryFile::new("notes.docx", upload)).await);
        assert!(page.generate().is_some());
        assert_eq!(
            page.preview().surface().text(),
            "Keep {braces} here\nand {clientCompanyName}"
        );
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_rich_text_fills_known_fields_only() {
        let (_, store) = store();
        let mut page = open(PageId::RichText, &store);

        let upload = docx_with_paragraphs(&["{ retry } for {clientCompanyName} :}"]);
        assert!(page.upload(&MemoryFile::new("notes.docx", upload)).await);
        assert!(page.generate().is_some());
        assert_eq!(
            page.preview().surface().text(),
            "{ retry } for Zahidfest :}"
        );
        assert!(page.notices().is_empty());
    }
}
