//! docflow-wasm - WebAssembly bindings for docflow
//!
//! Document generation for browser hosts. Field values cross the boundary
//! as plain objects (`{ "companyName": "Acme" }`), documents as byte
//! arrays. Persistence and widgets stay on the host side.

use docflow_core::{ArtifactBuffer, DocumentPipeline, FormRecord, PageId, Settings};
use docflow_ooxml::{Delimiters, DocxReader, DocxTemplate};
use docflow_pdf::PdfInfo;
use wasm_bindgen::prelude::*;

/// Returns the current version of docflow
#[wasm_bindgen]
pub fn version() -> String {
    docflow_core::VERSION.to_string()
}

/// Fill `{placeholders}` in a DOCX template
#[wasm_bindgen(js_name = fillDocx)]
pub fn fill_docx(template: &[u8], data: JsValue) -> Result<Vec<u8>, JsError> {
    let record = record_from(data)?;
    Ok(generate(PageId::Docxtemplater, template, &record)?.bytes().to_vec())
}

/// Placeholder names used by a DOCX template, in document order
#[wasm_bindgen]
pub fn placeholders(template: &[u8]) -> Result<Vec<String>, JsError> {
    Ok(template_placeholders(template)?)
}

/// Render the labelled company report to PDF
#[wasm_bindgen(js_name = generateReport)]
pub fn generate_report(data: JsValue) -> Result<Vec<u8>, JsError> {
    let record = record_from(data)?;
    let layout = serde_json::to_vec(&docflow_core::page::company_report_layout())
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(generate(PageId::Report, &layout, &record)?.bytes().to_vec())
}

/// Fill a form template (JSON) over its base PDF
#[wasm_bindgen(js_name = fillForm)]
pub fn fill_form(template_json: &str, data: JsValue) -> Result<Vec<u8>, JsError> {
    let record = record_from(data)?;
    Ok(generate(PageId::FormDesigner, template_json.as_bytes(), &record)?.bytes().to_vec())
}

/// Export a rich-text document (JSON) to DOCX
#[wasm_bindgen(js_name = exportRichText)]
pub fn export_rich_text(document_json: &str, data: JsValue) -> Result<Vec<u8>, JsError> {
    let record = record_from(data)?;
    Ok(generate(PageId::RichText, document_json.as_bytes(), &record)?.bytes().to_vec())
}

/// Convert a DOCX file to a rich-text document (JSON)
#[wasm_bindgen(js_name = importDocx)]
pub fn import_docx(bytes: &[u8]) -> Result<String, JsError> {
    Ok(import_rich_text(bytes)?)
}

/// Text shown on a 1-based PDF page
#[wasm_bindgen(js_name = pdfPageText)]
pub fn pdf_page_text(bytes: &[u8], page: usize) -> Result<String, JsError> {
    Ok(page_text(bytes, page)?)
}

fn record_from(data: JsValue) -> Result<FormRecord, JsError> {
    if data.is_undefined() || data.is_null() {
        return Ok(FormRecord::new());
    }
    serde_wasm_bindgen::from_value(data).map_err(|e| JsError::new(&e.to_string()))
}

fn generate(
    page: PageId,
    template: &[u8],
    record: &FormRecord,
) -> docflow_core::Result<ArtifactBuffer> {
    pipeline(page)?.generate(template, record)
}

fn pipeline(page: PageId) -> docflow_core::Result<DocumentPipeline> {
    page.spec()
        .pipeline(&Settings::default())
        .ok_or_else(|| {
            docflow_core::Error::EngineFailure(format!("page {} generates nothing", page))
        })
}

fn template_placeholders(template: &[u8]) -> docflow_core::Result<Vec<String>> {
    let template = DocxTemplate::from_bytes(template)?;
    Ok(template.placeholders(&Delimiters::default())?)
}

fn import_rich_text(bytes: &[u8]) -> docflow_core::Result<String> {
    Ok(DocxReader::read(bytes)?.to_json()?)
}

fn page_text(bytes: &[u8], page: usize) -> docflow_core::Result<String> {
    Ok(PdfInfo::load(bytes)?.page_text(page)?)
}
