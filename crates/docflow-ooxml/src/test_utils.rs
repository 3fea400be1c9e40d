//! Shared test utilities for docflow-ooxml
//!
//! Fixture builders producing small but valid DOCX packages, used by the
//! unit tests here and by the integration tests of dependent crates.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::archive::OoxmlArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Wrap body content in a `w:document` part
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
    )
}

/// Paragraph XML where each element of `runs` becomes its own `w:r`
///
/// Useful for simulating placeholders that Word has split across runs.
pub fn paragraph_xml(runs: &[&str]) -> String {
    let mut xml = String::from("<w:p>");
    for run in runs {
        xml.push_str(&format!(
            "<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>",
            run.replace('&', "&amp;").replace('<', "&lt;")
        ));
    }
    xml.push_str("</w:p>");
    xml
}

/// Create a DOCX package from raw parts (path, contents)
///
/// Content types and package relationships are added automatically.
pub fn create_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(PACKAGE_RELS.as_bytes()).unwrap();

    for (path, contents) in parts {
        zip.start_file(*path, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Create a DOCX whose body has one paragraph per entry, each a single run
///
/// # Example
/// ```ignore
/// use docflow_ooxml::test_utils::docx_with_paragraphs;
/// let template = docx_with_paragraphs(&["Company: {companyName}"]);
/// ```
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs.iter().map(|p| paragraph_xml(&[*p])).collect();
    let document = document_xml(&body);
    create_package(&[("word/document.xml", document.as_str())])
}

/// Create a DOCX with a body and a header part
pub fn docx_with_header(body_paragraphs: &[&str], header_text: &str) -> Vec<u8> {
    let body: String = body_paragraphs.iter().map(|p| paragraph_xml(&[*p])).collect();
    let header = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<w:hdr xmlns:w="{W_NS}">{}</w:hdr>"#,
        paragraph_xml(&[header_text])
    );
    let document = document_xml(&body);
    create_package(&[
        ("word/document.xml", document.as_str()),
        ("word/header1.xml", header.as_str()),
    ])
}

/// Extract document.xml content from a DOCX byte array
pub fn extract_document_xml(docx: &[u8]) -> String {
    let archive = OoxmlArchive::from_bytes(docx).unwrap();
    archive.get_string("word/document.xml").unwrap()
}

/// Extract any file content from a DOCX byte array
pub fn extract_file(docx: &[u8], path: &str) -> Option<String> {
    let archive = OoxmlArchive::from_bytes(docx).unwrap();
    archive.get_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_with_paragraphs() {
        let docx = docx_with_paragraphs(&["one", "a & b"]);
        let archive = OoxmlArchive::word_package(&docx).unwrap();

        assert!(archive.contains("_rels/.rels"));
        let xml = extract_document_xml(&docx);
        assert!(xml.contains(">one</w:t>"));
        assert!(xml.contains(">a &amp; b</w:t>"));
    }

    #[test]
    fn test_docx_with_header() {
        let docx = docx_with_header(&["body"], "{title}");
        let header = extract_file(&docx, "word/header1.xml").unwrap();
        assert!(header.contains("{title}"));
        assert!(extract_file(&docx, "word/footer1.xml").is_none());
    }
}
