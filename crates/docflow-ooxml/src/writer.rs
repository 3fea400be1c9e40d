//! DOCX Writer
//!
//! Serializes a [`RichDocument`] into a self-contained Word package. The
//! package is built from scratch (content types, relationships, styles,
//! numbering and the document part), so no template file is needed.
//!
//! # Example
//!
//! ```ignore
//! use docflow_ooxml::{DocxWriter, RichBlock, RichDocument};
//!
//! let doc = RichDocument { blocks: vec![RichBlock::heading(1, "Quote")] };
//! std::fs::write("document.docx", DocxWriter::generate(&doc)?)?;
//! ```

use crate::archive::{OoxmlArchive, CONTENT_TYPES_PART, DOCUMENT_PART};
use crate::error::Result;
use crate::rich_text::{Alignment, RichBlock, RichDocument, RunMarks, TextRun, VertAlign};

/// `w:numId` of the bullet list definition
pub(crate) const BULLET_NUM_ID: u32 = 1;
/// `w:numId` of the decimal list definition
pub(crate) const DECIMAL_NUM_ID: u32 = 2;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:rPr><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="36"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Quote">
    <w:name w:val="Quote"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:ind w:left="720"/></w:pPr>
    <w:rPr><w:i/><w:color w:val="555555"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:ind w:left="720"/></w:pPr>
  </w:style>
  <w:style w:type="table" w:styleId="TableGrid">
    <w:name w:val="Table Grid"/>
    <w:tblPr>
      <w:tblBorders>
        <w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>
      </w:tblBorders>
    </w:tblPr>
  </w:style>
</w:styles>"#;

const NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

/// Writes rich-text documents as DOCX packages
#[derive(Debug, Default)]
pub struct DocxWriter {
    output: String,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a complete DOCX package for `doc`
    pub fn generate(doc: &RichDocument) -> Result<Vec<u8>> {
        let mut writer = Self::new();
        let document_xml = writer.generate_document_xml(doc);

        let mut archive = OoxmlArchive::new();
        archive.set_string(CONTENT_TYPES_PART, CONTENT_TYPES_XML);
        archive.set_string("_rels/.rels", PACKAGE_RELS_XML);
        archive.set_string("word/_rels/document.xml.rels", DOCUMENT_RELS_XML);
        archive.set_string("word/styles.xml", STYLES_XML);
        archive.set_string("word/numbering.xml", NUMBERING_XML);
        archive.set_string(DOCUMENT_PART, document_xml);
        archive.to_bytes()
    }

    fn generate_document_xml(&mut self, doc: &RichDocument) -> String {
        self.output.clear();
        self.output
            .push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        self.output.push('\n');
        self.output.push_str(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        );
        self.output.push_str("\n<w:body>\n");

        for block in &doc.blocks {
            self.generate_block(block);
        }

        // A4 portrait, 1 inch margins
        self.output.push_str(
            "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
             <w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" \
             w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr>\n",
        );
        self.output.push_str("</w:body>\n</w:document>");
        std::mem::take(&mut self.output)
    }

    fn generate_block(&mut self, block: &RichBlock) {
        match block {
            RichBlock::Heading { level, runs } => {
                let style = if *level <= 1 { "Heading1" } else { "Heading2" };
                self.generate_paragraph(Some(style), None, Alignment::Left, runs);
            }
            RichBlock::Paragraph { align, runs } => {
                self.generate_paragraph(None, None, *align, runs);
            }
            RichBlock::Quote { runs } => {
                self.generate_paragraph(Some("Quote"), None, Alignment::Left, runs);
            }
            RichBlock::List { ordered, items } => {
                let num_id = if *ordered { DECIMAL_NUM_ID } else { BULLET_NUM_ID };
                for item in items {
                    self.generate_paragraph(
                        Some("ListParagraph"),
                        Some(num_id),
                        Alignment::Left,
                        item,
                    );
                }
            }
            RichBlock::Rule => self.generate_rule(),
            RichBlock::Table { header, rows } => self.generate_table(*header, rows),
        }
    }

    fn generate_paragraph(
        &mut self,
        style: Option<&str>,
        num_id: Option<u32>,
        align: Alignment,
        runs: &[TextRun],
    ) {
        self.output.push_str("<w:p>");

        let jc = match align {
            Alignment::Left => None,
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
            Alignment::Justify => Some("both"),
        };
        if style.is_some() || num_id.is_some() || jc.is_some() {
            self.output.push_str("<w:pPr>");
            if let Some(style) = style {
                self.output
                    .push_str(&format!("<w:pStyle w:val=\"{}\"/>", escape_xml(style)));
            }
            if let Some(num_id) = num_id {
                self.output.push_str(&format!(
                    "<w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
                    num_id
                ));
            }
            if let Some(jc) = jc {
                self.output.push_str(&format!("<w:jc w:val=\"{}\"/>", jc));
            }
            self.output.push_str("</w:pPr>");
        }

        for run in runs {
            self.generate_run(run);
        }

        self.output.push_str("</w:p>\n");
    }

    fn generate_run(&mut self, run: &TextRun) {
        self.output.push_str("<w:r>");
        if !run.marks.is_plain() {
            self.generate_run_properties(&run.marks);
        }

        let mut lines = run.text.split('\n');
        if let Some(first) = lines.next() {
            self.push_text(first);
        }
        for line in lines {
            self.output.push_str("<w:br/>");
            self.push_text(line);
        }

        self.output.push_str("</w:r>");
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t>",
            escape_xml(text)
        ));
    }

    /// Run properties, in the element order required by the schema
    fn generate_run_properties(&mut self, marks: &RunMarks) {
        self.output.push_str("<w:rPr>");
        if let Some(font) = &marks.font {
            let font = escape_xml(font);
            self.output.push_str(&format!(
                "<w:rFonts w:ascii=\"{0}\" w:hAnsi=\"{0}\" w:cs=\"{0}\"/>",
                font
            ));
        }
        if marks.bold {
            self.output.push_str("<w:b/>");
        }
        if marks.italic {
            self.output.push_str("<w:i/>");
        }
        if marks.strike {
            self.output.push_str("<w:strike/>");
        }
        if let Some(color) = marks.color.as_deref().and_then(hex_color) {
            self.output.push_str(&format!("<w:color w:val=\"{}\"/>", color));
        }
        if let Some(size) = marks.size {
            // Half-points
            let half_points = (size * 2.0).round().max(2.0) as u32;
            self.output.push_str(&format!(
                "<w:sz w:val=\"{0}\"/><w:szCs w:val=\"{0}\"/>",
                half_points
            ));
        }
        if marks.underline {
            self.output.push_str("<w:u w:val=\"single\"/>");
        }
        if let Some(fill) = marks.highlight.as_deref().and_then(hex_color) {
            self.output.push_str(&format!(
                "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>",
                fill
            ));
        }
        match marks.vert_align {
            Some(VertAlign::Superscript) => {
                self.output.push_str("<w:vertAlign w:val=\"superscript\"/>")
            }
            Some(VertAlign::Subscript) => {
                self.output.push_str("<w:vertAlign w:val=\"subscript\"/>")
            }
            None => {}
        }
        self.output.push_str("</w:rPr>");
    }

    fn generate_rule(&mut self) {
        self.output.push_str(
            "<w:p><w:pPr><w:pBdr>\
             <w:bottom w:val=\"single\" w:sz=\"6\" w:space=\"1\" w:color=\"auto\"/>\
             </w:pBdr></w:pPr></w:p>\n",
        );
    }

    fn generate_table(&mut self, header: bool, rows: &[Vec<Vec<TextRun>>]) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }

        self.output.push_str("<w:tbl>\n");
        self.output.push_str(
            "<w:tblPr><w:tblStyle w:val=\"TableGrid\"/><w:tblW w:w=\"5000\" w:type=\"pct\"/></w:tblPr>\n",
        );

        // 9026 twips of usable width on A4 with 1 inch margins
        let width = 9026 / columns;
        self.output.push_str("<w:tblGrid>");
        for _ in 0..columns {
            self.output
                .push_str(&format!("<w:gridCol w:w=\"{}\"/>", width));
        }
        self.output.push_str("</w:tblGrid>\n");

        for (index, row) in rows.iter().enumerate() {
            self.output.push_str("<w:tr>");
            if header && index == 0 {
                self.output.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for col in 0..columns {
                self.output.push_str(&format!(
                    "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/></w:tcPr>",
                    width
                ));
                // Every cell needs at least one paragraph
                let runs = row.get(col).map(Vec::as_slice).unwrap_or(&[]);
                self.generate_paragraph(None, None, Alignment::Left, runs);
                self.output.push_str("</w:tc>");
            }
            self.output.push_str("</w:tr>\n");
        }

        self.output.push_str("</w:tbl>\n");
    }
}

/// Normalize `#rrggbb` / `rrggbb` to `RRGGBB`; anything else is dropped
fn hex_color(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_uppercase())
    } else {
        None
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
