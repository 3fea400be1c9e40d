//! Reading back PDFs: page count and page text

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::document::{load, page_ids, page_size};
use crate::error::{PdfError, Result};
use crate::font::decode_text;

/// Kerning adjustments in a TJ array below this (in 1/1000 em) read as a space
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// A loaded PDF ready for inspection
pub struct PdfInfo {
    document: Document,
    pages: Vec<ObjectId>,
}

impl PdfInfo {
    /// Parse PDF bytes
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let document = load(bytes)?;
        let pages = page_ids(&document);
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(Self { document, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .copied()
            .ok_or(PdfError::PageOutOfRange {
                page,
                count: self.pages.len(),
            })
    }

    /// Size of a 1-based page in points
    pub fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        Ok(page_size(&self.document, self.page_id(page)?))
    }

    /// Text shown on a 1-based page, one line per text line
    pub fn page_text(&self, page: usize) -> Result<String> {
        let page_id = self.page_id(page)?;
        let raw = self.document.get_page_content(page_id)?;
        let content = Content::decode(&raw)?;
        Ok(collect_text(&content))
    }

    /// Text of every page, pages separated by a blank line
    pub fn text(&self) -> Result<String> {
        let mut pages = Vec::with_capacity(self.pages.len());
        for page in 1..=self.pages.len() {
            pages.push(self.page_text(page)?);
        }
        Ok(pages.join("\n\n"))
    }
}

fn collect_text(content: &Content) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    let mut break_line = |line: &mut String| {
        if !line.is_empty() {
            lines.push(std::mem::take(line));
        }
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    line.push_str(&decode_text(bytes));
                }
            }
            "'" | "\"" => {
                break_line(&mut line);
                if let Some(Object::String(bytes, _)) = op.operands.last() {
                    line.push_str(&decode_text(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => line.push_str(&decode_text(bytes)),
                            Object::Integer(i) if (*i as f32) < TJ_SPACE_THRESHOLD => {
                                line.push(' ')
                            }
                            Object::Real(r) if (*r as f32) < TJ_SPACE_THRESHOLD => line.push(' '),
                            _ => {}
                        }
                    }
                }
            }
            "T*" | "ET" => break_line(&mut line),
            "Td" | "TD" => {
                let moves_down = op
                    .operands
                    .get(1)
                    .map(|ty| match ty {
                        Object::Integer(i) => *i != 0,
                        Object::Real(r) => *r != 0.0,
                        _ => false,
                    })
                    .unwrap_or(false);
                if moves_down {
                    break_line(&mut line);
                }
            }
            _ => {}
        }
    }
    break_line(&mut line);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::StringFormat;

    fn text_op(op: &str, text: &str) -> Operation {
        Operation::new(
            op,
            vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
        )
    }

    #[test]
    fn test_collect_text_lines() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                text_op("Tj", "Company: "),
                text_op("Tj", "Acme"),
                Operation::new("T*", vec![]),
                text_op("Tj", "Lviv"),
                Operation::new("ET", vec![]),
            ],
        };
        assert_eq!(collect_text(&content), "Company: Acme\nLviv");
    }

    #[test]
    fn test_collect_text_tj_array_spacing() {
        let content = Content {
            operations: vec![Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::String(b"Hello".to_vec(), StringFormat::Literal),
                    Object::Integer(-250),
                    Object::String(b"World".to_vec(), StringFormat::Literal),
                    Object::Integer(-20),
                    Object::String(b"!".to_vec(), StringFormat::Literal),
                ])],
            )],
        };
        assert_eq!(collect_text(&content), "Hello World!");
    }

    #[test]
    fn test_page_out_of_range() {
        let bytes = crate::document::blank_a4().unwrap();
        let info = PdfInfo::load(&bytes).unwrap();
        assert!(matches!(
            info.page_text(0),
            Err(PdfError::PageOutOfRange { page: 0, count: 1 })
        ));
        assert!(info.page_text(2).is_err());
        assert_eq!(info.page_text(1).unwrap(), "");
    }
}
