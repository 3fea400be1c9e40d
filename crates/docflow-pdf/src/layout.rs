//! Text layout: unit conversion, line wrapping and content operations

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use crate::font::{encode_text, text_width, FONT_RESOURCE};

/// Line height as a multiple of the font size
pub const LINE_HEIGHT: f32 = 1.2;

/// Convert millimetres to PDF points
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Convert PDF points to millimetres
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// Break `text` into lines no wider than `max_width` points
///
/// Explicit newlines are kept. Words wider than a whole line are split
/// between characters.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if text_width(&candidate, font_size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            // Hard-split a word that cannot fit on a line of its own
            for c in word.chars() {
                line.push(c);
                if text_width(&line, font_size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, c.to_string()));
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// A rectangle of text in page coordinates (points, origin bottom-left)
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub top: f32,
    pub width: f32,
    /// Available height; lines beyond it are clipped
    pub height: f32,
    pub font_size: f32,
}

impl TextBlock {
    /// Lines of `text` that fit the block
    pub fn fit_lines(&self, text: &str) -> Vec<String> {
        let leading = self.font_size * LINE_HEIGHT;
        let capacity = if self.height < self.font_size {
            1
        } else {
            1usize.saturating_add(((self.height - self.font_size) / leading).floor() as usize)
        };
        let mut lines = wrap_text(text, self.width, self.font_size);
        lines.truncate(capacity);
        lines
    }

    /// Content stream operations drawing `lines` from the top of the block
    pub fn operations(&self, lines: &[String]) -> Vec<Operation> {
        let leading = self.font_size * LINE_HEIGHT;
        let baseline = self.top - self.font_size;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), self.font_size.into()]),
            Operation::new("TL", vec![leading.into()]),
            Operation::new("Td", vec![self.x.into(), baseline.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                ops.push(Operation::new("T*", vec![]));
            }
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encode_text(line), StringFormat::Literal)],
            ));
        }
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("Q", vec![]));
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 0.001);
        assert!((pt_to_mm(mm_to_pt(10.0)) - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_wrap_keeps_short_lines() {
        assert_eq!(wrap_text("Acme", 200.0, 12.0), vec!["Acme"]);
    }

    #[test]
    fn test_wrap_breaks_on_spaces() {
        // "aaaa" is 4 * 556 * 12 / 1000 = 26.7pt wide
        let lines = wrap_text("aaaa aaaa aaaa", 60.0, 12.0);
        assert_eq!(lines, vec!["aaaa aaaa", "aaaa"]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let lines = wrap_text("aaaaaaaaaa", 30.0, 12.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "aaaaaaaaaa");
        assert!(lines.iter().all(|l| text_width(l, 12.0) <= 30.0));
    }

    #[test]
    fn test_wrap_keeps_newlines_and_empty_lines() {
        assert_eq!(wrap_text("a\n\nb", 100.0, 12.0), vec!["a", "", "b"]);
    }

    #[test]
    fn test_fit_lines_clips_to_height() {
        let block = TextBlock {
            x: 0.0,
            top: 100.0,
            width: 500.0,
            height: 30.0,
            font_size: 10.0,
        };
        // 10pt first line, then 12pt per extra line: 1 + floor(20 / 12) = 2
        assert_eq!(block.fit_lines("1\n2\n3\n4").len(), 2);
    }

    #[test]
    fn test_operations_draw_each_line() {
        let block = TextBlock {
            x: 10.0,
            top: 800.0,
            width: 500.0,
            height: 100.0,
            font_size: 12.0,
        };
        let ops = block.operations(&["one".to_string(), "two".to_string()]);
        let tj = ops.iter().filter(|op| op.operator == "Tj").count();
        let next_line = ops.iter().filter(|op| op.operator == "T*").count();
        assert_eq!(tj, 2);
        assert_eq!(next_line, 1);
    }
}
