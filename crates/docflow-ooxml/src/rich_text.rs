//! Rich-text document model
//!
//! [`RichDocument`] is the editable form of a word-processor document: a
//! flat list of blocks (headings, paragraphs, lists, quotes, rules and
//! tables) whose text is made of formatted runs. It serializes to JSON for
//! storage and is exported to DOCX by [`crate::DocxWriter`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A complete rich-text document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichDocument {
    #[serde(default)]
    pub blocks: Vec<RichBlock>,
}

/// Block-level content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichBlock {
    /// Heading (level 1 or 2)
    Heading { level: u8, runs: Vec<TextRun> },
    /// Regular paragraph
    Paragraph {
        #[serde(default)]
        align: Alignment,
        runs: Vec<TextRun>,
    },
    /// Bulleted or numbered list; each item is one line of runs
    List {
        ordered: bool,
        items: Vec<Vec<TextRun>>,
    },
    /// Block quotation
    Quote { runs: Vec<TextRun> },
    /// Horizontal rule
    Rule,
    /// Table of plain cells; the first row is the header when `header` is set
    Table {
        #[serde(default)]
        header: bool,
        rows: Vec<Vec<Vec<TextRun>>>,
    },
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A span of text with uniform formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "RunMarks::is_plain")]
    pub marks: RunMarks,
}

/// Vertical alignment of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertAlign {
    Superscript,
    Subscript,
}

/// Character formatting of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMarks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vert_align: Option<VertAlign>,
    /// Size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Text colour as `RRGGBB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Highlight colour as `RRGGBB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl RunMarks {
    /// True when the run carries no formatting at all
    pub fn is_plain(&self) -> bool {
        *self == RunMarks::default()
    }
}

impl TextRun {
    /// Unformatted run
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: RunMarks::default(),
        }
    }

    /// Run with the given marks
    pub fn with_marks(text: impl Into<String>, marks: RunMarks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }
}

impl RichBlock {
    /// Plain paragraph holding a single unformatted run
    pub fn paragraph(text: impl Into<String>) -> Self {
        RichBlock::Paragraph {
            align: Alignment::Left,
            runs: vec![TextRun::plain(text)],
        }
    }

    /// Heading holding a single unformatted run
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        RichBlock::Heading {
            level: level.clamp(1, 2),
            runs: vec![TextRun::plain(text)],
        }
    }

    /// Mutable access to every run in the block
    pub fn runs_mut(&mut self) -> Vec<&mut TextRun> {
        match self {
            RichBlock::Heading { runs, .. }
            | RichBlock::Paragraph { runs, .. }
            | RichBlock::Quote { runs } => runs.iter_mut().collect(),
            RichBlock::List { items, .. } => items.iter_mut().flatten().collect(),
            RichBlock::Table { rows, .. } => rows.iter_mut().flatten().flatten().collect(),
            RichBlock::Rule => Vec::new(),
        }
    }

    fn plain_text(&self) -> String {
        let join = |runs: &[TextRun]| runs.iter().map(|r| r.text.as_str()).collect::<String>();
        match self {
            RichBlock::Heading { runs, .. }
            | RichBlock::Paragraph { runs, .. }
            | RichBlock::Quote { runs } => join(runs),
            RichBlock::List { items, .. } => items
                .iter()
                .map(|item| join(item))
                .collect::<Vec<_>>()
                .join("\n"),
            RichBlock::Table { rows, .. } => rows
                .iter()
                .map(|row| row.iter().map(|c| join(c)).collect::<Vec<_>>().join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
            RichBlock::Rule => String::new(),
        }
    }
}

impl RichDocument {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with one paragraph per line of `text`
    pub fn from_plain_text(text: &str) -> Self {
        Self {
            blocks: text.lines().map(RichBlock::paragraph).collect(),
        }
    }

    /// Parse the JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Text content, one block per line
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(RichBlock::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
