//! Editor commands and the formatting state reflected to toolbars

use serde::{Deserialize, Serialize};

/// A command accepted by the canvas editor
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    Undo,
    Redo,
    /// Font family of the selection
    Font(String),
    /// Font size in points
    Size(f32),
    Bold,
    Italic,
    Underline,
    Strikeout,
    Superscript,
    Subscript,
    /// Text colour as `#RRGGBB`
    Color(String),
    /// Highlight colour as `#RRGGBB`
    Highlight(String),
    /// Replace the selection with text
    InsertText(String),
    /// Select characters `start..end`
    SelectRange { start: usize, end: usize },
    /// Replace the content with an uploaded DOCX
    ImportDocx(Vec<u8>),
}

impl EditorCommand {
    /// Whether the command changes content and so belongs in the undo history
    pub fn is_edit(&self) -> bool {
        !matches!(
            self,
            EditorCommand::Undo | EditorCommand::Redo | EditorCommand::SelectRange { .. }
        )
    }
}

/// Formatting at the start of the current selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub font: String,
    pub size: f32,
    pub color: String,
    pub highlight: String,
}

impl Default for FormattingState {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            superscript: false,
            subscript: false,
            font: "Arial".to_string(),
            size: 16.0,
            color: "#000000".to_string(),
            highlight: "#ffff00".to_string(),
        }
    }
}
