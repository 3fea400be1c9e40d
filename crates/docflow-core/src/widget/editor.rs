//! Canvas-style rich-text editor
//!
//! Content is a flat list of characters, each carrying its own marks, with
//! `'\n'` separating paragraphs. Formatting commands apply to the selection,
//! or to the text typed next when the selection is collapsed.

use docflow_ooxml::{DocxReader, DocxWriter, RichBlock, RichDocument, RunMarks, TextRun, VertAlign};
use tracing::debug;

use super::command::{EditorCommand, FormattingState};
use super::surface::{Surface, SurfaceEvent};
use super::Widget;
use crate::error::Result;

/// Maximum undo history states to keep
pub const MAX_HISTORY_STATES: usize = 50;

const SELECTION_EVENTS: &[SurfaceEvent] =
    &[SurfaceEvent::MouseUp, SurfaceEvent::KeyUp, SurfaceEvent::Click];

#[derive(Debug, Clone, PartialEq)]
struct Element {
    value: char,
    marks: RunMarks,
}

#[derive(Debug, Clone)]
struct Snapshot {
    elements: Vec<Element>,
    selection: (usize, usize),
}

/// Element editor with undo history
#[derive(Debug, Clone)]
pub struct CanvasEditor {
    elements: Vec<Element>,
    selection: (usize, usize),
    pending_marks: RunMarks,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl CanvasEditor {
    /// Editor holding `document`, cursor at the start
    pub fn from_document(document: &RichDocument) -> Self {
        Self {
            elements: elements_of(document),
            selection: (0, 0),
            pending_marks: RunMarks::default(),
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Selected range as `(start, end)`
    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    /// Number of characters, paragraph breaks included
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn text(&self) -> String {
        self.elements.iter().map(|e| e.value).collect()
    }

    /// Run a command and re-render
    ///
    /// A failed import leaves the content and history untouched.
    pub fn execute(&mut self, command: EditorCommand, surface: &mut dyn Surface) -> Result<()> {
        debug!(?command, "editor command");
        let before = self.snapshot();
        let edited = command.is_edit();

        match command {
            EditorCommand::Undo => self.step_history(false),
            EditorCommand::Redo => self.step_history(true),
            EditorCommand::Font(font) => self.format(|m| m.font = Some(font.clone())),
            EditorCommand::Size(size) => self.format(|m| m.size = Some(size)),
            EditorCommand::Bold => self.toggle(|m| &mut m.bold),
            EditorCommand::Italic => self.toggle(|m| &mut m.italic),
            EditorCommand::Underline => self.toggle(|m| &mut m.underline),
            EditorCommand::Strikeout => self.toggle(|m| &mut m.strike),
            EditorCommand::Superscript => self.toggle_vert_align(VertAlign::Superscript),
            EditorCommand::Subscript => self.toggle_vert_align(VertAlign::Subscript),
            EditorCommand::Color(color) => {
                let color = hex(&color);
                self.format(|m| m.color = Some(color.clone()))
            }
            EditorCommand::Highlight(color) => {
                let color = hex(&color);
                self.format(|m| m.highlight = Some(color.clone()))
            }
            EditorCommand::InsertText(text) => self.insert(&text),
            EditorCommand::SelectRange { start, end } => self.select(start, end),
            EditorCommand::ImportDocx(bytes) => {
                let document = DocxReader::read(&bytes)?;
                self.elements = elements_of(&document);
                self.selection = (0, 0);
                self.pending_marks = RunMarks::default();
            }
        }

        // Marks staged on a collapsed cursor change nothing to undo
        if edited && self.elements != before.elements {
            self.undo.push(before);
            if self.undo.len() > MAX_HISTORY_STATES {
                self.undo.remove(0);
            }
            self.redo.clear();
        }
        self.render(surface);
        Ok(())
    }

    /// Content as a rich-text document, one paragraph per line
    pub fn to_rich_document(&self) -> RichDocument {
        let mut blocks = Vec::new();
        let mut runs: Vec<TextRun> = Vec::new();
        for element in &self.elements {
            if element.value == '\n' {
                blocks.push(paragraph(std::mem::take(&mut runs)));
                continue;
            }
            match runs.last_mut() {
                Some(run) if run.marks == element.marks => run.text.push(element.value),
                _ => runs.push(TextRun::with_marks(
                    element.value.to_string(),
                    element.marks.clone(),
                )),
            }
        }
        if !runs.is_empty() || !blocks.is_empty() {
            blocks.push(paragraph(runs));
        }
        RichDocument { blocks }
    }

    /// Serialize the content as DOCX
    pub fn export_docx(&self) -> Result<Vec<u8>> {
        Ok(DocxWriter::generate(&self.to_rich_document())?)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            elements: self.elements.clone(),
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.elements = snapshot.elements;
        self.selection = snapshot.selection;
        self.pending_marks = self.marks_at_cursor();
    }

    fn step_history(&mut self, forward: bool) {
        let (from, to) = if forward {
            (&mut self.redo, &mut self.undo)
        } else {
            (&mut self.undo, &mut self.redo)
        };
        if let Some(snapshot) = from.pop() {
            to.push(Snapshot {
                elements: self.elements.clone(),
                selection: self.selection,
            });
            self.restore(snapshot);
        }
    }

    fn select(&mut self, start: usize, end: usize) {
        let len = self.elements.len();
        let (start, end) = (start.min(len), end.min(len));
        self.selection = (start.min(end), start.max(end));
        self.pending_marks = self.marks_at_cursor();
    }

    fn marks_at_cursor(&self) -> RunMarks {
        let (start, end) = self.selection;
        let index = if start < end { Some(start) } else { start.checked_sub(1) };
        index
            .and_then(|i| self.elements.get(i))
            .filter(|e| e.value != '\n')
            .map(|e| e.marks.clone())
            .unwrap_or_default()
    }

    fn selected_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        let (start, end) = self.selection;
        self.elements[start..end]
            .iter_mut()
            .filter(|e| e.value != '\n')
    }

    fn format(&mut self, apply: impl Fn(&mut RunMarks)) {
        let (start, end) = self.selection;
        if start == end {
            apply(&mut self.pending_marks);
            return;
        }
        for element in self.selected_mut() {
            apply(&mut element.marks);
        }
    }

    /// Set a flag on the selection, or clear it when every character has it
    fn toggle(&mut self, flag: impl Fn(&mut RunMarks) -> &mut bool) {
        let (start, end) = self.selection;
        if start == end {
            let value = flag(&mut self.pending_marks);
            *value = !*value;
            return;
        }
        let all_set = self.selected_mut().all(|e| *flag(&mut e.marks));
        for element in self.selected_mut() {
            *flag(&mut element.marks) = !all_set;
        }
    }

    fn toggle_vert_align(&mut self, align: VertAlign) {
        let (start, end) = self.selection;
        if start == end {
            let marks = &mut self.pending_marks;
            marks.vert_align = if marks.vert_align == Some(align) {
                None
            } else {
                Some(align)
            };
            return;
        }
        let all_set = self
            .selected_mut()
            .all(|e| e.marks.vert_align == Some(align));
        let next = if all_set { None } else { Some(align) };
        for element in self.selected_mut() {
            element.marks.vert_align = next;
        }
    }

    fn insert(&mut self, text: &str) {
        let (start, end) = self.selection;
        let marks = self.pending_marks.clone();
        let inserted: Vec<Element> = text
            .chars()
            .filter(|c| *c != '\r')
            .map(|value| Element {
                value,
                marks: if value == '\n' {
                    RunMarks::default()
                } else {
                    marks.clone()
                },
            })
            .collect();
        let cursor = start + inserted.len();
        self.elements.splice(start..end, inserted);
        self.selection = (cursor, cursor);
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.reset();
        for line in self.text().split('\n') {
            surface.append(line);
        }
    }
}

impl Widget for CanvasEditor {
    type Props = RichDocument;

    fn construct(props: &RichDocument, surface: &mut dyn Surface) -> Result<Self> {
        let editor = Self::from_document(props);
        editor.render(surface);
        Ok(editor)
    }

    fn events(&self) -> &'static [SurfaceEvent] {
        SELECTION_EVENTS
    }

    fn formatting(&self) -> Option<FormattingState> {
        let marks = self.marks_at_cursor();
        let (start, end) = self.selection;
        let marks = if start == end {
            &self.pending_marks
        } else {
            &marks
        };
        let defaults = FormattingState::default();
        Some(FormattingState {
            bold: marks.bold,
            italic: marks.italic,
            underline: marks.underline,
            strikeout: marks.strike,
            superscript: marks.vert_align == Some(VertAlign::Superscript),
            subscript: marks.vert_align == Some(VertAlign::Subscript),
            font: marks.font.clone().unwrap_or(defaults.font),
            size: marks.size.unwrap_or(defaults.size),
            color: marks
                .color
                .as_ref()
                .map(|c| format!("#{}", c.to_ascii_lowercase()))
                .unwrap_or(defaults.color),
            highlight: marks
                .highlight
                .as_ref()
                .map(|c| format!("#{}", c.to_ascii_lowercase()))
                .unwrap_or(defaults.highlight),
        })
    }
}

fn paragraph(runs: Vec<TextRun>) -> RichBlock {
    RichBlock::Paragraph {
        align: Default::default(),
        runs,
    }
}

/// `#rrggbb` to the `RRGGBB` form stored in run marks
fn hex(color: &str) -> String {
    color.trim_start_matches('#').to_ascii_uppercase()
}

fn elements_of(document: &RichDocument) -> Vec<Element> {
    let mut elements = Vec::new();
    let push_runs = |elements: &mut Vec<Element>, runs: &[TextRun]| {
        for run in runs {
            for value in run.text.chars().filter(|c| *c != '\r') {
                let marks = if value == '\n' {
                    RunMarks::default()
                } else {
                    run.marks.clone()
                };
                elements.push(Element { value, marks });
            }
        }
    };
    let line_break = Element {
        value: '\n',
        marks: RunMarks::default(),
    };

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    for block in &document.blocks {
        match block {
            RichBlock::Heading { runs, .. }
            | RichBlock::Paragraph { runs, .. }
            | RichBlock::Quote { runs } => lines.push(runs.clone()),
            RichBlock::List { items, .. } => lines.extend(items.iter().cloned()),
            RichBlock::Table { rows, .. } => {
                for row in rows {
                    let mut line = Vec::new();
                    for (i, cell) in row.iter().enumerate() {
                        if i > 0 {
                            line.push(TextRun::plain("\t"));
                        }
                        line.extend(cell.iter().cloned());
                    }
                    lines.push(line);
                }
            }
            RichBlock::Rule => lines.push(Vec::new()),
        }
    }

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            elements.push(line_break.clone());
        }
        push_runs(&mut elements, line);
    }
    elements
}
