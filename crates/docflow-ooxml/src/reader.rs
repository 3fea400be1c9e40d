//! DOCX import into the rich-text model
//!
//! Parses `word/document.xml` (plus `word/numbering.xml` to tell bulleted
//! from numbered lists) into a [`RichDocument`]. Only what the model can
//! represent is kept: paragraph styles are reduced to headings and quotes,
//! images and fields are dropped, nested tables are flattened to text.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::archive::OoxmlArchive;
use crate::error::Result;
use crate::rich_text::{Alignment, RichBlock, RichDocument, RunMarks, TextRun, VertAlign};

/// Reads Word documents into [`RichDocument`]s
pub struct DocxReader;

impl DocxReader {
    /// Import a DOCX package held in memory
    pub fn read(bytes: &[u8]) -> Result<RichDocument> {
        let archive = OoxmlArchive::word_package(bytes)?;
        Self::read_archive(&archive)
    }

    /// Import from an unpacked archive
    pub fn read_archive(archive: &OoxmlArchive) -> Result<RichDocument> {
        let ordered_lists = archive
            .numbering_xml()
            .map(parse_ordered_num_ids)
            .unwrap_or_default();
        parse_document(archive.document_xml()?, &ordered_lists)
    }
}

#[derive(Default)]
struct ParagraphBuilder {
    style_id: Option<String>,
    num_id: Option<u32>,
    align: Alignment,
    has_bottom_border: bool,
    runs: Vec<TextRun>,
}

impl ParagraphBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

#[derive(Default)]
struct RunBuilder {
    text: String,
    marks: RunMarks,
}

impl RunBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn build(self) -> TextRun {
        TextRun {
            text: self.text,
            marks: self.marks,
        }
    }
}

#[derive(Default)]
struct TableBuilder {
    header: bool,
    rows: Vec<Vec<Vec<TextRun>>>,
    current_row: Option<Vec<Vec<TextRun>>>,
    current_cell: Option<Vec<TextRun>>,
}

/// Where finished blocks are collected while walking the body
struct BlockSink<'a> {
    blocks: Vec<RichBlock>,
    ordered_lists: &'a HashMap<u32, bool>,
}

impl BlockSink<'_> {
    fn push_paragraph(&mut self, para: ParagraphBuilder) {
        let style = para.style_id.as_deref().map(str::to_ascii_lowercase);

        if let Some(num_id) = para.num_id.filter(|id| *id != 0) {
            let ordered = self.ordered_lists.get(&num_id).copied().unwrap_or(false);
            if let Some(RichBlock::List {
                ordered: last_ordered,
                items,
            }) = self.blocks.last_mut()
            {
                if *last_ordered == ordered {
                    items.push(para.runs);
                    return;
                }
            }
            self.blocks.push(RichBlock::List {
                ordered,
                items: vec![para.runs],
            });
            return;
        }

        if para.has_bottom_border && para.is_blank() {
            self.blocks.push(RichBlock::Rule);
            return;
        }

        let block = match style.as_deref() {
            Some("heading1") | Some("title") => RichBlock::Heading {
                level: 1,
                runs: para.runs,
            },
            Some(s) if s.starts_with("heading") => RichBlock::Heading {
                level: 2,
                runs: para.runs,
            },
            Some("quote") | Some("intensequote") => RichBlock::Quote { runs: para.runs },
            _ => RichBlock::Paragraph {
                align: para.align,
                runs: para.runs,
            },
        };
        self.blocks.push(block);
    }
}

fn parse_document(xml: &[u8], ordered_lists: &HashMap<u32, bool>) -> Result<RichDocument> {
    let mut reader = Reader::from_reader(xml);
    // Don't trim text - whitespace in runs is content
    reader.config_mut().trim_text(false);

    let mut sink = BlockSink {
        blocks: Vec::new(),
        ordered_lists,
    };
    let mut buf = Vec::new();

    let mut in_body = false;
    let mut in_rpr = false;
    let mut in_text = false;
    let mut in_border = false;
    let mut table_depth = 0u32;
    let mut current_para: Option<ParagraphBuilder> = None;
    let mut current_run: Option<RunBuilder> = None;
    let mut current_table: Option<TableBuilder> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"body" => in_body = true,
                    b"tbl" if in_body => {
                        table_depth += 1;
                        if table_depth == 1 {
                            current_table = Some(TableBuilder::default());
                        }
                    }
                    b"tr" if table_depth == 1 => {
                        if let Some(table) = current_table.as_mut() {
                            table.current_row = Some(Vec::new());
                        }
                    }
                    b"tc" if table_depth == 1 => {
                        if let Some(table) = current_table.as_mut() {
                            table.current_cell = Some(Vec::new());
                        }
                    }
                    b"p" if in_body && table_depth == 0 => {
                        current_para = Some(ParagraphBuilder::new());
                    }
                    b"p" if table_depth > 0 && current_para.is_none() => {
                        current_para = Some(ParagraphBuilder::new());
                    }
                    b"pBdr" => in_border = true,
                    b"r" if current_para.is_some() => current_run = Some(RunBuilder::new()),
                    b"rPr" if current_run.is_some() => in_rpr = true,
                    b"t" if current_run.is_some() => in_text = true,
                    _ => handle_property(e, &mut current_para, &mut current_run, in_rpr, in_border),
                }
            }
            Event::Empty(ref e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"tab" if current_run.is_some() && !in_rpr => {
                        push_run_text(&mut current_run, "\t");
                    }
                    b"br" | b"cr" if current_run.is_some() => {
                        push_run_text(&mut current_run, "\n");
                    }
                    b"tblHeader" => {
                        if let Some(table) = current_table.as_mut() {
                            if table.rows.is_empty() {
                                table.header = true;
                            }
                        }
                    }
                    _ => handle_property(e, &mut current_para, &mut current_run, in_rpr, in_border),
                }
            }
            Event::Text(ref t) if in_text => {
                let text = t.unescape()?;
                push_run_text(&mut current_run, &text);
            }
            Event::End(ref e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"t" => in_text = false,
                    b"rPr" => in_rpr = false,
                    b"pBdr" => in_border = false,
                    b"r" => {
                        if let (Some(run), Some(para)) = (current_run.take(), current_para.as_mut())
                        {
                            let run = run.build();
                            // Merge adjacent runs with identical formatting
                            let same_marks =
                                para.runs.last().is_some_and(|last| last.marks == run.marks);
                            if same_marks {
                                if let Some(last) = para.runs.last_mut() {
                                    last.text.push_str(&run.text);
                                }
                            } else if !run.text.is_empty() {
                                para.runs.push(run);
                            }
                        }
                    }
                    b"p" => {
                        if let Some(para) = current_para.take() {
                            match current_table.as_mut() {
                                Some(table) => {
                                    if let Some(cell) = table.current_cell.as_mut() {
                                        if !cell.is_empty() && !para.runs.is_empty() {
                                            cell.push(TextRun::plain("\n"));
                                        }
                                        cell.extend(para.runs);
                                    }
                                }
                                None => sink.push_paragraph(para),
                            }
                        }
                    }
                    b"tc" if table_depth == 1 => {
                        if let Some(table) = current_table.as_mut() {
                            if let (Some(cell), Some(row)) =
                                (table.current_cell.take(), table.current_row.as_mut())
                            {
                                row.push(cell);
                            }
                        }
                    }
                    b"tr" if table_depth == 1 => {
                        if let Some(table) = current_table.as_mut() {
                            if let Some(row) = table.current_row.take() {
                                table.rows.push(row);
                            }
                        }
                    }
                    b"tbl" if table_depth > 0 => {
                        table_depth -= 1;
                        if table_depth == 0 {
                            if let Some(table) = current_table.take() {
                                sink.blocks.push(RichBlock::Table {
                                    header: table.header,
                                    rows: table.rows,
                                });
                            }
                        }
                    }
                    b"body" => in_body = false,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(RichDocument {
        blocks: sink.blocks,
    })
}

fn push_run_text(run: &mut Option<RunBuilder>, text: &str) {
    if let Some(run) = run.as_mut() {
        run.text.push_str(text);
    }
}

/// Apply paragraph and run property elements
fn handle_property(
    e: &BytesStart,
    para: &mut Option<ParagraphBuilder>,
    run: &mut Option<RunBuilder>,
    in_rpr: bool,
    in_border: bool,
) {
    let name = e.local_name();

    if in_rpr {
        let Some(run) = run.as_mut() else {
            return;
        };
        let marks = &mut run.marks;
        match name.as_ref() {
            b"b" => marks.bold = is_on(e),
            b"i" => marks.italic = is_on(e),
            b"strike" | b"dstrike" => marks.strike = is_on(e),
            b"u" => {
                marks.underline = get_attr(e, b"w:val")
                    .map(|v| v != "none" && v != "0")
                    .unwrap_or(true)
            }
            b"vertAlign" => {
                marks.vert_align = match get_attr(e, b"w:val").as_deref() {
                    Some("superscript") => Some(VertAlign::Superscript),
                    Some("subscript") => Some(VertAlign::Subscript),
                    _ => None,
                }
            }
            b"sz" => {
                marks.size = get_attr(e, b"w:val")
                    .and_then(|v| v.parse::<f32>().ok())
                    .map(|half_points| half_points / 2.0)
            }
            b"rFonts" => marks.font = get_attr(e, b"w:ascii"),
            b"color" => {
                marks.color = get_attr(e, b"w:val").filter(|v| v != "auto");
            }
            b"shd" => {
                marks.highlight = get_attr(e, b"w:fill").filter(|v| v != "auto");
            }
            b"highlight" => {
                marks.highlight = get_attr(e, b"w:val")
                    .and_then(|v| highlight_hex(&v))
                    .map(str::to_string);
            }
            _ => {}
        }
        return;
    }

    let Some(para) = para.as_mut() else {
        return;
    };
    match name.as_ref() {
        b"pStyle" => para.style_id = get_attr(e, b"w:val"),
        b"numId" => para.num_id = get_attr(e, b"w:val").and_then(|v| v.parse().ok()),
        b"jc" => {
            para.align = match get_attr(e, b"w:val").as_deref() {
                Some("center") => Alignment::Center,
                Some("right") | Some("end") => Alignment::Right,
                Some("both") | Some("distribute") => Alignment::Justify,
                _ => Alignment::Left,
            }
        }
        b"bottom" if in_border => {
            para.has_bottom_border = get_attr(e, b"w:val").is_some_and(|v| v != "none" && v != "nil")
        }
        _ => {}
    }
}

/// Map numbering instances to whether their first level is numbered
fn parse_ordered_num_ids(xml: &[u8]) -> HashMap<u32, bool> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut abstract_ordered: HashMap<u32, bool> = HashMap::new();
    let mut num_to_abstract: HashMap<u32, u32> = HashMap::new();
    let mut buf = Vec::new();

    let mut current_abstract: Option<u32> = None;
    let mut current_num: Option<u32> = None;
    let mut level: Option<u32> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => {
                    current_abstract =
                        get_attr(e, b"w:abstractNumId").and_then(|v| v.parse().ok());
                }
                b"lvl" => level = get_attr(e, b"w:ilvl").and_then(|v| v.parse().ok()),
                b"numFmt" if level == Some(0) => {
                    if let Some(id) = current_abstract {
                        let ordered = get_attr(e, b"w:val")
                            .map(|v| v != "bullet" && v != "none")
                            .unwrap_or(false);
                        abstract_ordered.insert(id, ordered);
                    }
                }
                b"num" => current_num = get_attr(e, b"w:numId").and_then(|v| v.parse().ok()),
                b"abstractNumId" => {
                    if let (Some(num), Some(abs)) = (
                        current_num,
                        get_attr(e, b"w:val").and_then(|v| v.parse().ok()),
                    ) {
                        num_to_abstract.insert(num, abs);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => current_abstract = None,
                b"lvl" => level = None,
                b"num" => current_num = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    num_to_abstract
        .into_iter()
        .map(|(num, abs)| (num, abstract_ordered.get(&abs).copied().unwrap_or(false)))
        .collect()
}

/// Hex value of a named Word highlight colour
fn highlight_hex(name: &str) -> Option<&'static str> {
    let hex = match name {
        "yellow" => "FFFF00",
        "green" => "00FF00",
        "cyan" => "00FFFF",
        "magenta" => "FF00FF",
        "blue" => "0000FF",
        "red" => "FF0000",
        "darkBlue" => "000080",
        "darkCyan" => "008080",
        "darkGreen" => "008000",
        "darkMagenta" => "800080",
        "darkRed" => "800000",
        "darkYellow" => "808000",
        "darkGray" => "808080",
        "lightGray" => "C0C0C0",
        "black" => "000000",
        "white" => "FFFFFF",
        _ => return None,
    };
    Some(hex)
}

fn is_on(e: &BytesStart) -> bool {
    // w:val="0" or "false" switches the property off
    get_attr(e, b"w:val")
        .map(|v| v != "0" && v != "false")
        .unwrap_or(true)
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}
