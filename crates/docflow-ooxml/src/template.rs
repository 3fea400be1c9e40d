//! Placeholder templating for DOCX documents
//!
//! A [`DocxTemplate`] holds an unpacked Word package whose text contains
//! substitution points such as `{companyName}`. Rendering replaces every
//! placeholder with its bound value and packs a fresh document; the
//! template itself is never modified, so it can be rendered again with
//! different data.
//!
//! Word frequently splits what the author typed as one placeholder over
//! several runs (`<w:t>{company</w:t>` ... `<w:t>Name}</w:t>`). Matching is
//! therefore done on the concatenated text of each paragraph, and the
//! replacement is written into the run that held the opening delimiter.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use docflow_ooxml::{DocxTemplate, FillOptions};
//!
//! let template = DocxTemplate::from_bytes(&std::fs::read("invoice.docx")?)?;
//! let mut data = BTreeMap::new();
//! data.insert("companyName".to_string(), "Acme".to_string());
//! let rendered = template.render(&data, &FillOptions::default())?;
//! std::fs::write("filled_document.docx", rendered.document)?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::archive::OoxmlArchive;
use crate::error::{OoxmlError, Result};

/// Source of placeholder values
pub trait Bindings {
    /// Value bound to `name`, if any
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl Bindings for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> Bindings for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Start/end markers identifying a substitution point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    /// Create a delimiter pair
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{", "}")
    }
}

/// What to do with a placeholder that has no bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Substitute an empty string and report the field as missing
    #[default]
    Empty,
    /// Fail with [`OoxmlError::MissingValue`]
    Error,
}

/// Options controlling placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Substitution markers
    pub delimiters: Delimiters,
    /// Handling of unbound placeholders
    pub missing: MissingPolicy,
    /// Turn `\n` in values into Word line breaks
    pub linebreaks: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            missing: MissingPolicy::Empty,
            linebreaks: true,
        }
    }
}

/// Result of rendering a template
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The generated DOCX package
    pub document: Vec<u8>,
    /// Placeholders that had no bound value (in order of first use)
    pub missing: Vec<String>,
}

/// A Word document used as a placeholder template
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    archive: OoxmlArchive,
}

impl DocxTemplate {
    /// Load a template from bytes, checking it is a Word package
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let archive = OoxmlArchive::word_package(bytes)?;
        Ok(Self { archive })
    }

    /// Placeholder names used by the template, in document order, deduplicated
    pub fn placeholders(&self, delimiters: &Delimiters) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for part in self.archive.text_parts() {
            let xml = self
                .archive
                .get(&part)
                .ok_or_else(|| OoxmlError::MissingFile(part.clone()))?;
            let events = read_events(xml)?;
            for paragraph in collect_paragraphs(&events) {
                let joined: String = paragraph.iter().map(|slot| slot.text.as_str()).collect();
                for tag in scan_tags(&joined, delimiters)? {
                    if !names.contains(&tag.name) {
                        names.push(tag.name);
                    }
                }
            }
        }
        Ok(names)
    }

    /// Render the template with the given bindings
    pub fn render(&self, bindings: &dyn Bindings, options: &FillOptions) -> Result<Rendered> {
        let mut archive = self.archive.clone();
        let mut missing = Vec::new();

        for part in archive.text_parts() {
            let xml = archive
                .get(&part)
                .ok_or_else(|| OoxmlError::MissingFile(part.clone()))?;
            let rendered = render_part(xml, bindings, options, &mut missing)?;
            archive.set(part, rendered);
        }

        Ok(Rendered {
            document: archive.to_bytes()?,
            missing,
        })
    }
}

/// Fill only the placeholders `bindings` knows, leaving all other text as is
///
/// Meant for free text typed by a user, where braces are ordinary
/// characters: unknown names, stray delimiters and unclosed tags are kept
/// verbatim and never fail.
pub fn fill_bound_text(text: &str, bindings: &dyn Bindings, delimiters: &Delimiters) -> String {
    let (open, close) = (delimiters.start.as_str(), delimiters.end.as_str());
    if open.is_empty() || close.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(open) {
        out.push_str(&rest[..at]);
        let after_open = &rest[at + open.len()..];
        let bound = after_open.find(close).and_then(|len| {
            let name = after_open[..len].trim();
            bindings
                .lookup(name)
                .map(|value| (value, at + open.len() + len + close.len()))
        });
        match bound {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &rest[consumed..];
            }
            None => {
                out.push_str(open);
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

/// The text of one `<w:t>` element
#[derive(Debug, Clone)]
struct TextSlot {
    /// Index of the `<w:t>` start event
    start_event: usize,
    /// Index of the text event inside it
    text_event: usize,
    text: String,
    changed: bool,
}

/// A placeholder located in a paragraph's concatenated text
#[derive(Debug, Clone, PartialEq)]
struct Tag {
    /// Byte offset of the opening delimiter
    start: usize,
    /// Byte offset just past the closing delimiter
    end: usize,
    name: String,
}

fn read_events(xml: &[u8]) -> Result<Vec<Event<'static>>> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace inside runs is significant
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            event => events.push(event.into_owned()),
        }
        buf.clear();
    }
    Ok(events)
}

/// Group the `<w:t>` text of each paragraph, innermost paragraph first
fn collect_paragraphs(events: &[Event<'static>]) -> Vec<Vec<TextSlot>> {
    let mut finished = Vec::new();
    let mut open: Vec<Vec<TextSlot>> = Vec::new();
    let mut text_start: Option<usize> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:p" => open.push(Vec::new()),
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                if let Some(paragraph) = open.pop() {
                    finished.push(paragraph);
                }
            }
            Event::Start(e) if e.name().as_ref() == b"w:t" => text_start = Some(index),
            Event::End(e) if e.name().as_ref() == b"w:t" => text_start = None,
            Event::Text(t) => {
                if let (Some(start_event), Some(paragraph)) = (text_start, open.last_mut()) {
                    let text = t
                        .unescape()
                        .map(|cow| cow.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(t).into_owned());
                    paragraph.push(TextSlot {
                        start_event,
                        text_event: index,
                        text,
                        changed: false,
                    });
                }
            }
            _ => {}
        }
    }

    finished
}

fn render_part(
    xml: &[u8],
    bindings: &dyn Bindings,
    options: &FillOptions,
    missing: &mut Vec<String>,
) -> Result<Vec<u8>> {
    let events = read_events(xml)?;

    let mut replaced: HashMap<usize, String> = HashMap::new();
    let mut preserve: Vec<usize> = Vec::new();
    for mut paragraph in collect_paragraphs(&events) {
        substitute_paragraph(&mut paragraph, bindings, options, missing)?;
        for slot in paragraph.into_iter().filter(|slot| slot.changed) {
            preserve.push(slot.start_event);
            replaced.insert(slot.text_event, slot.text);
        }
    }

    if replaced.is_empty() {
        return Ok(xml.to_vec());
    }

    let mut writer = Writer::new(Vec::new());
    for (index, event) in events.into_iter().enumerate() {
        if let Some(text) = replaced.remove(&index) {
            write_text(&mut writer, &text, options.linebreaks)?;
            continue;
        }
        match event {
            Event::Start(e) if preserve.contains(&index) => {
                writer.write_event(Event::Start(with_space_preserve(&e)))?;
            }
            other => writer.write_event(other)?,
        }
    }
    Ok(writer.into_inner())
}

/// Write replacement text, splitting lines into `<w:br/>`-separated runs of text
fn write_text(writer: &mut Writer<Vec<u8>>, text: &str, linebreaks: bool) -> Result<()> {
    if !linebreaks || !text.contains('\n') {
        writer.write_event(Event::Text(BytesText::new(text)))?;
        return Ok(());
    }

    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        writer.write_event(Event::Text(BytesText::new(first.trim_end_matches('\r'))))?;
    }
    for line in lines {
        writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
        let mut start = BytesStart::new("w:t");
        start.push_attribute(("xml:space", "preserve"));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(line.trim_end_matches('\r'))))?;
    }
    Ok(())
}

fn with_space_preserve(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut owned = start.clone().into_owned();
    let has_space = owned
        .attributes()
        .filter_map(|a| a.ok())
        .any(|a| a.key.as_ref() == b"xml:space");
    if !has_space {
        owned.push_attribute(("xml:space", "preserve"));
    }
    owned
}

fn substitute_paragraph(
    slots: &mut [TextSlot],
    bindings: &dyn Bindings,
    options: &FillOptions,
    missing: &mut Vec<String>,
) -> Result<()> {
    let joined: String = slots.iter().map(|slot| slot.text.as_str()).collect();
    let tags = scan_tags(&joined, &options.delimiters)?;

    // Back to front, so earlier offsets stay valid
    for tag in tags.iter().rev() {
        let value = match bindings.lookup(&tag.name) {
            Some(value) => value,
            None => match options.missing {
                MissingPolicy::Empty => {
                    if !missing.contains(&tag.name) {
                        missing.push(tag.name.clone());
                    }
                    ""
                }
                MissingPolicy::Error => {
                    return Err(OoxmlError::MissingValue {
                        field: tag.name.clone(),
                    })
                }
            },
        };
        splice(slots, tag.start, tag.end, value);
    }
    Ok(())
}

/// Replace `start..end` of the concatenated text with `value`
///
/// The value goes into the slot holding the opening delimiter; the rest
/// of the placeholder is cut out of whichever slots it spans.
fn splice(slots: &mut [TextSlot], start: usize, end: usize, value: &str) {
    let mut offset = 0;
    let mut inserted = false;
    for slot in slots.iter_mut() {
        let slot_start = offset;
        let slot_end = offset + slot.text.len();
        offset = slot_end;

        if slot_end <= start || slot_start >= end {
            continue;
        }

        let local_start = start.saturating_sub(slot_start);
        let local_end = (end - slot_start).min(slot.text.len());
        let replacement = if inserted { "" } else { value };
        inserted = true;
        slot.text.replace_range(local_start..local_end, replacement);
        slot.changed = true;
    }
}

fn scan_tags(text: &str, delimiters: &Delimiters) -> Result<Vec<Tag>> {
    let (open, close) = (delimiters.start.as_str(), delimiters.end.as_str());
    if open.is_empty() || close.is_empty() {
        return Err(OoxmlError::InvalidStructure(
            "placeholder delimiters must not be empty".to_string(),
        ));
    }
    let mut tags = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let next_open = rest.find(open).map(|i| i + pos);
        let next_close = rest.find(close).map(|i| i + pos);

        let start = match (next_open, next_close) {
            (None, None) => break,
            (None, Some(c)) => return Err(unopened(text, c)),
            (Some(o), Some(c)) if c < o => return Err(unopened(text, c)),
            (Some(o), _) => o,
        };

        let inner_start = start + open.len();
        let close_at = text[inner_start..]
            .find(close)
            .map(|i| i + inner_start)
            .ok_or_else(|| unclosed(text, start))?;
        let inner = &text[inner_start..close_at];
        if inner.contains(open) {
            return Err(unclosed(text, start));
        }

        let end = close_at + close.len();
        tags.push(Tag {
            start,
            end,
            name: inner.trim().to_string(),
        });
        pos = end;
    }

    Ok(tags)
}

fn unclosed(text: &str, at: usize) -> OoxmlError {
    OoxmlError::UnclosedTag {
        tag: text[at..].chars().take(24).collect(),
    }
}

fn unopened(text: &str, at: usize) -> OoxmlError {
    let from = text[..at]
        .char_indices()
        .rev()
        .nth(23)
        .map(|(i, _)| i)
        .unwrap_or(0);
    OoxmlError::UnopenedTag {
        context: text[from..]
            .chars()
            .take(at - from + 1)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn slots(parts: &[&str]) -> Vec<TextSlot> {
        parts
            .iter()
            .enumerate()
            .map(|(i, text)| TextSlot {
                start_event: i * 3,
                text_event: i * 3 + 1,
                text: text.to_string(),
                changed: false,
            })
            .collect()
    }

    #[test]
    fn test_scan_single_tag() {
        let tags = scan_tags("Hello {name}!", &Delimiters::default()).unwrap();
        assert_eq!(
            tags,
            vec![Tag {
                start: 6,
                end: 12,
                name: "name".to_string()
            }]
        );
    }

    #[test]
    fn test_scan_trims_tag_names() {
        let tags = scan_tags("{ companyName }", &Delimiters::default()).unwrap();
        assert_eq!(tags[0].name, "companyName");
    }

    #[test]
    fn test_scan_custom_delimiters() {
        let delimiters = Delimiters::new("{{", "}}");
        let tags = scan_tags("A {{a}} and {{b}}, {c}", &delimiters).unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_scan_unclosed_tag() {
        let err = scan_tags("Dear {name", &Delimiters::default()).unwrap_err();
        assert!(matches!(err, OoxmlError::UnclosedTag { .. }));
    }

    #[test]
    fn test_scan_nested_open_is_unclosed() {
        let err = scan_tags("{a {b}", &Delimiters::default()).unwrap_err();
        assert!(matches!(err, OoxmlError::UnclosedTag { .. }));
    }

    #[test]
    fn test_scan_unopened_tag() {
        let err = scan_tags("price} {x}", &Delimiters::default()).unwrap_err();
        match err {
            OoxmlError::UnopenedTag { context } => assert_eq!(context, "price}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_splice_across_slots() {
        let mut parts = slots(&["Company: {comp", "any", "Name} Ltd"]);
        let data = bindings(&[("companyName", "Acme")]);
        let mut missing = Vec::new();
        substitute_paragraph(&mut parts, &data, &FillOptions::default(), &mut missing).unwrap();

        assert_eq!(parts[0].text, "Company: Acme");
        assert_eq!(parts[1].text, "");
        assert_eq!(parts[2].text, " Ltd");
        assert!(parts.iter().all(|slot| slot.changed));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_splice_leaves_untouched_slots_unchanged() {
        let mut parts = slots(&["Intro ", "{a}", " outro"]);
        let data = bindings(&[("a", "x")]);
        let mut missing = Vec::new();
        substitute_paragraph(&mut parts, &data, &FillOptions::default(), &mut missing).unwrap();

        assert!(!parts[0].changed);
        assert!(parts[1].changed);
        assert!(!parts[2].changed);
        assert_eq!(parts[1].text, "x");
    }

    #[test]
    fn test_missing_value_empty_policy() {
        let mut missing = Vec::new();
        let mut parts = slots(&["{a}-{b}-{a}"]);
        substitute_paragraph(&mut parts, &bindings(&[]), &FillOptions::default(), &mut missing)
            .unwrap();
        assert_eq!(parts[0].text, "--");
        assert_eq!(missing, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_value_error_policy() {
        let options = FillOptions {
            missing: MissingPolicy::Error,
            ..FillOptions::default()
        };
        let mut parts = slots(&["{a}"]);
        let err = substitute_paragraph(&mut parts, &bindings(&[]), &options, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, OoxmlError::MissingValue { field } if field == "a"));
    }

    #[test]
    fn test_fill_bound_text_keeps_unknown_and_stray_braces() {
        let values = bindings(&[("companyName", "Acme")]);
        let braces = Delimiters::default();

        assert_eq!(
            fill_bound_text("Dear { companyName },", &values, &braces),
            "Dear Acme,"
        );
        assert_eq!(
            fill_bound_text("if (ok) { retry }", &values, &braces),
            "if (ok) { retry }"
        );
        assert_eq!(fill_bound_text("smile :}", &values, &braces), "smile :}");
        assert_eq!(
            fill_bound_text("{ {companyName}", &values, &braces),
            "{ Acme"
        );
        assert_eq!(fill_bound_text("open {", &values, &braces), "open {");
    }

    #[test]
    fn test_render_part_escapes_and_preserves_space() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>{who}</w:t></w:r></w:p></w:body></w:document>"#;
        let data = bindings(&[("who", " Tom & Jerry")]);
        let out = render_part(xml, &data, &FillOptions::default(), &mut Vec::new()).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"<w:t xml:space="preserve"> Tom &amp; Jerry</w:t>"#));
    }

    #[test]
    fn test_render_part_linebreaks() {
        let xml = br#"<w:p><w:r><w:t>{addr}</w:t></w:r></w:p>"#;
        let data = bindings(&[("addr", "Line 1\nLine 2")]);
        let out = render_part(xml, &data, &FillOptions::default(), &mut Vec::new()).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"Line 1</w:t><w:br/><w:t xml:space="preserve">Line 2</w:t>"#));
    }

    #[test]
    fn test_render_part_without_tags_is_identity() {
        let xml = br#"<w:p><w:r><w:t>No placeholders</w:t></w:r></w:p>"#;
        let out = render_part(xml, &bindings(&[]), &FillOptions::default(), &mut Vec::new())
            .unwrap();
        assert_eq!(out, xml.to_vec());
    }
}
