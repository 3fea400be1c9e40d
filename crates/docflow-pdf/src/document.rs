//! Low-level document helpers on top of `lopdf`
//!
//! Creating blank A4 documents, resolving inherited page attributes,
//! registering our font on a page and overlaying new content streams.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{PdfError, Result};
use crate::font::{font_dictionary, FONT_RESOURCE};

/// A4 width in points
pub const A4_WIDTH: f32 = 595.28;
/// A4 height in points
pub const A4_HEIGHT: f32 = 841.89;

/// Page tree lookups stop after this many `/Parent` hops
const MAX_INHERIT_DEPTH: usize = 32;

/// Create a document of `pages` empty A4 pages
pub fn blank_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font_dictionary());
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages.max(1) {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), A4_WIDTH.into(), A4_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Serialized single-page blank A4 document
pub fn blank_a4() -> Result<Vec<u8>> {
    save(&mut blank_document(1))
}

/// Parse PDF bytes
pub fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(PdfError::Load)
}

/// Serialize a document
pub fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}

/// Page object ids in page order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Look up a page attribute, following `/Parent` links for inherited values
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Page width and height in points, from the (possibly inherited) MediaBox
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|values| values.iter().filter_map(number).collect::<Vec<_>>());

    match media_box.as_deref() {
        Some([x0, y0, x1, y1]) => ((x1 - x0).abs(), (y1 - y0).abs()),
        _ => (A4_WIDTH, A4_HEIGHT),
    }
}

/// Make [`FONT_RESOURCE`] available on a page
///
/// The page gets its own resource dictionary (copied from whatever it
/// inherited) so other pages sharing the original are left untouched.
pub fn ensure_font(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut resources: Dictionary = inherited(doc, page_id, b"Resources")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut fonts: Dictionary = resources
        .get(b"Font")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    if fonts.has(FONT_RESOURCE.as_bytes()) {
        return Ok(());
    }

    let font_id = doc.add_object(font_dictionary());
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Append a content stream to a page so it is drawn on top of existing content
pub fn overlay_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    let content = Content { operations }.encode()?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Array(existing)) => {
            let mut streams = existing.clone();
            streams.push(Object::Reference(content_id));
            streams
        }
        Ok(single) => vec![single.clone(), Object::Reference(content_id)],
        Err(_) => vec![Object::Reference(content_id)],
    };
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Append `count` blank pages of the given size to the end of the document
pub fn append_blank_pages(doc: &mut Document, count: usize, size: (f32, f32)) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc.get_dictionary(root_id)?.get(b"Pages")?.as_reference()?;

    let mut new_kids = Vec::with_capacity(count);
    for _ in 0..count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), size.0.into(), size.1.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(Dictionary::new()),
        });
        new_kids.push(Object::Reference(page_id));
    }

    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    let mut kids = pages.get(b"Kids")?.as_array()?.clone();
    let total = pages.get(b"Count")?.as_i64()? + count as i64;
    kids.extend(new_kids);
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document_pages() {
        let doc = blank_document(3);
        assert_eq!(doc.get_pages().len(), 3);
        let first = page_ids(&doc)[0];
        let (w, h) = page_size(&doc, first);
        assert!((w - A4_WIDTH).abs() < 0.01);
        assert!((h - A4_HEIGHT).abs() < 0.01);
    }

    #[test]
    fn test_blank_a4_roundtrip() {
        let bytes = blank_a4().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let doc = load(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_blank_a4_is_deterministic() {
        assert_eq!(blank_a4().unwrap(), blank_a4().unwrap());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load(b"not a pdf"), Err(PdfError::Load(_))));
        assert!(matches!(load(&[]), Err(PdfError::Load(_))));
    }

    #[test]
    fn test_media_box_is_inherited() {
        let mut doc = blank_document(1);
        let page = page_ids(&doc)[0];
        let pages_id = doc
            .get_dictionary(page)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();
        doc.get_object_mut(page)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .remove(b"MediaBox");
        doc.get_object_mut(pages_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 612.into(), 792.into()]);

        assert_eq!(page_size(&doc, page), (612.0, 792.0));
    }

    #[test]
    fn test_ensure_font_does_not_touch_shared_resources() {
        let mut doc = blank_document(2);
        let pages = page_ids(&doc);
        ensure_font(&mut doc, pages[0]).unwrap();

        // Already present through the shared resources: nothing is copied
        let first = doc.get_dictionary(pages[0]).unwrap();
        assert!(matches!(first.get(b"Resources"), Ok(Object::Reference(_))));
    }

    #[test]
    fn test_ensure_font_adds_resource() {
        let mut doc = blank_document(1);
        append_blank_pages(&mut doc, 1, (A4_WIDTH, A4_HEIGHT)).unwrap();
        let pages = page_ids(&doc);
        assert_eq!(pages.len(), 2);

        ensure_font(&mut doc, pages[1]).unwrap();
        let resources = doc
            .get_dictionary(pages[1])
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(resources
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap()
            .has(FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn test_overlay_wraps_single_stream() {
        let mut doc = blank_document(1);
        let page = page_ids(&doc)[0];
        let ops = vec![Operation::new("q", vec![]), Operation::new("Q", vec![])];
        overlay_content(&mut doc, page, ops).unwrap();

        let contents = doc
            .get_dictionary(page)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(contents.len(), 2);
    }
}
