//! Archive handling for DOCX files
//!
//! DOCX files are ZIP archives containing XML parts and resources. The
//! archive is fully unpacked into memory so that templating never touches
//! the caller's bytes.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::error::{OoxmlError, Result};

/// Path of the main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Path of the package content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Represents an unpacked OOXML package
#[derive(Debug, Clone, Default)]
pub struct OoxmlArchive {
    /// All files in the archive, keyed by path (ordered for stable output)
    files: BTreeMap<String, Vec<u8>>,
}

impl OoxmlArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack an archive held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Unpack a package and check it is a WordprocessingML document
    pub fn word_package(bytes: &[u8]) -> Result<Self> {
        let archive = Self::from_bytes(bytes)?;
        if !archive.contains(CONTENT_TYPES_PART) {
            return Err(OoxmlError::InvalidStructure(format!(
                "package has no {}",
                CONTENT_TYPES_PART
            )));
        }
        if !archive.contains(DOCUMENT_PART) {
            return Err(OoxmlError::MissingFile(DOCUMENT_PART.to_string()));
        }
        Ok(archive)
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get the main document content (word/document.xml)
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get(DOCUMENT_PART)
            .ok_or_else(|| OoxmlError::MissingFile(DOCUMENT_PART.to_string()))
    }

    /// Get the numbering definitions (word/numbering.xml)
    pub fn numbering_xml(&self) -> Option<&[u8]> {
        self.get("word/numbering.xml")
    }

    /// Parts that carry user-visible text: body, headers, footers and notes
    pub fn text_parts(&self) -> Vec<String> {
        self.files
            .keys()
            .filter(|path| is_text_part(path))
            .cloned()
            .collect()
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Write the archive to any writer
    ///
    /// Entries are written in path order with a fixed timestamp, so the
    /// same archive always serializes to the same bytes.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for (path, contents) in &self.files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize the archive into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut output = Cursor::new(Vec::new());
        self.write_to(&mut output)?;
        Ok(output.into_inner())
    }
}

fn is_text_part(path: &str) -> bool {
    let Some(name) = path.strip_prefix("word/") else {
        return false;
    };
    if name.contains('/') || !name.ends_with(".xml") {
        return false;
    }
    name == "document.xml"
        || name == "footnotes.xml"
        || name == "endnotes.xml"
        || name.starts_with("header")
        || name.starts_with("footer")
}
