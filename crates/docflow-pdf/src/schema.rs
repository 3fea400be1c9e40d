//! Form templates: a base PDF plus positioned text fields
//!
//! The JSON form follows the pdfme template layout so templates can be
//! exchanged with browser designers:
//!
//! ```json
//! {
//!   "basePdf": "BLANK_PDF",
//!   "schemas": [[
//!     { "name": "title", "type": "text",
//!       "position": { "x": 10, "y": 30 }, "width": 190, "height": 20 }
//!   ]]
//! }
//! ```
//!
//! Geometry is in millimetres measured from the top-left corner of the page.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{PdfError, Result};

/// Marker used in JSON for a blank A4 base document
pub const BLANK_PDF: &str = "BLANK_PDF";

const DATA_URI_PREFIX: &str = "data:application/pdf;base64,";

/// Default font size for text fields, in points
pub const DEFAULT_FONT_SIZE: f32 = 13.0;

/// The document fields are drawn onto
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BasePdf {
    /// Blank A4 pages, one per schema page
    #[default]
    Blank,
    /// An uploaded PDF
    Bytes(Vec<u8>),
}

impl fmt::Debug for BasePdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasePdf::Blank => f.write_str("Blank"),
            BasePdf::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl TryFrom<String> for BasePdf {
    type Error = PdfError;

    fn try_from(value: String) -> Result<Self> {
        if value == BLANK_PDF {
            return Ok(BasePdf::Blank);
        }
        let payload = value.strip_prefix(DATA_URI_PREFIX).ok_or_else(|| {
            PdfError::InvalidTemplate(format!(
                "basePdf must be {BLANK_PDF} or a {DATA_URI_PREFIX} URI"
            ))
        })?;
        Ok(BasePdf::Bytes(STANDARD.decode(payload.trim())?))
    }
}

impl From<BasePdf> for String {
    fn from(value: BasePdf) -> Self {
        match value {
            BasePdf::Blank => BLANK_PDF.to_string(),
            BasePdf::Bytes(bytes) => format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes)),
        }
    }
}

/// Kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
}

/// Top-left corner of a field, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// One input field on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Input key the field displays
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    pub position: Position,
    /// Width in millimetres
    pub width: f32,
    /// Height in millimetres
    pub height: f32,
    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl FieldSchema {
    /// Text field at (`x`, `y`) with the given size, all in millimetres
    pub fn text(name: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            position: Position { x, y },
            width,
            height,
            font_size: None,
        }
    }

    /// Effective font size
    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// A complete form template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    pub base_pdf: BasePdf,
    /// Fields per page; `schemas[0]` is drawn on the first page
    pub schemas: Vec<Vec<FieldSchema>>,
}

impl FormTemplate {
    /// Template on a blank base with a single page of fields
    pub fn blank(fields: Vec<FieldSchema>) -> Self {
        Self {
            base_pdf: BasePdf::Blank,
            schemas: vec![fields],
        }
    }

    /// Parse the JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy of this template drawn over a different base document
    pub fn with_base_pdf(&self, base_pdf: BasePdf) -> Self {
        Self {
            base_pdf,
            schemas: self.schemas.clone(),
        }
    }

    /// Field names in page order, without duplicates
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for field in self.schemas.iter().flatten() {
            if !names.contains(&field.name.as_str()) {
                names.push(&field.name);
            }
        }
        names
    }

    /// Find a field by page index and name
    pub fn field_mut(&mut self, page: usize, name: &str) -> Option<&mut FieldSchema> {
        self.schemas
            .get_mut(page)?
            .iter_mut()
            .find(|field| field.name == name)
    }

    /// Check field geometry and names
    pub fn validate(&self) -> Result<()> {
        for (page, fields) in self.schemas.iter().enumerate() {
            for field in fields {
                if field.name.trim().is_empty() {
                    return Err(PdfError::InvalidTemplate(format!(
                        "field on page {} has no name",
                        page + 1
                    )));
                }
                let sizes = [field.width, field.height, field.font_size()];
                if sizes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err(PdfError::InvalidTemplate(format!(
                        "field \"{}\" must have a positive size",
                        field.name
                    )));
                }
                if !field.position.x.is_finite() || !field.position.y.is_finite() {
                    return Err(PdfError::InvalidTemplate(format!(
                        "field \"{}\" has an invalid position",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }
}
