//! Form template designer
//!
//! Edits never patch the mounted template in place: each one returns a new
//! [`FormTemplate`], which the page then mounts in place of the old one.

use docflow_pdf::{BasePdf, FieldSchema, FormTemplate};

use super::surface::Surface;
use super::Widget;
use crate::error::{Error, Result};

/// Shows the fields of a [`FormTemplate`] and produces edited copies
#[derive(Debug, Clone)]
pub struct SchemaDesigner {
    template: FormTemplate,
}

impl SchemaDesigner {
    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    /// Copy with a field moved to (`x`, `y`) millimetres
    pub fn move_field(&self, page: usize, name: &str, x: f32, y: f32) -> Result<FormTemplate> {
        self.edit(page, name, |field| {
            field.position.x = x;
            field.position.y = y;
        })
    }

    /// Copy with a field resized to `width` x `height` millimetres
    pub fn resize_field(
        &self,
        page: usize,
        name: &str,
        width: f32,
        height: f32,
    ) -> Result<FormTemplate> {
        self.edit(page, name, |field| {
            field.width = width;
            field.height = height;
        })
    }

    /// Copy with `field` appended to `page`
    ///
    /// `page` may be one past the last page, which adds a page.
    pub fn add_field(&self, page: usize, field: FieldSchema) -> Result<FormTemplate> {
        let mut template = self.template.clone();
        let pages = template.schemas.len();
        if page > pages {
            return Err(Error::TemplateInvalid(format!(
                "cannot add a field on page {} of a {}-page template",
                page + 1,
                pages
            )));
        }
        if page == pages {
            template.schemas.push(Vec::new());
        }
        template.schemas[page].push(field);
        template.validate()?;
        Ok(template)
    }

    /// Copy without the named field
    pub fn remove_field(&self, page: usize, name: &str) -> Result<FormTemplate> {
        let mut template = self.template.clone();
        let fields = template
            .schemas
            .get_mut(page)
            .ok_or_else(|| missing_field(page, name))?;
        let before = fields.len();
        fields.retain(|field| field.name != name);
        if fields.len() == before {
            return Err(missing_field(page, name));
        }
        Ok(template)
    }

    /// Copy drawn over an uploaded base document
    pub fn with_base_pdf(&self, base: Vec<u8>) -> FormTemplate {
        self.template.with_base_pdf(BasePdf::Bytes(base))
    }

    fn edit(
        &self,
        page: usize,
        name: &str,
        change: impl FnOnce(&mut FieldSchema),
    ) -> Result<FormTemplate> {
        let mut template = self.template.clone();
        let field = template
            .field_mut(page, name)
            .ok_or_else(|| missing_field(page, name))?;
        change(field);
        template.validate()?;
        Ok(template)
    }
}

fn missing_field(page: usize, name: &str) -> Error {
    Error::TemplateInvalid(format!("no field \"{}\" on page {}", name, page + 1))
}

impl Widget for SchemaDesigner {
    type Props = FormTemplate;

    fn construct(props: &FormTemplate, surface: &mut dyn Surface) -> Result<Self> {
        props.validate()?;
        let base = match &props.base_pdf {
            BasePdf::Blank => "blank A4".to_string(),
            BasePdf::Bytes(bytes) => format!("uploaded PDF ({} bytes)", bytes.len()),
        };
        surface.append(&format!("Base: {}", base));
        for (page, fields) in props.schemas.iter().enumerate() {
            surface.append(&format!("Page {}", page + 1));
            for field in fields {
                surface.append(&format!(
                    "  {} at ({}, {}) mm, {} x {} mm, {}pt",
                    field.name,
                    field.position.x,
                    field.position.y,
                    field.width,
                    field.height,
                    field.font_size()
                ));
            }
        }
        Ok(Self {
            template: props.clone(),
        })
    }

    fn unchanged(current: &FormTemplate, next: &FormTemplate) -> bool {
        current == next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{TextSurface, WidgetController};

    fn contract() -> FormTemplate {
        FormTemplate::blank(vec![
            FieldSchema::text("title", 10.0, 30.0, 190.0, 20.0),
            FieldSchema::text("client", 10.0, 60.0, 190.0, 20.0),
        ])
    }

    #[test]
    fn test_renders_fields() {
        let mut controller = WidgetController::<SchemaDesigner, _>::new(TextSurface::new());
        controller.mount(contract()).unwrap();
        let text = controller.surface().text();
        assert!(text.starts_with("Base: blank A4\nPage 1\n"));
        assert!(text.contains("title at (10, 30) mm, 190 x 20 mm, 13pt"));
    }

    #[test]
    fn test_edits_return_new_templates() {
        let mut controller = WidgetController::<SchemaDesigner, _>::new(TextSurface::new());
        controller.mount(contract()).unwrap();

        let designer = controller.widget().unwrap();
        let moved = designer.move_field(0, "title", 20.0, 40.0).unwrap();
        assert_eq!(designer.template(), &contract());
        assert_eq!(moved.schemas[0][0].position.x, 20.0);

        controller.update(moved).unwrap();
        assert!(controller.surface().text().contains("title at (20, 40) mm"));
    }

    #[test]
    fn test_add_and_remove_fields() {
        let mut surface = TextSurface::new();
        let designer = SchemaDesigner::construct(&contract(), &mut surface).unwrap();

        let added = designer
            .add_field(1, FieldSchema::text("details", 10.0, 10.0, 100.0, 50.0))
            .unwrap();
        assert_eq!(added.schemas.len(), 2);
        assert_eq!(added.field_names(), vec!["title", "client", "details"]);

        let removed = designer.remove_field(0, "client").unwrap();
        assert_eq!(removed.field_names(), vec!["title"]);
        assert!(designer.remove_field(0, "nope").is_err());
    }

    #[test]
    fn test_add_field_past_next_page_is_rejected() {
        let mut surface = TextSurface::new();
        let designer = SchemaDesigner::construct(&contract(), &mut surface).unwrap();
        let result = designer.add_field(5, FieldSchema::text("far", 10.0, 10.0, 50.0, 10.0));
        assert!(matches!(result, Err(Error::TemplateInvalid(_))));
        assert_eq!(designer.template().schemas.len(), 1);
    }

    #[test]
    fn test_invalid_resize_is_rejected() {
        let mut surface = TextSurface::new();
        let designer = SchemaDesigner::construct(&contract(), &mut surface).unwrap();
        assert!(matches!(
            designer.resize_field(0, "title", 0.0, 10.0),
            Err(Error::TemplateInvalid(_))
        ));
    }
}
