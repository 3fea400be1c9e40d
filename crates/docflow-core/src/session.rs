//! A live demo page
//!
//! A [`PageSession`] owns everything one page needs while it is open: the
//! form record, the current template, the last generated artifact and the
//! widgets mounted on the page's surfaces. Errors stop here. Every
//! operation that can fail records a [`Notice`] and reports failure through
//! its return value instead of propagating the error.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use docflow_ooxml::{DocxReader, DocxTemplate, RichDocument};
use docflow_pdf::{BasePdf, FormTemplate, ReportLayout};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::artifact::ArtifactBuffer;
use crate::bridge::{self, BlobRegistry, DownloadSink, FileSource};
use crate::config::Settings;
use crate::error::{Error, Notice, Result};
use crate::page::{self, PageId, PageSpec};
use crate::pipeline::DocumentPipeline;
use crate::record::FormRecord;
use crate::store::TemplateBindingStore;
use crate::widget::{
    CanvasEditor, DocumentPreview, EditorCommand, FormattingState, PdfViewer, SchemaDesigner,
    Surface, TextSurface, WidgetController,
};

/// What a page generates its document from
///
/// Replaced wholesale whenever the user uploads a new base document or an
/// editor reports a change.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDescriptor {
    /// Uploaded DOCX with placeholders
    Docx(Vec<u8>),
    /// Field schema over a base PDF
    Form(FormTemplate),
    /// Labelled report rows
    Report(ReportLayout),
    /// Rich-text document
    RichText(RichDocument),
}

impl TemplateDescriptor {
    /// Template bytes as the page's engine expects them
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            TemplateDescriptor::Docx(bytes) => Ok(Cow::Borrowed(bytes)),
            TemplateDescriptor::Form(template) => Ok(Cow::Owned(template.to_json()?.into_bytes())),
            TemplateDescriptor::Report(layout) => serde_json::to_vec(layout)
                .map(Cow::Owned)
                .map_err(|e| Error::TemplateInvalid(format!("report layout: {}", e))),
            TemplateDescriptor::RichText(document) => {
                Ok(Cow::Owned(document.to_json()?.into_bytes()))
            }
        }
    }
}

/// The page-specific widget next to the preview
enum Workbench<S: Surface> {
    None,
    Designer(WidgetController<SchemaDesigner, S>),
    Editor(WidgetController<CanvasEditor, S>),
    Viewer(WidgetController<PdfViewer, S>),
}

impl<S: Surface> Workbench<S> {
    fn teardown(&mut self) {
        match self {
            Workbench::None => {}
            Workbench::Designer(controller) => controller.teardown(),
            Workbench::Editor(controller) => controller.teardown(),
            Workbench::Viewer(controller) => controller.teardown(),
        }
    }
}

/// One open page
pub struct PageSession<S: Surface + Default = TextSurface> {
    spec: PageSpec,
    store: Arc<TemplateBindingStore>,
    pipeline: Option<DocumentPipeline>,
    record: FormRecord,
    template: Option<TemplateDescriptor>,
    artifact: Option<ArtifactBuffer>,
    preview: WidgetController<DocumentPreview, S>,
    workbench: Workbench<S>,
    blobs: BlobRegistry,
    notices: Vec<Notice>,
}

impl<S: Surface + Default> PageSession<S> {
    /// Open `id`, restoring its persisted record
    pub fn open(id: PageId, store: Arc<TemplateBindingStore>, settings: &Settings) -> Self {
        let spec = id.spec();
        let seed = spec.seed();
        let record = match spec.storage_key {
            Some(key) => store.load(key, &seed),
            None => seed,
        };
        let mut session = Self {
            pipeline: spec.pipeline(settings),
            spec,
            store,
            record,
            template: None,
            artifact: None,
            preview: WidgetController::new(S::default()),
            workbench: Workbench::None,
            blobs: BlobRegistry::new(),
            notices: Vec::new(),
        };

        match id {
            PageId::Report => {
                session.template = Some(TemplateDescriptor::Report(page::company_report_layout()));
            }
            PageId::FormDesigner => {
                let mut designer = WidgetController::new(S::default());
                let template = page::contract_template();
                let mounted = designer.mount(template.clone());
                session.workbench = Workbench::Designer(designer);
                session.template = Some(TemplateDescriptor::Form(template));
                session.settle(mounted);
            }
            PageId::RichText => {
                session.template = Some(TemplateDescriptor::RichText(page::starter_document()));
            }
            PageId::CanvasEditor => {
                let mut editor = WidgetController::new(S::default());
                let mounted = editor.mount(RichDocument::new());
                session.workbench = Workbench::Editor(editor);
                session.settle(mounted);
            }
            PageId::PdfViewer => {
                session.workbench = Workbench::Viewer(WidgetController::new(S::default()));
            }
            PageId::Docxtemplater | PageId::DocxTemplates | PageId::NativeViewer => {}
        }
        debug!(page = %id, fields = session.record.len(), "page opened");
        session
    }

    pub fn id(&self) -> PageId {
        self.spec.id
    }

    pub fn spec(&self) -> &PageSpec {
        &self.spec
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn template(&self) -> Option<&TemplateDescriptor> {
        self.template.as_ref()
    }

    /// Last successfully generated document
    pub fn artifact(&self) -> Option<&ArtifactBuffer> {
        self.artifact.as_ref()
    }

    pub fn preview(&self) -> &WidgetController<DocumentPreview, S> {
        &self.preview
    }

    pub fn designer(&self) -> Option<&WidgetController<SchemaDesigner, S>> {
        match &self.workbench {
            Workbench::Designer(controller) => Some(controller),
            _ => None,
        }
    }

    pub fn editor(&self) -> Option<&WidgetController<CanvasEditor, S>> {
        match &self.workbench {
            Workbench::Editor(controller) => Some(controller),
            _ => None,
        }
    }

    pub fn viewer(&self) -> Option<&WidgetController<PdfViewer, S>> {
        match &self.workbench {
            Workbench::Viewer(controller) => Some(controller),
            _ => None,
        }
    }

    /// Notices recorded since the last [`take_notices`](Self::take_notices)
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Change one field and schedule the record to be persisted
    pub fn set_field(&mut self, name: &str, value: &str) {
        self.record.set(name, value);
        if let Some(key) = self.spec.storage_key {
            self.store.schedule_save(key, self.record.clone());
        }
    }

    /// Read an upload and hand it to the page
    pub async fn upload<F: FileSource>(&mut self, file: &F) -> bool {
        let result = self.try_upload(file).await;
        self.settle(result).is_some()
    }

    async fn try_upload<F: FileSource>(&mut self, file: &F) -> Result<()> {
        let accept = self.spec.upload.ok_or_else(|| {
            Error::TemplateInvalid(format!("the {} page takes no uploads", self.spec.id))
        })?;
        let upload = bridge::read_upload(file, accept).await?;

        match self.spec.id {
            PageId::Docxtemplater | PageId::DocxTemplates => {
                DocxTemplate::from_bytes(upload.bytes())?;
                self.replace_template(TemplateDescriptor::Docx(upload.bytes().to_vec()))
            }
            PageId::FormDesigner => {
                let current = match &self.template {
                    Some(TemplateDescriptor::Form(template)) => template.clone(),
                    _ => page::contract_template(),
                };
                let next = current.with_base_pdf(BasePdf::Bytes(upload.bytes().to_vec()));
                self.replace_template(TemplateDescriptor::Form(next))
            }
            PageId::RichText => {
                let document = DocxReader::read(upload.bytes())?;
                self.replace_template(TemplateDescriptor::RichText(document))
            }
            PageId::CanvasEditor => {
                let bytes = upload.bytes().to_vec();
                match &mut self.workbench {
                    Workbench::Editor(editor) => editor
                        .apply(|editor, surface| {
                            editor.execute(EditorCommand::ImportDocx(bytes), surface)
                        })
                        .unwrap_or_else(|| Err(not_mounted("editor"))),
                    _ => Err(not_mounted("editor")),
                }
            }
            PageId::PdfViewer => match &mut self.workbench {
                Workbench::Viewer(viewer) => viewer.update(upload),
                _ => Err(not_mounted("viewer")),
            },
            PageId::NativeViewer => self.preview.update(upload),
            PageId::Report => Ok(()),
        }
    }

    /// Replace the template wholesale
    pub fn set_template(&mut self, template: TemplateDescriptor) -> bool {
        let result = self.replace_template(template);
        self.settle(result).is_some()
    }

    fn replace_template(&mut self, template: TemplateDescriptor) -> Result<()> {
        if let (TemplateDescriptor::Form(form), Workbench::Designer(designer)) =
            (&template, &mut self.workbench)
        {
            designer.update(form.clone())?;
        }
        debug!(page = %self.spec.id, "template replaced");
        self.template = Some(template);
        Ok(())
    }

    /// Apply a designer edit and adopt the template it produces
    pub fn edit_form(
        &mut self,
        edit: impl FnOnce(&SchemaDesigner) -> Result<FormTemplate>,
    ) -> bool {
        let edited = match self.designer().and_then(|d| d.widget()) {
            Some(designer) => edit(designer),
            None => Err(not_mounted("designer")),
        };
        let result = edited.and_then(|form| self.replace_template(TemplateDescriptor::Form(form)));
        self.settle(result).is_some()
    }

    /// Run a canvas editor command
    pub fn execute(&mut self, command: EditorCommand) -> bool {
        let result = match &mut self.workbench {
            Workbench::Editor(editor) => editor
                .apply(|editor, surface| editor.execute(command, surface))
                .unwrap_or_else(|| Err(not_mounted("editor"))),
            _ => Err(not_mounted("editor")),
        };
        self.settle(result).is_some()
    }

    /// Formatting updates from the canvas editor, for a toolbar
    pub fn subscribe_formatting(&self) -> Option<watch::Receiver<FormattingState>> {
        self.editor().map(WidgetController::subscribe)
    }

    /// Drive the PDF viewer, e.g. `session.navigate(|v, s| v.next_page(s))`
    pub fn navigate(
        &mut self,
        step: impl FnOnce(&mut PdfViewer, &mut dyn Surface) -> Result<()>,
    ) -> bool {
        let result = match &mut self.workbench {
            Workbench::Viewer(viewer) => viewer
                .apply(|viewer, surface| step(viewer, surface))
                .unwrap_or_else(|| Err(not_mounted("viewer"))),
            _ => Err(not_mounted("viewer")),
        };
        self.settle(result).is_some()
    }

    /// Generate the page's document and show it in the preview
    pub fn generate(&mut self) -> Option<ArtifactBuffer> {
        let result = self.try_generate();
        self.settle(result)
    }

    fn try_generate(&mut self) -> Result<ArtifactBuffer> {
        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            Error::EngineFailure(format!("the {} page does not generate documents", self.spec.id))
        })?;

        let editor_document;
        let template = match &self.workbench {
            Workbench::Editor(editor) => {
                let document = editor
                    .widget()
                    .map(CanvasEditor::to_rich_document)
                    .ok_or_else(|| not_mounted("editor"))?;
                editor_document = TemplateDescriptor::RichText(document);
                &editor_document
            }
            _ => self.template.as_ref().ok_or_else(|| {
                Error::TemplateInvalid("no template has been uploaded".to_string())
            })?,
        };
        let artifact = pipeline.generate(&template.bytes()?, &self.record)?;

        self.artifact = Some(artifact.clone());
        if let Err(e) = self.preview.update(artifact.clone()) {
            self.notices.push(e.notice());
        }
        Ok(artifact)
    }

    /// Save the last generated document through `sink`
    pub fn download(&mut self, sink: &mut dyn DownloadSink) -> Option<PathBuf> {
        let result = match &self.artifact {
            Some(artifact) => bridge::download(&self.blobs, sink, artifact),
            None => Err(Error::EngineFailure(
                "nothing has been generated yet".to_string(),
            )),
        };
        self.settle(result)
    }

    /// Persist pending edits and tear down every widget
    pub fn close(mut self) -> Vec<Notice> {
        if self.spec.storage_key.is_some() {
            let flushed = self.store.flush();
            self.settle(flushed);
        }
        self.workbench.teardown();
        self.preview.teardown();
        debug!(page = %self.spec.id, "page closed");
        self.take_notices()
    }

    fn settle<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(page = %self.spec.id, error = %e, "page operation failed");
                self.notices.push(e.notice());
                None
            }
        }
    }
}

fn not_mounted(widget: &str) -> Error {
    Error::WidgetConstructionFailure(format!("no {} is mounted", widget))
}
