//! Lifecycle of stateful widgets bound to a display surface
//!
//! A [`WidgetController`] owns one surface and at most one live widget on
//! it. Every prop change destroys the current widget, resets the surface
//! and constructs a replacement, so two instances never share a surface.
//!
//! ```text
//! Empty --mount--> Mounted --update--> Mounted ... --teardown--> TornDown
//!   ^                 |
//!   +--construct fails+
//! ```

mod command;
mod designer;
mod editor;
mod preview;
mod surface;
mod viewer;

pub use command::{EditorCommand, FormattingState};
pub use designer::SchemaDesigner;
pub use editor::{CanvasEditor, MAX_HISTORY_STATES};
pub use preview::{artifact_text, DocumentPreview};
pub use surface::{ListenerId, Surface, SurfaceEvent, TextSurface};
pub use viewer::{PdfViewer, DEFAULT_SCALE, MAX_SCALE, MIN_SCALE, SCALE_STEP};

use tokio::sync::watch;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// A stateful external widget
pub trait Widget: Sized {
    /// What the widget is built from
    type Props;

    /// Build the widget and render it into an empty surface
    fn construct(props: &Self::Props, surface: &mut dyn Surface) -> Result<Self>;

    /// Release the widget; the controller resets the surface afterwards
    fn destroy(&mut self, _surface: &mut dyn Surface) {}

    /// Whether `next` would render the same as `current`
    fn unchanged(_current: &Self::Props, _next: &Self::Props) -> bool {
        false
    }

    /// Surface events the widget reacts to
    fn events(&self) -> &'static [SurfaceEvent] {
        &[]
    }

    /// Formatting at the selection, for widgets that have one
    fn formatting(&self) -> Option<FormattingState> {
        None
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Empty,
    Mounted,
    TornDown,
}

/// Mounts, updates and tears down one widget on one surface
pub struct WidgetController<W: Widget, S: Surface> {
    surface: S,
    widget: Option<W>,
    props: Option<W::Props>,
    listeners: Vec<ListenerId>,
    state: WidgetState,
    formatting: watch::Sender<FormattingState>,
}

impl<W: Widget, S: Surface> WidgetController<W, S> {
    pub fn new(surface: S) -> Self {
        let (formatting, _) = watch::channel(FormattingState::default());
        Self {
            surface,
            widget: None,
            props: None,
            listeners: Vec::new(),
            state: WidgetState::Empty,
            formatting,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn props(&self) -> Option<&W::Props> {
        self.props.as_ref()
    }

    /// Formatting updates published after each mount and command
    pub fn subscribe(&self) -> watch::Receiver<FormattingState> {
        self.formatting.subscribe()
    }

    /// Construct the widget once the surface is available
    pub fn mount(&mut self, props: W::Props) -> Result<()> {
        self.update(props)
    }

    /// Replace the widget with one built from `props`
    ///
    /// On failure the surface is left empty and the controller returns to
    /// [`WidgetState::Empty`].
    pub fn update(&mut self, props: W::Props) -> Result<()> {
        if self.state == WidgetState::TornDown {
            return Err(Error::WidgetConstructionFailure(
                "surface has been torn down".to_string(),
            ));
        }
        if let Some(current) = &self.props {
            if self.widget.is_some() && W::unchanged(current, &props) {
                debug!("props unchanged, keeping mounted widget");
                return Ok(());
            }
        }

        self.destroy_current();
        self.surface.reset();

        match W::construct(&props, &mut self.surface) {
            Ok(widget) => {
                for event in widget.events() {
                    self.listeners.push(self.surface.listen(*event));
                }
                self.widget = Some(widget);
                self.props = Some(props);
                self.state = WidgetState::Mounted;
                self.publish_formatting();
                debug!(listeners = self.listeners.len(), "widget mounted");
                Ok(())
            }
            Err(e) => {
                self.surface.reset();
                self.state = WidgetState::Empty;
                error!(error = %e, "widget construction failed");
                Err(match e {
                    Error::WidgetConstructionFailure(_) => e,
                    other => Error::WidgetConstructionFailure(other.to_string()),
                })
            }
        }
    }

    /// Run `f` against the live widget and republish its formatting
    pub fn apply<R>(&mut self, f: impl FnOnce(&mut W, &mut S) -> R) -> Option<R> {
        let widget = self.widget.as_mut()?;
        let result = f(widget, &mut self.surface);
        self.publish_formatting();
        Some(result)
    }

    /// Destroy the widget and detach the controller's listeners
    pub fn teardown(&mut self) {
        if self.state == WidgetState::TornDown {
            return;
        }
        self.destroy_current();
        self.surface.reset();
        self.state = WidgetState::TornDown;
        debug!("widget torn down");
    }

    fn destroy_current(&mut self) {
        if let Some(mut widget) = self.widget.take() {
            widget.destroy(&mut self.surface);
        }
        for id in self.listeners.drain(..) {
            self.surface.unlisten(id);
        }
        self.props = None;
    }

    fn publish_formatting(&self) {
        if let Some(next) = self.widget.as_ref().and_then(W::formatting) {
            self.formatting.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        }
    }
}

impl<W: Widget, S: Surface> Drop for WidgetController<W, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
