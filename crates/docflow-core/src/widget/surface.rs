//! Display surfaces widgets render into

use std::collections::BTreeMap;

/// Identifies a listener registered on a surface
pub type ListenerId = u64;

/// Events a surface can report to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceEvent {
    MouseUp,
    KeyUp,
    Click,
}

/// An append-oriented display container
///
/// Content accumulates until [`Surface::reset`] is called; a widget that
/// is remounted without a reset would leave its old content behind.
pub trait Surface {
    /// Append one line of content
    fn append(&mut self, line: &str);

    /// Remove all content
    fn reset(&mut self);

    fn is_empty(&self) -> bool;

    /// Register interest in `event`
    fn listen(&mut self, event: SurfaceEvent) -> ListenerId;

    /// Remove a listener; false when it was not registered
    fn unlisten(&mut self, id: ListenerId) -> bool;
}

/// A surface holding lines of text
#[derive(Debug, Default)]
pub struct TextSurface {
    lines: Vec<String>,
    listeners: BTreeMap<ListenerId, SurfaceEvent>,
    next_listener: ListenerId,
    resets: usize,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Content joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners registered for `event`
    pub fn listeners_for(&self, event: SurfaceEvent) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, e)| **e == event)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of times the surface has been reset
    pub fn reset_count(&self) -> usize {
        self.resets
    }
}

impl Surface for TextSurface {
    fn append(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn reset(&mut self) {
        self.lines.clear();
        self.resets += 1;
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn listen(&mut self, event: SurfaceEvent) -> ListenerId {
        self.next_listener += 1;
        self.listeners.insert(self.next_listener, event);
        self.next_listener
    }

    fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}
