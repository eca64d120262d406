//! Listener registry shared by the meter and the state machine

use serde::{Deserialize, Serialize};

/// Handle returned on registration, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Ordered set of boxed callbacks keyed by [`ListenerId`].
///
/// `F` is the unsized callback type, e.g. `dyn FnMut(f64, f64) + Send`.
pub struct ListenerRegistry<F: ?Sized> {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<F>)>,
}

impl<F: ?Sized> ListenerRegistry<F> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a callback; notification follows registration order
    pub fn register(&mut self, listener: Box<F>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a callback. Returns false for unknown handles.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Callbacks in registration order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.listeners.iter_mut().map(|(_, l)| l)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for ListenerRegistry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
