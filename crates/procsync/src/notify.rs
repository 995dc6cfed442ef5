//! Completion notification
//!
//! Hosts that care when generated content lands (editor panels, savegame
//! markers, streaming heuristics) register a [`SyncListener`]. One event
//! fires per touched tier at the end of every update pass, after the
//! batcher flush, so listeners always observe a settled scene.

use crate::sync::content::TierId;
use log::debug;

/// Payload delivered when an update pass finishes on a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Tier the pass touched
    pub tier: TierId,
    /// Content records live in that tier after the pass
    pub content_count: usize,
    /// Monotonic pass counter
    pub pass: u64,
}

/// Observer of update pass completion
pub trait SyncListener {
    /// Called once per touched tier at the end of an update pass
    fn on_pass_complete(&mut self, event: &CompletionEvent);
}

/// Registered listeners, dispatched in registration order
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Box<dyn SyncListener>>,
}

impl ListenerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&mut self, listener: Box<dyn SyncListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener
    pub fn notify(&mut self, event: &CompletionEvent) {
        debug!(
            "notify: pass {} complete on {} ({} records)",
            event.pass, event.tier, event.content_count
        );
        for listener in &mut self.listeners {
            listener.on_pass_complete(event);
        }
    }
}
