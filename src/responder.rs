//! Per-entity event handler registry with synchronous ordered dispatch.

use std::collections::HashMap;

use crate::event::{Event, EventKind};
use crate::stage::{EntityId, Stage};

/// Identifies a registered handler for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// An event callback. Returns `true` when the event was handled.
///
/// Handlers receive the stage so they can mutate the tree; dispatch
/// temporarily detaches the handler list, so re-entrant registration on
/// the same entity is safe and takes effect after the current dispatch.
pub type Handler = Box<dyn FnMut(&mut Stage, EntityId, &Event) -> bool>;

pub(crate) struct HandlerEntry {
    pub(crate) id: HandlerId,
    pub(crate) callback: Handler,
    /// One-shot flag, checked after invocation.
    pub(crate) remove_after_fire: bool,
}

/// Handler registry for one entity.
///
/// Handlers for a kind run synchronously in registration order.
#[derive(Default)]
pub struct Responder {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<HandlerEntry>>,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&mut Stage, EntityId, &Event) -> bool + 'static,
    ) -> HandlerId {
        self.insert(kind, Box::new(callback), false)
    }

    /// Register a handler removed after its first invocation.
    pub fn add_handler_once(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&mut Stage, EntityId, &Event) -> bool + 'static,
    ) -> HandlerId {
        self.insert(kind, Box::new(callback), true)
    }

    fn insert(&mut self, kind: EventKind, callback: Handler, once: bool) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(kind).or_default().push(HandlerEntry {
            id,
            callback,
            remove_after_fire: once,
        });
        id
    }

    pub fn remove_handler(&mut self, kind: EventKind, id: HandlerId) {
        if let Some(list) = self.handlers.get_mut(&kind) {
            list.retain(|e| e.id != id);
        }
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers.get(&kind).is_some_and(|l| !l.is_empty())
    }

    /// Whether any registered handler requires cursor forwarding.
    pub fn tracks_cursor(&self) -> bool {
        self.handlers
            .iter()
            .any(|(kind, list)| kind.is_cursor_kind() && !list.is_empty())
    }

    pub(crate) fn take_handlers(&mut self, kind: EventKind) -> Vec<HandlerEntry> {
        self.handlers.remove(&kind).unwrap_or_default()
    }

    pub(crate) fn restore_handlers(&mut self, kind: EventKind, mut entries: Vec<HandlerEntry>) {
        // Handlers added during dispatch land after the restored ones.
        let added = self.handlers.remove(&kind).unwrap_or_default();
        entries.extend(added);
        if !entries.is_empty() {
            self.handlers.insert(kind, entries);
        }
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("Responder").field("handlers", &counts).finish()
    }
}
