//! Listener registry for inbound realtime events.
//!
//! Listeners are stored per [`SocketEvent`] in registration order and
//! removed by the [`ListenerId`] returned from [`EventHub::on`]. Dispatch
//! snapshots the listener list before calling out, so a listener may
//! register or remove listeners (itself included) without deadlocking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use super::SocketEvent;

/// Callback invoked with the event payload.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle for removing one registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<SocketEvent, Vec<(ListenerId, Listener)>>,
}

/// Shared, cloneable listener registry. Clones see the same listeners.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry();
        let counts: HashMap<_, _> = registry.listeners.iter().map(|(event, list)| (*event, list.len())).collect();
        f.debug_struct("EventHub").field("listeners", &counts).finish()
    }
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a listener for `event`.
    pub fn on<F>(&self, event: SocketEvent, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.entry(event).or_default().push((id, Arc::new(listener)));
        id
    }

    /// Remove exactly the listener `id` from `event`. Returns `false` when it
    /// was not registered there.
    pub fn off(&self, event: SocketEvent, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let Some(list) = registry.listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            registry.listeners.remove(&event);
        }
        removed
    }

    /// Invoke every listener of `event` with `data`; returns how many ran.
    pub fn dispatch(&self, event: SocketEvent, data: &Value) -> usize {
        let snapshot: Vec<Listener> = self
            .registry()
            .listeners
            .get(&event)
            .map(|list| list.iter().map(|(_, listener)| Arc::clone(listener)).collect())
            .unwrap_or_default();
        for listener in &snapshot {
            listener(data);
        }
        snapshot.len()
    }

    #[must_use]
    pub fn listener_count(&self, event: SocketEvent) -> usize {
        self.registry().listeners.get(&event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
