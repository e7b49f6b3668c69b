//! Record store seam.
//!
//! The engine only needs transactional deletes from the store. Queries are
//! the caller's business: it hands the engine an ordered batch for `fill`.

use std::collections::BTreeMap;

use commhistory_core::{Event, EventFilter, EventId, EventKind, StoreError};
use tracing::debug;

/// Transactional write access to the persistent record store.
pub trait EventStore {
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Delete one event. Only valid inside a transaction.
    fn delete_event(&mut self, event: &Event) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every write since `begin`.
    fn rollback(&mut self);

    /// Delete every event of `kind`. Returns the number deleted.
    fn delete_all(&mut self, kind: EventKind) -> Result<usize, StoreError>;
}

/// In-memory store used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: BTreeMap<EventId, Event>,
    staged: Option<Vec<EventId>>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event`, assigning the next free id if it has none.
    pub fn insert(&mut self, mut event: Event) -> EventId {
        let id = match event.id {
            Some(id) => id,
            None => EventId::new(self.next_id + 1),
        };
        self.next_id = self.next_id.max(id.get());
        event.id = Some(id);
        self.events.insert(id, event);
        id
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events accepted by `filter`, most recent first.
    pub fn query(&self, filter: &EventFilter) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .values()
            .filter(|event| filter.accepts(event))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| b.id.cmp(&a.id)));
        events
    }
}

impl EventStore for MemoryStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.staged = Some(Vec::new());
        Ok(())
    }

    fn delete_event(&mut self, event: &Event) -> Result<(), StoreError> {
        let id = event.id.ok_or(StoreError::MissingId)?;
        if !self.events.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        let staged = self.staged.as_mut().ok_or(StoreError::NoTransaction)?;
        if !staged.contains(&id) {
            staged.push(id);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let staged = self.staged.take().ok_or(StoreError::NoTransaction)?;
        for id in &staged {
            self.events.remove(id);
        }
        debug!(deleted = staged.len(), "store commit");
        Ok(())
    }

    fn rollback(&mut self) {
        self.staged = None;
    }

    fn delete_all(&mut self, kind: EventKind) -> Result<usize, StoreError> {
        let before = self.events.len();
        self.events.retain(|_, event| event.kind != kind);
        Ok(before - self.events.len())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
