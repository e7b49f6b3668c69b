//! Two-level arena tree of grouped events.
//!
//! Nodes live in a slot arena and are addressed by [`NodeId`] handles that
//! carry a slot generation, so a handle to a discarded node never aliases a
//! node that later reuses the slot. The synthetic root is implicit: a
//! `parent` of `None` addresses the top level.
//!
//! Ownership is strictly downward. Removing a node discards its whole
//! subtree; the parent link is only used for upward lookups.

use std::ops::{Index, IndexMut};

use commhistory_core::{Event, EventId};
use serde::Serialize;

/// Stable handle to a node in a [`GroupTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

struct Node {
    event: Event,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Where an event id was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventLocation {
    /// The id belongs to a top-level row (a group representative or a flat row).
    TopLevel { row: usize },
    /// The id belongs to member `member` of the group at `row`.
    Member { row: usize, member: usize },
}

impl EventLocation {
    pub fn row(self) -> usize {
        match self {
            Self::TopLevel { row } | Self::Member { row, .. } => row,
        }
    }
}

#[derive(Default)]
pub struct GroupTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    top_level: Vec<NodeId>,
    live: usize,
}

impl GroupTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes at every level.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn top_level_count(&self) -> usize {
        self.top_level.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Event> {
        self.node(id).map(|node| &node.event)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Event> {
        self.node_mut(id).map(|node| &mut node.event)
    }

    /// Children of `parent`, or the top-level rows for `None`.
    ///
    /// A stale handle has no children.
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.top_level,
            Some(id) => self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[]),
        }
    }

    pub fn child(&self, parent: Option<NodeId>, row: usize) -> Option<NodeId> {
        self.children(parent).get(row).copied()
    }

    pub fn child_count(&self, parent: Option<NodeId>) -> usize {
        self.children(parent).len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Position of `id` among its siblings.
    pub fn row_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Events of the children of `parent`, in order.
    pub fn child_events(&self, parent: Option<NodeId>) -> impl Iterator<Item = &Event> + '_ {
        self.children(parent).iter().map(move |&id| &self[id])
    }

    /// Append a new node holding `event` under `parent`.
    pub fn push(&mut self, parent: Option<NodeId>, event: Event) -> NodeId {
        let row = self.child_count(parent);
        self.insert(parent, row, event)
    }

    /// Insert a new node holding `event` at `row` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale or `row` is past the end.
    pub fn insert(&mut self, parent: Option<NodeId>, row: usize, event: Event) -> NodeId {
        let id = self.allocate(Node {
            event,
            parent,
            children: Vec::new(),
        });
        self.siblings_mut(parent).insert(row, id);
        id
    }

    /// Detach the node at `row` under `parent` and discard its subtree.
    ///
    /// Returns the detached node's event.
    pub fn remove(&mut self, parent: Option<NodeId>, row: usize) -> Option<Event> {
        if row >= self.child_count(parent) {
            return None;
        }
        let id = self.siblings_mut(parent).remove(row);
        self.release(id)
    }

    /// Move the node at `from` to position `to` among the same siblings.
    pub fn move_row(&mut self, parent: Option<NodeId>, from: usize, to: usize) {
        let siblings = self.siblings_mut(parent);
        if from == to || from >= siblings.len() || to >= siblings.len() {
            return;
        }
        let id = siblings.remove(from);
        siblings.insert(to, id);
    }

    /// Move every child of `source` to the end of `target`'s children.
    ///
    /// Returns the number of nodes moved. `source` is left without children.
    pub fn append_children_of(&mut self, source: NodeId, target: NodeId) -> usize {
        if source == target || !self.contains(target) {
            return 0;
        }
        let moved = match self.node_mut(source) {
            Some(node) => std::mem::take(&mut node.children),
            None => return 0,
        };
        for &child in &moved {
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(target);
            }
        }
        let count = moved.len();
        self.siblings_mut(Some(target)).extend(moved);
        count
    }

    /// Locate an event id.
    ///
    /// Top-level rows are checked before their members, so an id shared by a
    /// representative and its duplicate member resolves to the top-level row.
    pub fn find_event(&self, id: EventId) -> Option<EventLocation> {
        for (row, &group) in self.top_level.iter().enumerate() {
            if self[group].id == Some(id) {
                return Some(EventLocation::TopLevel { row });
            }
            if let Some(member) = self.child_events(Some(group)).position(|event| event.id == Some(id)) {
                return Some(EventLocation::Member { row, member });
            }
        }
        None
    }

    /// Discard every node.
    ///
    /// Slots are kept and their generations bumped, so no handle issued
    /// before the clear resolves afterwards.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.top_level.clear();
        self.live = 0;
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            None => &mut self.top_level,
            Some(id) => match self.node_mut(id) {
                Some(node) => &mut node.children,
                None => panic!("stale parent handle {id:?}"),
            },
        }
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId { index, generation: 0 }
    }

    fn release(&mut self, id: NodeId) -> Option<Event> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        for child in node.children {
            let _ = self.release(child);
        }
        Some(node.event)
    }
}

impl Index<NodeId> for GroupTree {
    type Output = Event;

    fn index(&self, id: NodeId) -> &Event {
        match self.get(id) {
            Some(event) => event,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

impl IndexMut<NodeId> for GroupTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Event {
        match self.get_mut(id) {
            Some(event) => event,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
