//! Incremental update engine.
//!
//! [`HistoryModel`] owns a [`GroupTree`] and keeps it grouped under one
//! [`GroupingPolicy`] while events are filled in bulk, added live, deleted,
//! and patched with resolved contacts. Every mutation runs to completion
//! before its changes can be drained with [`HistoryModel::take_changes`].

mod fill;
mod insert;
mod patch;
mod remove;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use commhistory_core::{AddressMatcher, ContactRef, Event, EventFilter, EventKind, HistoryError, Result};
use tracing::{debug, warn};

use crate::divider::{Clock, SystemClock};
use crate::notify::{ChangeNotifier, ModelChange};
use crate::policy::GroupingPolicy;
use crate::resolver::{ContactResolution, ContactResolver, NoopResolver, ResolveRequest};
use crate::store::EventStore;
use crate::tree::{EventLocation, GroupTree, NodeId};

type AddressPair = (String, String);

/// Grouped, incrementally maintained history view.
pub struct HistoryModel {
    policy: GroupingPolicy,
    filter: EventFilter,
    matcher: AddressMatcher,
    tree: GroupTree,
    notifier: ChangeNotifier,
    resolver: Arc<dyn ContactResolver>,
    clock: Arc<dyn Clock>,
    contacts: HashMap<AddressPair, ContactRef>,
    pending: HashSet<AddressPair>,
    generation: u64,
}

/// Builder for [`HistoryModel`].
pub struct HistoryModelBuilder {
    policy: GroupingPolicy,
    filter: EventFilter,
    matcher: AddressMatcher,
    resolver: Arc<dyn ContactResolver>,
    clock: Arc<dyn Clock>,
}

impl HistoryModelBuilder {
    #[must_use]
    pub fn filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn matcher(mut self, matcher: AddressMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ContactResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> HistoryModel {
        HistoryModel {
            policy: self.policy,
            filter: self.filter,
            matcher: self.matcher,
            tree: GroupTree::new(),
            notifier: ChangeNotifier::new(),
            resolver: self.resolver,
            clock: self.clock,
            contacts: HashMap::new(),
            pending: HashSet::new(),
            generation: 0,
        }
    }
}

impl HistoryModel {
    pub fn builder(policy: GroupingPolicy) -> HistoryModelBuilder {
        HistoryModelBuilder {
            policy,
            filter: EventFilter::All,
            matcher: AddressMatcher::default(),
            resolver: Arc::new(NoopResolver),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn new(policy: GroupingPolicy) -> Self {
        Self::builder(policy).build()
    }

    pub fn policy(&self) -> GroupingPolicy {
        self.policy
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    /// Incremented on every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.tree.top_level_count()
    }

    /// Top-level row event (group representative, divider or flat row).
    pub fn row(&self, row: usize) -> Option<&Event> {
        self.tree.child(None, row).map(|id| &self.tree[id])
    }

    /// Members of the top-level row at `row`, in display order.
    pub fn members(&self, row: usize) -> Vec<&Event> {
        match self.tree.child(None, row) {
            Some(group) => self.tree.child_events(Some(group)).collect(),
            None => Vec::new(),
        }
    }

    /// Changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<ModelChange> {
        self.notifier.take()
    }

    /// Address pairs with an outstanding resolution request.
    pub fn pending_resolutions(&self) -> usize {
        self.pending.len()
    }

    /// Replace the filter and invalidate the model.
    pub fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
        self.reset();
    }

    /// Invalidate the whole model.
    ///
    /// Consumers see [`ModelChange::Reset`] before the tree is discarded.
    /// Changes recorded before the reset and not yet drained are dropped.
    /// Resolution answers to requests issued before the reset are ignored.
    pub fn reset(&mut self) {
        // undrained deltas name handles the reset invalidates
        let dropped = self.notifier.take().len();
        self.notifier.emit(ModelChange::Reset);
        self.tree.clear();
        self.pending.clear();
        self.generation += 1;
        debug!(generation = self.generation, dropped, "model reset");
    }

    /// Feed back the answer to an earlier resolution request.
    ///
    /// Returns the number of rows patched.
    pub fn on_contact_resolved(&mut self, resolution: ContactResolution) -> usize {
        if resolution.generation != self.generation {
            debug!(
                stale = resolution.generation,
                current = self.generation,
                "dropping stale contact resolution"
            );
            return 0;
        }

        let key = (resolution.local_address, resolution.remote_address);
        self.pending.remove(&key);

        let Some(contact) = resolution.contact else {
            return 0;
        };
        self.contacts.insert(key.clone(), contact.clone());

        if !self.filter.patches_contacts() {
            debug!(remote = %key.1, "view does not take contact patches");
            return 0;
        }
        self.patch_contact(&contact, &key.1)
    }

    /// Delete every event of `kind` from the store, then reset.
    pub fn clear_history(&mut self, store: &mut dyn EventStore, kind: EventKind) -> Result<usize> {
        store.begin()?;
        let deleted = match store.delete_all(kind) {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(?kind, error = %err, "failed to delete events");
                store.rollback();
                return Err(err.into());
            }
        };
        if let Err(err) = store.commit() {
            store.rollback();
            return Err(err.into());
        }
        self.reset();
        Ok(deleted)
    }

    /// Replace a row with an updated copy of its event.
    ///
    /// Grouped call views do not support this; the row would have to be
    /// regrouped.
    pub fn modify_event(&mut self, event: Event) -> Result<()> {
        if self.policy.groups_by_equivalence() {
            warn!(policy = ?self.policy, "modifying grouped call events is not supported");
            return Err(HistoryError::PolicyUnsupported(format!(
                "modify_event under {:?} grouping",
                self.policy
            )));
        }

        let id = event.id.ok_or(HistoryError::Unpersisted)?;
        let location = self.tree.find_event(id).ok_or(HistoryError::NotFound(id))?;
        let (parent, row) = match location {
            EventLocation::TopLevel { row } => (None, row),
            EventLocation::Member { row, member } => (self.tree.child(None, row), member),
        };
        let Some(node) = self.tree.child(parent, row) else {
            return Err(HistoryError::NotFound(id));
        };

        // Divider membership is not re-evaluated.
        self.tree[node] = event;
        self.notifier.row_changed(parent, row);
        Ok(())
    }

    /// Seed the contact cache or fill `event` from it.
    ///
    /// Unknown address pairs get exactly one outstanding resolution request.
    fn attach_contact(&mut self, event: &mut Event) {
        if event.remote_address.is_empty() {
            return;
        }

        let key = event.address_pair();
        if let Some(contact) = &event.contact {
            self.contacts.insert(key, contact.clone());
            return;
        }
        if let Some(contact) = self.contacts.get(&key) {
            event.contact = Some(contact.clone());
            return;
        }
        if self.pending.insert(key) {
            self.resolver.resolve(ResolveRequest {
                generation: self.generation,
                local_address: event.local_address.clone(),
                remote_address: event.remote_address.clone(),
            });
        }
    }

    /// Re-derive a top-level row from its members.
    ///
    /// Call groups mirror their newest member; dividers only track the count.
    fn refresh_group(&mut self, group: NodeId) {
        let count = self.policy.event_count(self.tree.child_events(Some(group)));
        let head = self.tree.child(Some(group), 0);

        match (self.policy.groups_by_equivalence(), head) {
            (true, Some(head)) => {
                let mut representative = self.tree[head].clone();
                representative.event_count = count;
                self.tree[group] = representative;
            }
            _ => self.tree[group].event_count = count,
        }
    }

    fn same_group(&self, event: &Event, group: NodeId) -> bool {
        self.policy.same_group(event, &self.tree[group], &self.matcher)
    }
}
