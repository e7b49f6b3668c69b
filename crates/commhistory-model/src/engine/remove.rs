use commhistory_core::{Event, EventId, HistoryError, Result};
use tracing::{debug, warn};

use super::HistoryModel;
use crate::policy::GroupingPolicy;
use crate::store::EventStore;
use crate::tree::EventLocation;

impl HistoryModel {
    /// Delete an event from the store and then from the model.
    ///
    /// An id that belongs to a top-level group row deletes the whole group.
    /// Store deletes run in a single transaction; if any of them fails the
    /// transaction is rolled back and the tree is left untouched.
    pub fn delete_event(&mut self, id: EventId, store: &mut dyn EventStore) -> Result<()> {
        let location = self.tree.find_event(id).ok_or(HistoryError::NotFound(id))?;
        let doomed = self.events_at(location);

        store.begin()?;
        for event in &doomed {
            if let Err(err) = store.delete_event(event) {
                warn!(%id, event = ?event.id, error = %err, "store delete failed, rolling back");
                store.rollback();
                return Err(err.into());
            }
        }
        if let Err(err) = store.commit() {
            warn!(%id, error = %err, "store commit failed, rolling back");
            store.rollback();
            return Err(err.into());
        }

        debug!(%id, deleted = doomed.len(), "deleted from store");
        self.remove_at(location);
        Ok(())
    }

    /// Remove an event from the model only.
    pub fn remove_from_model(&mut self, id: EventId) -> Result<()> {
        let location = self.tree.find_event(id).ok_or(HistoryError::NotFound(id))?;
        self.remove_at(location);
        Ok(())
    }

    /// Events the store has to delete for a removal at `location`.
    fn events_at(&self, location: EventLocation) -> Vec<Event> {
        let Some(group) = self.tree.child(None, location.row()) else {
            return Vec::new();
        };
        match location {
            EventLocation::TopLevel { .. } => {
                let members: Vec<Event> = self.tree.child_events(Some(group)).cloned().collect();
                if members.is_empty() {
                    vec![self.tree[group].clone()]
                } else {
                    members
                }
            }
            EventLocation::Member { member, .. } => self
                .tree
                .child(Some(group), member)
                .map(|node| vec![self.tree[node].clone()])
                .unwrap_or_default(),
        }
    }

    fn remove_at(&mut self, location: EventLocation) {
        match location {
            EventLocation::TopLevel { row } => self.remove_row(row),
            EventLocation::Member { row, member } => self.remove_member(row, member),
        }
    }

    /// Remove a top-level row, merging its neighbours under time grouping.
    fn remove_row(&mut self, row: usize) {
        if self.policy == GroupingPolicy::ByTime && row > 0 && self.merge_around(row) {
            return;
        }
        if self.tree.remove(None, row).is_some() {
            self.notifier.rows_removed(None, row, row);
        }
    }

    /// Remove `row` and fold the next group into the previous one if the two
    /// are mutually equivalent. Returns `false` without touching anything
    /// otherwise.
    fn merge_around(&mut self, row: usize) -> bool {
        let (Some(prev), Some(next)) = (self.tree.child(None, row - 1), self.tree.child(None, row + 1)) else {
            return false;
        };
        let (prev_event, next_event) = (&self.tree[prev], &self.tree[next]);
        if !(self.policy.same_group(prev_event, next_event, &self.matcher)
            && self.policy.same_group(next_event, prev_event, &self.matcher))
        {
            return false;
        }

        let first = self.tree.child_count(Some(prev));
        let moved = self.tree.append_children_of(next, prev);
        self.tree.remove(None, row + 1);
        self.tree.remove(None, row);

        if moved > 0 {
            self.notifier.rows_inserted(Some(prev), first, first + moved - 1);
        }
        self.refresh_group(prev);
        self.notifier.rows_removed(None, row, row + 1);
        self.notifier.row_changed(None, row - 1);
        debug!(row, moved, "merged neighbouring groups");
        true
    }

    /// Remove one member; an emptied group goes away with it.
    fn remove_member(&mut self, row: usize, member: usize) {
        let Some(group) = self.tree.child(None, row) else {
            return;
        };
        if self.tree.remove(Some(group), member).is_none() {
            return;
        }
        self.notifier.rows_removed(Some(group), member, member);

        if self.tree.child_count(Some(group)) == 0 {
            self.remove_row(row);
        } else {
            self.refresh_group(group);
            self.notifier.row_changed(None, row);
        }
    }
}
