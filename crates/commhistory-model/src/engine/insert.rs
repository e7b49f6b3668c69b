use commhistory_core::Event;
use tracing::debug;

use super::HistoryModel;
use crate::divider::{bucket_for, find_or_insert_divider};
use crate::notify::{Column, ModelChange};
use crate::policy::GroupingPolicy;
use crate::tree::NodeId;

impl HistoryModel {
    /// Insert one live event, treated as the most recent.
    ///
    /// Returns `false` if the active filter rejects the event.
    pub fn add_event(&mut self, mut event: Event) -> bool {
        if !self.filter.accepts(&event) {
            debug!(id = ?event.id, kind = ?event.kind, "event rejected by filter");
            return false;
        }
        self.attach_contact(&mut event);

        match self.policy {
            GroupingPolicy::ByContact => {
                let found = self
                    .tree
                    .top_level()
                    .iter()
                    .position(|&group| self.same_group(&event, group));
                match found {
                    Some(row) => self.promote_into(row, event),
                    None => self.insert_group(event),
                }
            }
            GroupingPolicy::ByTime => {
                let front = self
                    .tree
                    .child(None, 0)
                    .filter(|&group| self.same_group(&event, group));
                match front {
                    Some(group) => {
                        self.prepend_member(group, event);
                        self.notifier.row_changed(None, 0);
                    }
                    None => self.insert_group(event),
                }
            }
            GroupingPolicy::ChronologicalBucket => {
                let bucket = bucket_for(event.end_time, self.clock.now());
                let divider = find_or_insert_divider(&mut self.tree, &mut self.notifier, &bucket);
                let member = self.tree.child_count(Some(divider));
                self.tree.push(Some(divider), event);
                self.notifier.rows_inserted(Some(divider), member, member);
                self.refresh_group(divider);
                if let Some(row) = self.tree.row_of(divider) {
                    self.notifier.emit(ModelChange::cell_changed(None, row, Column::EventCount));
                }
            }
            GroupingPolicy::Flat => {
                self.tree.insert(None, 0, event);
                self.notifier.rows_inserted(None, 0, 0);
            }
        }
        true
    }

    /// Add `event` to the group at `row` and move the group to the front.
    fn promote_into(&mut self, row: usize, event: Event) {
        let Some(group) = self.tree.child(None, row) else {
            return;
        };
        self.prepend_member(group, event);

        if row == 0 {
            self.notifier.row_changed(None, 0);
        } else {
            debug!(from = row, "promoting group");
            self.tree.move_row(None, row, 0);
            self.notifier.row_moved(row, 0);
        }
    }

    fn prepend_member(&mut self, group: NodeId, event: Event) {
        self.tree.insert(Some(group), 0, event);
        self.notifier.rows_inserted(Some(group), 0, 0);
        self.refresh_group(group);
    }

    /// New single-member group at the front.
    fn insert_group(&mut self, event: Event) {
        let group = self.tree.insert(None, 0, event.clone());
        self.tree.push(Some(group), event);
        self.refresh_group(group);
        self.notifier.rows_inserted(None, 0, 0);
    }
}
