use std::collections::HashMap;

use commhistory_core::Event;
use tracing::debug;

use super::HistoryModel;
use crate::divider::{bucket_for, find_or_insert_divider};
use crate::notify::{Column, ModelChange};
use crate::policy::GroupingPolicy;
use crate::tree::NodeId;

impl HistoryModel {
    /// Bulk-insert a batch in store order.
    ///
    /// The batch is trusted to satisfy the active filter. Groups are never
    /// promoted during a fill.
    ///
    /// Order matters and depends on the policy:
    ///
    /// - grouped and flat batches are expected most recent first, since rows
    ///   and members are appended in arrival order;
    /// - chronological batches are expected oldest first, since each divider
    ///   lists its members oldest first and appends them in arrival order.
    pub fn fill<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let before = self.tree.len();
        match self.policy {
            GroupingPolicy::ByContact | GroupingPolicy::ByTime => self.fill_groups(events),
            GroupingPolicy::ChronologicalBucket => self.fill_buckets(events),
            GroupingPolicy::Flat => self.fill_flat(events),
        }
        debug!(
            policy = ?self.policy,
            nodes = self.tree.len() - before,
            rows = self.tree.top_level_count(),
            "filled model"
        );
    }

    fn fill_groups<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let existing = self.tree.top_level_count();
        // pre-existing groups that grew, with their member count before the fill
        let mut grown: Vec<(NodeId, usize)> = Vec::new();

        for mut event in events {
            self.attach_contact(&mut event);

            let target = match self.policy {
                GroupingPolicy::ByTime => self
                    .tree
                    .top_level()
                    .last()
                    .copied()
                    .filter(|&group| self.same_group(&event, group)),
                _ => self
                    .tree
                    .top_level()
                    .iter()
                    .copied()
                    .find(|&group| self.same_group(&event, group)),
            };

            match target {
                Some(group) => {
                    let is_new = self.tree.row_of(group).is_some_and(|row| row >= existing);
                    if !is_new && !grown.iter().any(|&(id, _)| id == group) {
                        grown.push((group, self.tree.child_count(Some(group))));
                    }
                    self.tree.push(Some(group), event);
                }
                None => {
                    let group = self.tree.push(None, event.clone());
                    self.tree.push(Some(group), event);
                }
            }
        }

        for (group, first) in grown {
            let last = self.tree.child_count(Some(group)) - 1;
            self.notifier.rows_inserted(Some(group), first, last);
            self.refresh_group(group);
            if let Some(row) = self.tree.row_of(group) {
                self.notifier.emit(ModelChange::cell_changed(None, row, Column::EventCount));
            }
        }

        let total = self.tree.top_level_count();
        for row in existing..total {
            if let Some(group) = self.tree.child(None, row) {
                self.refresh_group(group);
            }
        }
        if total > existing {
            self.notifier.rows_inserted(None, existing, total - 1);
        }
    }

    fn fill_buckets<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let mut batches: Vec<(NodeId, Vec<Event>)> = Vec::new();
        let mut batch_of: HashMap<NodeId, usize> = HashMap::new();

        for mut event in events {
            self.attach_contact(&mut event);
            let bucket = bucket_for(event.end_time, self.clock.now());
            let divider = find_or_insert_divider(&mut self.tree, &mut self.notifier, &bucket);
            let index = *batch_of.entry(divider).or_insert_with(|| {
                batches.push((divider, Vec::new()));
                batches.len() - 1
            });
            batches[index].1.push(event);
        }

        for (divider, batch) in batches {
            let first = self.tree.child_count(Some(divider));
            let added = batch.len();
            for event in batch {
                self.tree.push(Some(divider), event);
            }
            self.notifier.rows_inserted(Some(divider), first, first + added - 1);
            self.refresh_group(divider);
            if let Some(row) = self.tree.row_of(divider) {
                self.notifier.emit(ModelChange::cell_changed(None, row, Column::EventCount));
            }
        }
    }

    fn fill_flat<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let existing = self.tree.top_level_count();
        for mut event in events {
            self.attach_contact(&mut event);
            self.tree.push(None, event);
        }
        let total = self.tree.top_level_count();
        if total > existing {
            self.notifier.rows_inserted(None, existing, total - 1);
        }
    }
}
