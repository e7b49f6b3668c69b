use commhistory_core::ContactRef;
use tracing::debug;

use super::HistoryModel;
use crate::notify::{Column, ModelChange};
use crate::tree::NodeId;

enum LeafPatch {
    Skipped,
    Patched,
    /// The leaf already carries the contact; stop walking.
    Converged,
}

impl HistoryModel {
    /// Write a resolved contact into every inbound row from `remote_address`.
    ///
    /// The walk is depth first in display order and stops at the first row
    /// that already carries exactly this contact, on the assumption that
    /// everything after it was patched by an earlier pass. Group
    /// representatives are kept in sync with their newest member.
    ///
    /// Returns the number of rows patched.
    pub fn patch_contact(&mut self, contact: &ContactRef, remote_address: &str) -> usize {
        let mut patched = 0;
        let mut converged = false;

        for row in 0..self.tree.top_level_count() {
            let Some(top) = self.tree.child(None, row) else {
                break;
            };
            let members = self.tree.children(Some(top)).to_vec();

            if members.is_empty() {
                match self.patch_leaf(None, row, top, contact, remote_address) {
                    LeafPatch::Patched => patched += 1,
                    LeafPatch::Converged => converged = true,
                    LeafPatch::Skipped => {}
                }
            } else {
                for (member, node) in members.into_iter().enumerate() {
                    match self.patch_leaf(Some(top), member, node, contact, remote_address) {
                        LeafPatch::Patched => patched += 1,
                        LeafPatch::Converged => {
                            converged = true;
                            break;
                        }
                        LeafPatch::Skipped => {}
                    }
                }
                self.sync_representative_contact(row, top);
            }

            if converged {
                break;
            }
        }

        debug!(
            contact = %contact.id,
            remote = remote_address,
            patched,
            converged,
            "contact patch"
        );
        patched
    }

    fn patch_leaf(
        &mut self,
        parent: Option<NodeId>,
        row: usize,
        node: NodeId,
        contact: &ContactRef,
        remote_address: &str,
    ) -> LeafPatch {
        let event = &self.tree[node];
        if event.contact.as_ref() == Some(contact) {
            return LeafPatch::Converged;
        }
        if !event.is_inbound() || !self.matcher.matches(remote_address, &event.remote_address) {
            return LeafPatch::Skipped;
        }

        self.tree[node].contact = Some(contact.clone());
        self.notifier.emit(ModelChange::DataChanged {
            parent,
            first_row: row,
            last_row: row,
            first_column: Column::ContactId,
            last_column: Column::ContactName,
        });
        LeafPatch::Patched
    }

    fn sync_representative_contact(&mut self, row: usize, group: NodeId) {
        if !self.policy.groups_by_equivalence() {
            return;
        }
        let Some(head) = self.tree.child(Some(group), 0) else {
            return;
        };
        if self.tree[group].contact == self.tree[head].contact {
            return;
        }

        self.tree[group].contact = self.tree[head].contact.clone();
        self.notifier.emit(ModelChange::DataChanged {
            parent: None,
            first_row: row,
            last_row: row,
            first_column: Column::ContactId,
            last_column: Column::ContactName,
        });
    }
}
