//! Structural change notifications for the view layer.
//!
//! Every mutation of a [`HistoryModel`](crate::HistoryModel) records the
//! precise delta it made. Changes are buffered and handed out only after the
//! mutation has completed, so a consumer never observes a half-applied tree.

use serde::Serialize;
use tracing::trace;

use crate::tree::NodeId;

/// Addressable data columns of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Kind,
    Direction,
    StartTime,
    EndTime,
    IsMissedCall,
    IsDraft,
    LocalAddress,
    RemoteAddress,
    FreeText,
    GroupId,
    ContactId,
    ContactName,
    EventCount,
}

impl Column {
    pub const FIRST: Self = Self::Id;
    pub const LAST: Self = Self::EventCount;
}

/// One structural or data change.
///
/// `parent: None` addresses top-level rows. Row ranges are inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelChange {
    RowsInserted {
        parent: Option<NodeId>,
        first: usize,
        last: usize,
    },
    RowsRemoved {
        parent: Option<NodeId>,
        first: usize,
        last: usize,
    },
    /// A top-level row moved.
    RowMoved { from: usize, to: usize },
    DataChanged {
        parent: Option<NodeId>,
        first_row: usize,
        last_row: usize,
        first_column: Column,
        last_column: Column,
    },
    /// The whole model was invalidated. Previously seen node handles are dead.
    Reset,
}

impl ModelChange {
    /// Data change covering every column of one row.
    pub fn row_changed(parent: Option<NodeId>, row: usize) -> Self {
        Self::DataChanged {
            parent,
            first_row: row,
            last_row: row,
            first_column: Column::FIRST,
            last_column: Column::LAST,
        }
    }

    /// Data change covering a single column of one row.
    pub fn cell_changed(parent: Option<NodeId>, row: usize, column: Column) -> Self {
        Self::DataChanged {
            parent,
            first_row: row,
            last_row: row,
            first_column: column,
            last_column: column,
        }
    }
}

/// Buffer of pending changes.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    pending: Vec<ModelChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, change: ModelChange) {
        trace!(?change, "model change");
        self.pending.push(change);
    }

    pub fn rows_inserted(&mut self, parent: Option<NodeId>, first: usize, last: usize) {
        self.emit(ModelChange::RowsInserted { parent, first, last });
    }

    pub fn rows_removed(&mut self, parent: Option<NodeId>, first: usize, last: usize) {
        self.emit(ModelChange::RowsRemoved { parent, first, last });
    }

    pub fn row_moved(&mut self, from: usize, to: usize) {
        self.emit(ModelChange::RowMoved { from, to });
    }

    pub fn row_changed(&mut self, parent: Option<NodeId>, row: usize) {
        self.emit(ModelChange::row_changed(parent, row));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain everything recorded since the last call.
    pub fn take(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.pending)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_in_emission_order() {
        let mut notifier = ChangeNotifier::new();
        notifier.rows_inserted(None, 0, 2);
        notifier.row_moved(3, 0);
        notifier.emit(ModelChange::Reset);

        let changes = notifier.take();
        assert_eq!(
            changes,
            vec![
                ModelChange::RowsInserted { parent: None, first: 0, last: 2 },
                ModelChange::RowMoved { from: 3, to: 0 },
                ModelChange::Reset,
            ]
        );
        assert!(notifier.is_empty());
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn row_changed_spans_all_columns() {
        assert_eq!(
            ModelChange::row_changed(None, 4),
            ModelChange::DataChanged {
                parent: None,
                first_row: 4,
                last_row: 4,
                first_column: Column::Id,
                last_column: Column::EventCount,
            }
        );
    }

    #[test]
    fn changes_serialize_with_type_tag() {
        let json = serde_json::to_value(ModelChange::RowMoved { from: 2, to: 0 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "row_moved", "from": 2, "to": 0}));
        let json = serde_json::to_value(ModelChange::cell_changed(None, 1, Column::EventCount)).unwrap();
        assert_eq!(json["first_column"], "event_count");
        assert!(json["parent"].is_null());
    }

    #[test]
    fn contact_columns_are_adjacent() {
        assert!(Column::ContactId < Column::ContactName);
        assert!(Column::FIRST <= Column::ContactId && Column::ContactName <= Column::LAST);
    }
}
