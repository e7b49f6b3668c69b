//! Error types for history operations.
//!
//! [`HistoryError`] is what the grouping engine returns to its callers.
//! Store collaborators report [`StoreError`], which converts into
//! [`HistoryError::StoreFailure`].

use thiserror::Error;

use crate::ids::EventId;

/// Errors surfaced by the grouping engine.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Lookup or deletion of an id the model does not hold.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// The event was never persisted, so there is no id to look up.
    #[error("event has not been stored")]
    Unpersisted,

    /// A grouping/operation combination that is not implemented.
    #[error("unsupported for this view: {0}")]
    PolicyUnsupported(String),

    /// The record store could not complete a read or write.
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

/// Errors reported by an event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has no record with this id.
    #[error("no such event in store: {0}")]
    NotFound(EventId),

    /// The event was never persisted and has no id.
    #[error("event has no id")]
    MissingId,

    /// A write was attempted outside a transaction.
    #[error("no transaction in progress")]
    NoTransaction,

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for history results.
pub type Result<T> = std::result::Result<T, HistoryError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn not_found_display() {
        let err = HistoryError::NotFound(EventId::new(17));
        assert_eq!(err.to_string(), "event not found: event:17");
    }

    #[test]
    fn unpersisted_display() {
        assert_eq!(HistoryError::Unpersisted.to_string(), "event has not been stored");
    }

    #[test]
    fn policy_unsupported_display() {
        let err = HistoryError::PolicyUnsupported("grouping calls by type".into());
        assert_eq!(err.to_string(), "unsupported for this view: grouping calls by type");
    }

    #[test]
    fn store_error_converts() {
        let err: HistoryError = StoreError::Backend("disk full".into()).into();
        assert_matches!(err, HistoryError::StoreFailure(StoreError::Backend(ref msg)) if msg == "disk full");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn store_error_display() {
        assert_eq!(StoreError::MissingId.to_string(), "event has no id");
        assert_eq!(StoreError::NoTransaction.to_string(), "no transaction in progress");
        assert_eq!(
            StoreError::NotFound(EventId::new(2)).to_string(),
            "no such event in store: event:2"
        );
    }

    #[test]
    fn result_alias() {
        fn example() -> Result<u32> {
            Ok(3)
        }
        assert_eq!(example().unwrap(), 3);
    }
}
