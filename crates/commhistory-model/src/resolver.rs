//! Contact resolution seam.
//!
//! The engine never blocks on contact lookups. It issues a
//! [`ResolveRequest`] and later receives a [`ContactResolution`] through
//! [`HistoryModel::on_contact_resolved`](crate::HistoryModel::on_contact_resolved).
//! Requests carry the model generation so answers issued before a reset can
//! be told apart from current ones.

use commhistory_core::{address_matches_list, AddressMatcher, ContactAddress, ContactRef};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveRequest {
    pub generation: u64,
    pub local_address: String,
    pub remote_address: String,
}

/// Answer to a [`ResolveRequest`]. `contact` is `None` when nobody matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactResolution {
    pub generation: u64,
    pub local_address: String,
    pub remote_address: String,
    pub contact: Option<ContactRef>,
}

impl ContactResolution {
    pub fn answer(request: &ResolveRequest, contact: Option<ContactRef>) -> Self {
        Self {
            generation: request.generation,
            local_address: request.local_address.clone(),
            remote_address: request.remote_address.clone(),
            contact,
        }
    }
}

/// Issues contact lookups.
///
/// `resolve` must return without waiting for the answer.
pub trait ContactResolver: Send + Sync {
    fn resolve(&self, request: ResolveRequest);
}

/// Resolver that never answers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResolver;

impl ContactResolver for NoopResolver {
    fn resolve(&self, _request: ResolveRequest) {}
}

/// A contact card and every address it can be reached on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub contact: ContactRef,
    pub addresses: Vec<ContactAddress>,
}

/// Resolver backed by an in-memory contact directory.
///
/// Answers are queued on an unbounded channel; the owner of the model drains
/// the receiver and feeds each answer back into the model.
pub struct DirectoryResolver {
    entries: Vec<DirectoryEntry>,
    matcher: AddressMatcher,
    tx: mpsc::UnboundedSender<ContactResolution>,
}

impl DirectoryResolver {
    pub fn new(
        entries: Vec<DirectoryEntry>,
        matcher: AddressMatcher,
    ) -> (Self, mpsc::UnboundedReceiver<ContactResolution>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { entries, matcher, tx }, rx)
    }

    /// First directory entry reachable through `(local, remote)`.
    pub fn lookup(&self, local: &str, remote: &str) -> Option<&ContactRef> {
        self.entries
            .iter()
            .find(|entry| address_matches_list(&self.matcher, local, remote, &entry.addresses))
            .map(|entry| &entry.contact)
    }
}

impl ContactResolver for DirectoryResolver {
    fn resolve(&self, request: ResolveRequest) {
        let contact = self
            .lookup(&request.local_address, &request.remote_address)
            .cloned();
        debug!(
            remote = %request.remote_address,
            found = contact.is_some(),
            "contact lookup"
        );
        if self.tx.send(ContactResolution::answer(&request, contact)).is_err() {
            debug!("resolution receiver dropped");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records requests without answering them.
    #[derive(Clone, Default)]
    pub struct RecordingResolver {
        pub requests: Arc<Mutex<Vec<ResolveRequest>>>,
    }

    impl RecordingResolver {
        pub fn taken(&self) -> Vec<ResolveRequest> {
            std::mem::take(&mut *self.requests.lock())
        }
    }

    impl ContactResolver for RecordingResolver {
        fn resolve(&self, request: ResolveRequest) {
            self.requests.lock().push(request);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
