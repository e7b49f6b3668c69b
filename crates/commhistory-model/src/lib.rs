//! # commhistory-model
//!
//! Incremental grouping engine behind call and conversation history views:
//!
//! - **Tree**: [`GroupTree`] arena of top-level rows and their members
//! - **Policies**: [`GroupingPolicy`] equivalence and event-count rules
//! - **Dividers**: calendar buckets for chronological views
//! - **Notifications**: [`ModelChange`] deltas for the view layer
//! - **Engine**: [`HistoryModel`] fill, add, delete and contact patching
//! - **Seams**: [`ContactResolver`] and [`EventStore`] collaborators

#![deny(unsafe_code)]

pub mod divider;
pub mod engine;
pub mod notify;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod tree;

pub use divider::{bucket_for, Bucket, BucketKind, Clock, FixedClock, SystemClock};
pub use engine::{HistoryModel, HistoryModelBuilder};
pub use notify::{ChangeNotifier, Column, ModelChange};
pub use policy::GroupingPolicy;
pub use resolver::{
    ContactResolution, ContactResolver, DirectoryEntry, DirectoryResolver, NoopResolver, ResolveRequest,
};
pub use store::{EventStore, MemoryStore};
pub use tree::{EventLocation, GroupTree, NodeId};
