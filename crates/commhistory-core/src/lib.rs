//! # commhistory-core
//!
//! Shared vocabulary for the communication history engine:
//!
//! - **Events**: [`Event`] records for calls and messages as delivered by the store
//! - **Ids**: typed [`EventId`], [`GroupId`] and [`ContactId`] handles
//! - **Addresses**: phone number normalization and tail-window matching
//! - **Filters**: per-view acceptance rules (calls, conversations, outbox)
//! - **Errors**: [`HistoryError`] and [`StoreError`]

#![deny(unsafe_code)]

pub mod address;
pub mod errors;
pub mod event;
pub mod filter;
pub mod ids;

pub use address::{
    address_matches_list, normalize_phone_number, AddressMatcher, ContactAddress,
    DEFAULT_MATCH_LENGTH,
};
pub use errors::{HistoryError, Result, StoreError};
pub use event::{ContactRef, Direction, Event, EventKind};
pub use filter::{CallFilter, CallKind, CallSorting, ChatType, ConversationFilter, EventFilter};
pub use ids::{ContactId, EventId, GroupId};
