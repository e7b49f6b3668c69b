//! Communication events as delivered by the record store.
//!
//! An [`Event`] is a plain snapshot. The grouping engine copies events into
//! its tree and only mutates them in place for contact patches, count
//! refreshes and representative updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContactId, EventId, GroupId};

/// Record type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Synthetic rows (date dividers) and unclassified records.
    #[default]
    Unknown,
    Call,
    InstantMessage,
    TextMessage,
    MultimediaMessage,
    StatusMessage,
}

impl EventKind {
    /// True for every kind that belongs in a conversation view.
    pub fn is_message(self) -> bool {
        matches!(
            self,
            Self::InstantMessage | Self::TextMessage | Self::MultimediaMessage | Self::StatusMessage
        )
    }
}

/// Direction of an event relative to the local account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
    #[default]
    Unknown,
}

/// Resolved identity of the remote party.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: ContactId,
    pub name: String,
}

impl ContactRef {
    pub fn new(id: impl Into<ContactId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A call or message record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    /// Store identifier. `None` until the event has been persisted.
    pub id: Option<EventId>,
    pub kind: EventKind,
    pub direction: Direction,
    /// Local account path or line identifier.
    pub local_address: String,
    /// Phone number or IM handle of the other party.
    pub remote_address: String,
    pub start_time: DateTime<Utc>,
    /// Used for date bucketing in conversation views.
    pub end_time: DateTime<Utc>,
    pub is_missed_call: bool,
    pub is_draft: bool,
    /// Filled in asynchronously once the remote address is resolved.
    pub contact: Option<ContactRef>,
    /// Owning conversation (messages only).
    pub group_id: Option<GroupId>,
    /// Only meaningful on top-level group rows; `None` is the "unset" sentinel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_count: Option<u32>,
    /// Message body, or the bucket label on divider rows.
    pub free_text: String,
}

impl Event {
    /// Call record with both timestamps set to `at`.
    pub fn call(
        direction: Direction,
        local_address: impl Into<String>,
        remote_address: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EventKind::Call,
            direction,
            local_address: local_address.into(),
            remote_address: remote_address.into(),
            start_time: at,
            end_time: at,
            ..Self::default()
        }
    }

    /// Message record in conversation `group_id` with both timestamps set to `at`.
    pub fn message(
        kind: EventKind,
        direction: Direction,
        group_id: GroupId,
        remote_address: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            direction,
            remote_address: remote_address.into(),
            group_id: Some(group_id),
            start_time: at,
            end_time: at,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_local_address(mut self, local_address: impl Into<String>) -> Self {
        self.local_address = local_address.into();
        self
    }

    #[must_use]
    pub fn with_contact(mut self, contact: ContactRef) -> Self {
        self.contact = Some(contact);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = text.into();
        self
    }

    /// Marks an inbound call as unanswered.
    #[must_use]
    pub fn missed(mut self) -> Self {
        self.is_missed_call = true;
        self
    }

    #[must_use]
    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    /// Key used by the contact cache and resolver.
    pub fn address_pair(&self) -> (String, String) {
        (self.local_address.clone(), self.remote_address.clone())
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }

    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }
}
