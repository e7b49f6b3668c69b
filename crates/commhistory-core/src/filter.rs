//! View filters.
//!
//! Each history view accepts a subset of the event stream. Bulk results are
//! already filtered by the store query; live events are checked here before
//! the engine groups them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Direction, Event, EventKind};
use crate::ids::GroupId;

/// How the call history is grouped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSorting {
    /// One row per remote party, most recently active first.
    #[default]
    ByContact,
    /// Contiguous runs of calls with the same party, direction and outcome.
    ByTime,
    ByType,
    ByService,
}

impl CallSorting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByContact => "by_contact",
            Self::ByTime => "by_time",
            Self::ByType => "by_type",
            Self::ByService => "by_service",
        }
    }
}

impl fmt::Display for CallSorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallSorting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contact" | "by_contact" => Ok(Self::ByContact),
            "time" | "by_time" => Ok(Self::ByTime),
            "type" | "by_type" => Ok(Self::ByType),
            "service" | "by_service" => Ok(Self::ByService),
            other => Err(format!("unknown call sorting: {other}")),
        }
    }
}

/// Which calls a call history shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    #[default]
    Any,
    Missed,
    Dialed,
    Received,
}

impl FromStr for CallKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "all" => Ok(Self::Any),
            "missed" => Ok(Self::Missed),
            "dialed" => Ok(Self::Dialed),
            "received" => Ok(Self::Received),
            other => Err(format!("unknown call kind: {other}")),
        }
    }
}

/// Call history filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallFilter {
    pub kind: CallKind,
    /// Calls that started before this instant are excluded.
    pub reference_time: Option<DateTime<Utc>>,
}

impl CallFilter {
    pub fn accepts(&self, event: &Event) -> bool {
        if event.kind != EventKind::Call {
            return false;
        }

        if self.reference_time.is_some_and(|reference| event.start_time < reference) {
            return false;
        }

        match self.kind {
            CallKind::Any => true,
            CallKind::Missed => event.is_inbound() && event.is_missed_call,
            CallKind::Dialed => event.is_outbound(),
            CallKind::Received => event.is_inbound() && !event.is_missed_call,
        }
    }
}

/// Shape of a conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    #[default]
    OneToOne,
    /// Ad-hoc multi-user chat.
    Unnamed,
    Room,
}

impl FromStr for ChatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one_to_one" | "one-to-one" | "p2p" => Ok(Self::OneToOne),
            "unnamed" => Ok(Self::Unnamed),
            "room" => Ok(Self::Room),
            other => Err(format!("unknown chat type: {other}")),
        }
    }
}

/// Single conversation filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationFilter {
    /// Conversation to show. Nothing is accepted until one is chosen.
    pub group_id: Option<GroupId>,
    pub kind: Option<EventKind>,
    /// Local account the messages were sent from or received on.
    pub account: Option<String>,
    pub direction: Option<Direction>,
    pub chat_type: ChatType,
}

impl ConversationFilter {
    pub fn for_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn accepts(&self, event: &Event) -> bool {
        let Some(group_id) = self.group_id else {
            return false;
        };

        event.kind.is_message()
            && self.kind.map_or(true, |kind| event.kind == kind)
            && self.account.as_deref().map_or(true, |account| event.local_address == account)
            && self.direction.map_or(true, |direction| event.direction == direction)
            && event.group_id == Some(group_id)
    }

    /// Whether resolved contacts are written back into the rows.
    ///
    /// Only one-to-one chats have a single remote party, and a view of sent
    /// messages shows no inbound rows to patch.
    pub fn patches_contacts(&self) -> bool {
        self.chat_type == ChatType::OneToOne && self.direction != Some(Direction::Outbound)
    }
}

/// Acceptance rule of a history view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EventFilter {
    #[default]
    All,
    Calls(CallFilter),
    Conversation(ConversationFilter),
    /// Sent, non-draft messages.
    Outbox,
}

impl EventFilter {
    pub fn accepts(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Calls(filter) => filter.accepts(event),
            Self::Conversation(filter) => filter.accepts(event),
            Self::Outbox => {
                matches!(
                    event.kind,
                    EventKind::InstantMessage | EventKind::TextMessage | EventKind::MultimediaMessage
                ) && !event.is_draft
                    && event.is_outbound()
            }
        }
    }

    pub fn patches_contacts(&self) -> bool {
        match self {
            Self::Conversation(filter) => filter.patches_contacts(),
            Self::All | Self::Calls(_) | Self::Outbox => true,
        }
    }
}
