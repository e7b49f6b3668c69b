//! Grouping policies.
//!
//! A policy decides which events share a top-level row and what the row's
//! event count means. It is chosen when a model is built and never changes
//! for the life of that model.

use commhistory_core::{AddressMatcher, CallSorting, Event, HistoryError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// One group per remote party on a local account. Groups move to the
    /// front when they receive a new event.
    ByContact,
    /// Maximal contiguous runs of calls with the same party, direction and
    /// missed status.
    ByTime,
    /// Calendar-relative date dividers with the events of each day range
    /// underneath, oldest first.
    ChronologicalBucket,
    /// No grouping; every event is a top-level row.
    Flat,
}

impl GroupingPolicy {
    /// Policy implementing a call history sorting.
    pub fn for_call_sorting(sorting: CallSorting) -> Result<Self> {
        match sorting {
            CallSorting::ByContact => Ok(Self::ByContact),
            CallSorting::ByTime => Ok(Self::ByTime),
            CallSorting::ByType | CallSorting::ByService => Err(HistoryError::PolicyUnsupported(
                format!("grouping calls {sorting} is not implemented"),
            )),
        }
    }

    /// True for the equivalence-based call policies.
    pub fn groups_by_equivalence(self) -> bool {
        matches!(self, Self::ByContact | Self::ByTime)
    }

    /// True if top-level rows own member rows.
    pub fn is_tree(self) -> bool {
        !matches!(self, Self::Flat)
    }

    /// Equivalence test between two events.
    ///
    /// Always false for policies that do not group by equivalence.
    pub fn same_group(self, event: &Event, other: &Event, matcher: &AddressMatcher) -> bool {
        let same_party = || {
            event.local_address == other.local_address
                && matcher.matches(&event.remote_address, &other.remote_address)
        };

        match self {
            Self::ByContact => same_party(),
            Self::ByTime => {
                same_party()
                    && event.direction == other.direction
                    && event.is_missed_call == other.is_missed_call
            }
            Self::ChronologicalBucket | Self::Flat => false,
        }
    }

    /// Event count of a group whose members are given most recent first.
    ///
    /// Under [`ByContact`](Self::ByContact) only missed-call groups carry a
    /// count: the length of the unbroken run of missed calls at the head of
    /// the group.
    pub fn event_count<'a, I>(self, members: I) -> Option<u32>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        match self {
            Self::ByContact => {
                let mut members = members.into_iter();
                if !members.next()?.is_missed_call {
                    return None;
                }
                let run = members.take_while(|member| member.is_missed_call).count();
                Some(1 + run as u32)
            }
            Self::ByTime | Self::ChronologicalBucket => Some(members.into_iter().count() as u32),
            Self::Flat => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Utc};
    use commhistory_core::Direction;

    fn call(direction: Direction, remote: &str) -> Event {
        Event::call(direction, "ring/tel/ring", remote, DateTime::<Utc>::default())
    }

    fn missed(remote: &str) -> Event {
        call(Direction::Inbound, remote).missed()
    }

    fn dialed(remote: &str) -> Event {
        call(Direction::Outbound, remote)
    }

    #[test]
    fn call_sorting_maps_to_policy() {
        assert_eq!(GroupingPolicy::for_call_sorting(CallSorting::ByContact).unwrap(), GroupingPolicy::ByContact);
        assert_eq!(GroupingPolicy::for_call_sorting(CallSorting::ByTime).unwrap(), GroupingPolicy::ByTime);
        assert_matches!(
            GroupingPolicy::for_call_sorting(CallSorting::ByType),
            Err(HistoryError::PolicyUnsupported(_))
        );
        assert_matches!(
            GroupingPolicy::for_call_sorting(CallSorting::ByService),
            Err(HistoryError::PolicyUnsupported(_))
        );
    }

    #[test]
    fn by_contact_ignores_direction_and_outcome() {
        let m = AddressMatcher::default();
        assert!(GroupingPolicy::ByContact.same_group(&missed("+15551234567"), &dialed("5551234567"), &m));
    }

    #[test]
    fn by_contact_requires_same_local_account() {
        let m = AddressMatcher::default();
        let other_line = dialed("5551234567").with_local_address("ring/tel/sim2");
        assert!(!GroupingPolicy::ByContact.same_group(&dialed("5551234567"), &other_line, &m));
    }

    #[test]
    fn by_time_requires_direction_and_outcome() {
        let m = AddressMatcher::default();
        let p = GroupingPolicy::ByTime;
        assert!(p.same_group(&missed("5551234567"), &missed("+15551234567"), &m));
        assert!(!p.same_group(&missed("5551234567"), &dialed("5551234567"), &m));
        assert!(!p.same_group(&missed("5551234567"), &call(Direction::Inbound, "5551234567"), &m));
    }

    #[test]
    fn bucket_and_flat_never_group_by_equivalence() {
        let m = AddressMatcher::default();
        let e = dialed("5551234567");
        assert!(!GroupingPolicy::ChronologicalBucket.same_group(&e, &e, &m));
        assert!(!GroupingPolicy::Flat.same_group(&e, &e, &m));
    }

    #[test]
    fn missed_run_breaks_at_first_non_missed() {
        let members = [missed("1"), missed("1"), dialed("1"), missed("1")];
        assert_eq!(GroupingPolicy::ByContact.event_count(&members), Some(2));
    }

    #[test]
    fn missed_run_counts_whole_group() {
        let members = [missed("1"), missed("1"), missed("1")];
        assert_eq!(GroupingPolicy::ByContact.event_count(&members), Some(3));
    }

    #[test]
    fn non_missed_representative_has_no_count() {
        let members = [dialed("1"), missed("1")];
        assert_eq!(GroupingPolicy::ByContact.event_count(&members), None);
        assert_eq!(GroupingPolicy::ByContact.event_count(&[]), None);
    }

    #[test]
    fn by_time_counts_members() {
        let members = [dialed("1"), dialed("1"), dialed("1")];
        assert_eq!(GroupingPolicy::ByTime.event_count(&members), Some(3));
        assert_eq!(GroupingPolicy::Flat.event_count(&members), None);
    }
}
