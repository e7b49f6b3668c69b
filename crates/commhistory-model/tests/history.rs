//! End-to-end grouping behaviour through the public API.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;

use commhistory_core::{
    AddressMatcher, ContactAddress, ContactRef, Direction, Event, EventFilter, EventId, EventKind, GroupId,
};
use commhistory_model::{
    DirectoryEntry, DirectoryResolver, FixedClock, GroupingPolicy, HistoryModel, MemoryStore, ModelChange,
};

const LINE: &str = "ring/tel/ring";

fn noon() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
        .unwrap()
}

fn at(minutes_ago: i64) -> DateTime<Utc> {
    (noon() - TimeDelta::minutes(minutes_ago)).with_timezone(&Utc)
}

fn inbound(remote: &str, minutes_ago: i64) -> Event {
    Event::call(Direction::Inbound, LINE, remote, at(minutes_ago))
}

fn group_count(model: &HistoryModel) -> usize {
    model.row_count()
}

proptest! {
    #[test]
    fn equivalent_calls_share_one_group(
        national in "[2-9][0-9]{9}",
        missed in any::<bool>(),
        by_time in any::<bool>(),
    ) {
        let policy = if by_time { GroupingPolicy::ByTime } else { GroupingPolicy::ByContact };
        let formatted = format!("({}) {}-{}", &national[..3], &national[3..6], &national[6..]);
        let mut first = inbound(&format!("+1{national}"), 10);
        let mut second = inbound(&formatted, 0);
        first.is_missed_call = missed;
        second.is_missed_call = missed;

        let mut model = HistoryModel::new(policy);
        model.add_event(first);
        model.add_event(second);

        prop_assert_eq!(group_count(&model), 1);
        prop_assert_eq!(model.members(0).len(), 2);
    }

    #[test]
    fn activity_promotes_group_to_front(count in 2usize..8, pick in 0usize..8) {
        let pick = pick % count;
        let remotes: Vec<String> = (0..count).map(|i| format!("+3585000000{i:02}")).collect();
        let mut model = HistoryModel::new(GroupingPolicy::ByContact);
        model.fill(
            remotes
                .iter()
                .enumerate()
                .map(|(i, remote)| inbound(remote, 10 + i as i64)),
        );
        model.take_changes();

        model.add_event(inbound(&remotes[pick], 0));

        prop_assert_eq!(group_count(&model), count);
        prop_assert_eq!(&model.row(0).unwrap().remote_address, &remotes[pick]);
        let changes = model.take_changes();
        let moved = changes.iter().any(|c| matches!(c, ModelChange::RowMoved { .. }));
        let promoted = changes.contains(&ModelChange::RowMoved { from: pick, to: 0 });
        if pick == 0 {
            prop_assert!(!moved);
        } else {
            prop_assert!(promoted);
        }
    }
}

#[test]
fn missed_run_stops_at_first_answered_call() {
    let mut model = HistoryModel::new(GroupingPolicy::ByContact);
    model.fill(vec![
        inbound("+15551234567", 10).missed(),
        inbound("+15551234567", 20).missed(),
        Event::call(Direction::Outbound, LINE, "+15551234567", at(30)),
        inbound("+15551234567", 40).missed(),
    ]);
    assert_eq!(model.row(0).unwrap().event_count, Some(2));
}

#[test]
fn re_merge_keeps_member_order() {
    let alice = "+15551234567";
    let mut store = MemoryStore::new();
    let a = store.insert(inbound(alice, 10).missed());
    let b = store.insert(inbound("+15559876543", 20).missed());
    let c = store.insert(inbound(alice, 30).missed());

    let mut model = HistoryModel::new(GroupingPolicy::ByTime);
    model.fill(store.query(&EventFilter::All));
    assert_eq!(model.row_count(), 3);

    model.delete_event(b, &mut store).unwrap();

    assert_eq!(model.row_count(), 1);
    let members: Vec<Option<EventId>> = model.members(0).iter().map(|e| e.id).collect();
    assert_eq!(members, vec![Some(a), Some(c)]);
}

#[test]
fn conversation_dividers_follow_calendar() {
    let clock = Arc::new(FixedClock::new(noon()));
    let mut model = HistoryModel::builder(GroupingPolicy::ChronologicalBucket)
        .clock(clock)
        .build();
    let message = |minutes_ago| {
        Event::message(
            EventKind::InstantMessage,
            Direction::Inbound,
            GroupId::new(4),
            "friend@example.org",
            at(minutes_ago),
        )
    };

    model.add_event(message(40 * 24 * 60));
    model.add_event(message(25 * 60));
    model.add_event(message(90));

    let labels: Vec<&str> = (0..model.row_count())
        .map(|row| model.row(row).unwrap().free_text.as_str())
        .collect();
    assert_eq!(labels, vec!["Today", "Yesterday", "1 months ago"]);
}

#[test]
fn directory_answers_patch_the_model() {
    let entries = vec![DirectoryEntry {
        contact: ContactRef::new(11, "Alice"),
        addresses: vec![ContactAddress::phone("555 123 4567")],
    }];
    let (resolver, mut answers) = DirectoryResolver::new(entries, AddressMatcher::default());
    let mut model = HistoryModel::builder(GroupingPolicy::ByContact)
        .resolver(Arc::new(resolver))
        .build();

    model.fill(vec![inbound("+15551234567", 10).missed(), inbound("+15550000000", 20)]);
    model.take_changes();

    let mut patched = 0;
    while let Ok(answer) = answers.try_recv() {
        patched += model.on_contact_resolved(answer);
    }

    assert_eq!(patched, 1);
    assert_eq!(model.row(0).unwrap().contact, Some(ContactRef::new(11, "Alice")));
    assert!(model.row(1).unwrap().contact.is_none());
    assert_eq!(model.pending_resolutions(), 0);

    // second answer round for the same contact converges immediately
    assert_eq!(model.patch_contact(&ContactRef::new(11, "Alice"), "+15551234567"), 0);
}
