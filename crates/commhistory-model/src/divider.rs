//! Calendar dividers for chronological views.
//!
//! Each event is assigned to a bucket relative to the local start of "today"
//! at the moment it is inserted. Buckets become synthetic top-level rows that
//! are kept in descending start order. Boundaries are never re-evaluated, so
//! a session spanning midnight can file equal end times under different
//! dividers.

use chrono::{DateTime, FixedOffset, Local, Months, NaiveTime, TimeDelta, Utc};
use commhistory_core::Event;
use parking_lot::Mutex;
use tracing::debug;

use crate::notify::ChangeNotifier;
use crate::tree::{GroupTree, NodeId};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the system time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketKind {
    Today,
    Yesterday,
    /// 2 to 6 days before today.
    DaysAgo(u8),
    /// 1 to 3 weeks before today.
    WeeksAgo(u8),
    /// 1 to 5 months before the fourth week.
    MonthsAgo(u8),
    Older,
}

/// A resolved divider range and its label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub kind: BucketKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

const DAY_LABEL_FORMAT: &str = "%A, %B %-d, %Y";

impl Bucket {
    /// Synthetic event for the divider row.
    pub fn to_divider_event(&self) -> Event {
        Event {
            start_time: self.start,
            end_time: self.end,
            free_text: self.label.clone(),
            ..Event::default()
        }
    }
}

fn far_future() -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(u32::MAX), 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Bucket containing `end_time` as seen at `now`.
pub fn bucket_for(end_time: DateTime<Utc>, now: DateTime<FixedOffset>) -> Bucket {
    let end_time = end_time.with_timezone(now.offset());
    let today = now - now.time().signed_duration_since(NaiveTime::MIN);
    let bucket = |kind, start: DateTime<FixedOffset>, end: DateTime<Utc>, label: String| Bucket {
        kind,
        start: start.with_timezone(&Utc),
        end,
        label,
    };

    if end_time >= today {
        return bucket(BucketKind::Today, today, far_future(), "Today".into());
    }

    let yesterday = today - TimeDelta::days(1);
    if end_time >= yesterday {
        return bucket(BucketKind::Yesterday, yesterday, today.with_timezone(&Utc), "Yesterday".into());
    }

    for days in 2..7u8 {
        let start = today - TimeDelta::days(i64::from(days));
        if end_time >= start {
            let end = (start + TimeDelta::days(1)).with_timezone(&Utc);
            let label = start.format(DAY_LABEL_FORMAT).to_string();
            return bucket(BucketKind::DaysAgo(days), start, end, label);
        }
    }

    for weeks in 1..4u8 {
        let start = today - TimeDelta::weeks(i64::from(weeks));
        if end_time >= start {
            let end = (start + TimeDelta::weeks(1)).with_timezone(&Utc);
            return bucket(BucketKind::WeeksAgo(weeks), start, end, format!("{weeks} weeks ago"));
        }
    }

    let month_base = today - TimeDelta::weeks(4);
    let month_end = today - TimeDelta::weeks(3);
    for months in 1..6u8 {
        let start = month_base - Months::new(u32::from(months));
        if end_time >= start {
            let end = (month_end - Months::new(u32::from(months))).with_timezone(&Utc);
            return bucket(BucketKind::MonthsAgo(months), start, end, format!("{months} months ago"));
        }
    }

    Bucket {
        kind: BucketKind::Older,
        start: DateTime::UNIX_EPOCH,
        end: (month_end - Months::new(5)).with_timezone(&Utc),
        label: "Older".into(),
    }
}

/// Top-level divider node for `bucket`, created if missing.
///
/// Dividers are kept in descending start order; an existing divider with
/// the same start is reused.
pub fn find_or_insert_divider(tree: &mut GroupTree, notifier: &mut ChangeNotifier, bucket: &Bucket) -> NodeId {
    let mut row = 0;
    for &divider in tree.top_level() {
        let start = tree[divider].start_time;
        if start == bucket.start {
            return divider;
        }
        if bucket.start > start {
            break;
        }
        row += 1;
    }

    debug!(row, label = %bucket.label, "inserting divider");
    let id = tree.insert(None, row, bucket.to_divider_event());
    notifier.rows_inserted(None, row, row);
    id
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
