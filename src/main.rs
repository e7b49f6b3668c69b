//! Command-line viewer for communication history dumps.
//!
//! Loads a JSON dump of events (and optionally a contact directory), applies
//! one history view and prints the grouped tree.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use commhistory_core::{
    CallFilter, CallKind, CallSorting, ChatType, ConversationFilter, Direction, Event, EventFilter, EventKind, GroupId,
};
use commhistory_model::{DirectoryEntry, DirectoryResolver, GroupingPolicy, HistoryModel, MemoryStore};
use commhistory_settings::{load_settings, load_settings_from_path, HistorySettings};
use commhistory_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Debug, Parser)]
#[command(name = "commhistory", about = "Grouped call and message history viewer")]
struct Args {
    /// Settings file (defaults to `~/.commhistory/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    view: View,
}

#[derive(Debug, clap::Args)]
struct DumpArgs {
    /// Event dump: `{"events": [...], "contacts": [...]}` or a bare event array.
    #[arg(long)]
    file: PathBuf,

    /// Print the change notifications emitted while filling, as JSON lines.
    #[arg(long, default_value_t = false)]
    changes: bool,
}

#[derive(Debug, Subcommand)]
enum View {
    /// Call history grouped by contact or by time.
    Calls {
        #[command(flatten)]
        dump: DumpArgs,
        /// `contact`, `time`, `type` or `service`. Defaults to the configured sorting.
        #[arg(long)]
        sort: Option<CallSorting>,
        /// `any`, `missed`, `dialed` or `received`.
        #[arg(long, default_value = "any")]
        kind: CallKind,
        /// Hide calls that started before this RFC 3339 instant.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// One conversation under calendar dividers.
    Conversation {
        #[command(flatten)]
        dump: DumpArgs,
        #[arg(long)]
        group: i64,
        /// Only messages on this local account.
        #[arg(long)]
        account: Option<String>,
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        /// `one_to_one`, `unnamed` or `room`.
        #[arg(long, default_value = "one_to_one")]
        chat: ChatType,
    },
    /// Sent messages, newest first.
    Outbox {
        #[command(flatten)]
        dump: DumpArgs,
    },
}

impl View {
    fn dump(&self) -> &DumpArgs {
        match self {
            Self::Calls { dump, .. } | Self::Conversation { dump, .. } | Self::Outbox { dump } => dump,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    Inbound,
    Outbound,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Inbound => Self::Inbound,
            DirectionArg::Outbound => Self::Outbound,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Dump {
    Full {
        events: Vec<Event>,
        #[serde(default)]
        contacts: Vec<DirectoryEntry>,
    },
    Events(Vec<Event>),
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;
    init_telemetry(&TelemetryConfig::from_settings(&settings.logging))?;

    let dump = args.view.dump();
    let (events, contacts) = read_dump(&dump.file)?;
    let mut store = MemoryStore::new();
    for event in events {
        store.insert(event);
    }
    tracing::info!(events = store.len(), contacts = contacts.len(), "dump loaded");

    let (policy, filter) = view_config(&args.view, &settings)?;
    let matcher = settings.grouping.matcher();
    let (resolver, mut answers) = DirectoryResolver::new(contacts, matcher);
    let mut model = HistoryModel::builder(policy)
        .filter(filter.clone())
        .matcher(matcher)
        .resolver(Arc::new(resolver))
        .build();

    let mut batch = store.query(&filter);
    // dividers take their members oldest first
    if policy == GroupingPolicy::ChronologicalBucket {
        batch.reverse();
    }
    model.fill(batch);
    while let Ok(answer) = answers.try_recv() {
        let _ = model.on_contact_resolved(answer);
    }

    if dump.changes {
        for change in model.take_changes() {
            println!("{}", serde_json::to_string(&change)?);
        }
    }
    print_tree(&model);
    Ok(())
}

fn read_dump(path: &Path) -> Result<(Vec<Event>, Vec<DirectoryEntry>)> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read dump: {}", path.display()))?;
    let dump: Dump =
        serde_json::from_str(&content).with_context(|| format!("failed to parse dump: {}", path.display()))?;
    Ok(match dump {
        Dump::Full { events, contacts } => (events, contacts),
        Dump::Events(events) => (events, Vec::new()),
    })
}

fn view_config(view: &View, settings: &HistorySettings) -> Result<(GroupingPolicy, EventFilter)> {
    Ok(match view {
        View::Calls { sort, kind, since, .. } => {
            let sorting = sort.unwrap_or(settings.grouping.call_sorting);
            let policy = GroupingPolicy::for_call_sorting(sorting)?;
            let filter = EventFilter::Calls(CallFilter {
                kind: *kind,
                reference_time: *since,
            });
            (policy, filter)
        }
        View::Conversation {
            group,
            account,
            direction,
            chat,
            ..
        } => {
            let filter = EventFilter::Conversation(ConversationFilter {
                account: account.clone(),
                direction: direction.map(Direction::from),
                chat_type: *chat,
                ..ConversationFilter::for_group(GroupId::new(*group))
            });
            (GroupingPolicy::ChronologicalBucket, filter)
        }
        View::Outbox { .. } => (GroupingPolicy::Flat, EventFilter::Outbox),
    })
}

fn print_tree(model: &HistoryModel) {
    for row in 0..model.row_count() {
        let Some(top) = model.row(row) else {
            continue;
        };
        println!("{}", describe(top, model.policy()));
        for member in model.members(row) {
            println!("    {}", describe(member, GroupingPolicy::Flat));
        }
    }
}

fn describe(event: &Event, policy: GroupingPolicy) -> String {
    if event.kind == EventKind::Unknown {
        let count = event.event_count.unwrap_or(0);
        return format!("── {} ({count})", event.free_text);
    }

    let who = event
        .contact
        .as_ref()
        .map_or_else(|| event.remote_address.clone(), |c| format!("{} <{}>", c.name, event.remote_address));
    let what = match (event.kind, event.direction, event.is_missed_call) {
        (EventKind::Call, _, true) => "missed".to_string(),
        (EventKind::Call, Direction::Outbound, _) => "dialed".to_string(),
        (EventKind::Call, _, _) => "received".to_string(),
        (_, direction, _) => format!("{direction:?}").to_lowercase(),
    };
    let count = match (policy.groups_by_equivalence(), event.event_count) {
        (true, Some(count)) => format!(" ({count})"),
        _ => String::new(),
    };
    let text = if event.free_text.is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", event.free_text)
    };

    format!(
        "{} {who} {what}{count}{text}",
        event.start_time.format("%Y-%m-%d %H:%M")
    )
}
