mod bootstrap;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use kiosk_core::formatting::{format_entry_line, format_queue_card};
use kiosk_core::models::{parse_time_of_day, Queue, QueueEntry};
use kiosk_core::settings::Settings;
use kiosk_runtime::ticker::{TickOrchestrator, TickSnapshot};
use kiosk_store::persistence::StateFile;
use kiosk_store::store::{QueueStore, StoreConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "queue-kiosk", about = "Kiosk-style queue manager", version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new queue and print its id
    Create {
        /// Queue title
        title: String,
        /// Active window start, e.g. 15:00
        #[arg(long, default_value = "15:00")]
        start: String,
        /// Active window end, e.g. 17:00
        #[arg(long, default_value = "17:00")]
        end: String,
        /// Session length per person, in minutes
        #[arg(long, default_value_t = 10)]
        session_minutes: u32,
    },
    /// Add a participant to the tail of a queue
    Add { queue: String, name: String },
    /// Remove a participant from a queue
    Remove { queue: String, entry: String },
    /// Move a participant to a new spot (1-based) in the queue
    Reorder {
        queue: String,
        entry: String,
        to: usize,
    },
    /// Lock a queue against edits
    Lock { queue: String },
    /// Unlock a queue with the code
    Unlock { queue: String, code: String },
    /// Lock the overview against destructive actions
    LockOverview,
    /// Unlock the overview with the code
    UnlockOverview { code: String },
    /// Clear all participants from a queue, keeping its configuration
    Reset { queue: String },
    /// Delete a queue permanently
    Delete { queue: String },
    /// Delete every queue (requires the code)
    ResetAll { code: String },
    /// Print a summary card for every queue
    Overview,
    /// Print one queue with session windows and status badges
    Show { queue: String },
    /// Re-derive states periodically, printing queues as they change
    Watch,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::debug!("queue-kiosk v{} starting", env!("CARGO_PKG_VERSION"));

    let state_file = StateFile::new(settings.state_file_path());
    let config = StoreConfig {
        unlock_code: settings.unlock_code.clone(),
        next_up_window_minutes: settings.next_up_window,
    };

    let now = Utc::now();
    let mut store = match state_file.load() {
        Some(snapshot) => {
            QueueStore::from_parts(config, snapshot.queues, snapshot.global_locked, now)
        }
        None => QueueStore::new(config),
    };

    match cli.command {
        Command::Create {
            title,
            start,
            end,
            session_minutes,
        } => {
            let active_start = parse_time_of_day(&start)?;
            let active_end = parse_time_of_day(&end)?;
            let Some(id) = store.create_queue(&title, active_start, active_end, session_minutes, now)
            else {
                bail!("invalid queue configuration: title must be non-empty and session length positive");
            };
            state_file.save(store.queues(), store.global_locked());
            println!("created queue {id}");
        }

        Command::Add { queue, name } => {
            let id = resolve_queue_id(&store, &queue)?;
            ensure_queue_unlocked(&store, &id)?;
            let name = participant_name(&name)?;
            store.add_entry(&id, &name, now);
            state_file.save(store.queues(), store.global_locked());
            println!("added {name}");
        }

        Command::Remove { queue, entry } => {
            let id = resolve_queue_id(&store, &queue)?;
            ensure_queue_unlocked(&store, &id)?;
            let Some(target) = store.queue(&id) else {
                bail!("no queue matches '{queue}'");
            };
            let entry_id = resolve_entry_id(target, &entry)?;
            store.remove_entry(&id, &entry_id, now);
            state_file.save(store.queues(), store.global_locked());
            println!("removed {entry}");
        }

        Command::Reorder { queue, entry, to } => {
            let id = resolve_queue_id(&store, &queue)?;
            ensure_queue_unlocked(&store, &id)?;
            let Some(target) = store.queue(&id) else {
                bail!("no queue matches '{queue}'");
            };
            let entry_id = resolve_entry_id(target, &entry)?;
            let new_order = moved_order(&target.entries, &entry_id, to.saturating_sub(1));
            store.reorder_entries(&id, new_order, now)?;
            state_file.save(store.queues(), store.global_locked());
            println!("moved {entry} to position {to}");
        }

        Command::Lock { queue } => {
            let id = resolve_queue_id(&store, &queue)?;
            if store.toggle_lock(&id, None) {
                state_file.save(store.queues(), store.global_locked());
                println!("queue locked");
            } else {
                println!("queue was already locked");
            }
        }

        Command::Unlock { queue, code } => {
            let id = resolve_queue_id(&store, &queue)?;
            if store.toggle_lock(&id, Some(&code)) {
                state_file.save(store.queues(), store.global_locked());
                println!("queue unlocked");
            } else {
                println!("wrong code; queue stays locked");
            }
        }

        Command::LockOverview => {
            if store.toggle_global_lock(None) {
                state_file.save(store.queues(), store.global_locked());
                println!("overview locked");
            } else {
                println!("overview was already locked");
            }
        }

        Command::UnlockOverview { code } => {
            if store.toggle_global_lock(Some(&code)) {
                state_file.save(store.queues(), store.global_locked());
                println!("overview unlocked");
            } else {
                println!("wrong code; overview stays locked");
            }
        }

        Command::Reset { queue } => {
            ensure_overview_unlocked(&store)?;
            let id = resolve_queue_id(&store, &queue)?;
            ensure_queue_unlocked(&store, &id)?;
            store.reset_queue(&id, now);
            state_file.save(store.queues(), store.global_locked());
            println!("queue cleared");
        }

        Command::Delete { queue } => {
            ensure_overview_unlocked(&store)?;
            let id = resolve_queue_id(&store, &queue)?;
            ensure_queue_unlocked(&store, &id)?;
            store.delete_queue(&id);
            state_file.save(store.queues(), store.global_locked());
            println!("queue deleted");
        }

        Command::ResetAll { code } => {
            ensure_overview_unlocked(&store)?;
            if !store.reset_all(&code) {
                bail!("wrong code; nothing deleted");
            }
            state_file.save(store.queues(), store.global_locked());
            println!("all queues deleted");
        }

        Command::Overview => {
            store.tick(now);
            if store.queues().is_empty() {
                println!("no queues yet");
            } else {
                if store.global_locked() {
                    println!("[overview locked]\n");
                }
                for queue in store.queues() {
                    println!("{}\n", format_queue_card(queue, &queue.summary()));
                }
            }
        }

        Command::Show { queue } => {
            store.tick(now);
            let id = resolve_queue_id(&store, &queue)?;
            let Some(target) = store.queue(&id) else {
                bail!("no queue matches '{queue}'");
            };
            print_queue(target);
        }

        Command::Watch => {
            let orchestrator = TickOrchestrator::new(settings.tick_interval, Some(state_file));
            let (mut rx, handle) = orchestrator.start(store);

            tokio::select! {
                _ = async {
                    while let Some(snapshot) = rx.recv().await {
                        print_snapshot(&snapshot);
                    }
                } => {
                    handle.abort();
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; stopping tick loop");
                    handle.abort();
                }
            }
        }
    }

    Ok(())
}

// ── Command helpers ───────────────────────────────────────────────────────────

/// Resolve a queue reference: exact id, exact title, or unique id prefix.
fn resolve_queue_id(store: &QueueStore, needle: &str) -> Result<String> {
    if let Some(queue) = store.queue(needle) {
        return Ok(queue.id.clone());
    }
    if let Some(queue) = store.queues().iter().find(|q| q.title == needle) {
        return Ok(queue.id.clone());
    }

    let mut matches = store.queues().iter().filter(|q| q.id.starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(queue), None) => Ok(queue.id.clone()),
        (Some(_), Some(_)) => bail!("queue reference '{needle}' is ambiguous"),
        _ => bail!("no queue matches '{needle}'"),
    }
}

/// Resolve an entry reference within a queue: exact id, exact name, or
/// unique id prefix.
fn resolve_entry_id(queue: &Queue, needle: &str) -> Result<String> {
    if let Some(entry) = queue.entries.iter().find(|e| e.id == needle) {
        return Ok(entry.id.clone());
    }
    if let Some(entry) = queue.entries.iter().find(|e| e.name == needle) {
        return Ok(entry.id.clone());
    }

    let mut matches = queue.entries.iter().filter(|e| e.id.starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry.id.clone()),
        (Some(_), Some(_)) => bail!("entry reference '{needle}' is ambiguous"),
        _ => bail!("no entry matches '{needle}' in queue '{}'", queue.title),
    }
}

/// Build the reordered list with one entry moved to `to_index`, everything
/// else keeping its relative order (the drag-and-drop move, as a list op).
fn moved_order(entries: &[QueueEntry], entry_id: &str, to_index: usize) -> Vec<QueueEntry> {
    let mut order = entries.to_vec();
    if let Some(from) = order.iter().position(|e| e.id == entry_id) {
        let entry = order.remove(from);
        let to = to_index.min(order.len());
        order.insert(to, entry);
    }
    order
}

/// Trim a participant name as typed at the kiosk, refusing empty input.
fn participant_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        bail!("participant name must not be empty");
    }
    Ok(name.to_string())
}

fn ensure_queue_unlocked(store: &QueueStore, queue_id: &str) -> Result<()> {
    if store.queue(queue_id).is_some_and(|q| q.locked) {
        bail!("queue is locked; unlock it first");
    }
    Ok(())
}

fn ensure_overview_unlocked(store: &QueueStore) -> Result<()> {
    if store.global_locked() {
        bail!("overview is locked; no destructive actions allowed");
    }
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_queue(queue: &Queue) {
    println!("{}", queue.title);
    println!(
        "{} – {} · {} min per person",
        queue.active_start.format("%H:%M"),
        queue.active_end.format("%H:%M"),
        queue.session_length_minutes
    );
    if queue.locked {
        println!("[locked]");
    }
    if queue.entries.is_empty() {
        println!("nobody in the queue yet");
    } else {
        for entry in &queue.entries {
            println!("{}", format_entry_line(entry));
        }
    }
}

fn print_snapshot(snapshot: &TickSnapshot) {
    println!("── {} ──", Utc::now().format("%H:%M"));
    for queue in &snapshot.queues {
        print_queue(queue);
        println!();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
