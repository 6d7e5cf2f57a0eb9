//! Plain-text rendering of queues and entries for the CLI surface.

use chrono::{DateTime, Utc};

use crate::models::{EntryState, Queue, QueueEntry, QueueSummary};

/// Format a UTC instant as a wall-clock time, `"15:00"`.
pub fn format_clock(dt: &DateTime<Utc>) -> String {
    dt.format("%H:%M").to_string()
}

/// Format a session window, `"15:00 – 15:10"`.
pub fn format_window(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    format!("{} – {}", format_clock(start), format_clock(end))
}

/// Short status badge for an entry state. Waiting renders as nothing — it
/// is the unremarkable default.
pub fn state_badge(state: EntryState) -> &'static str {
    match state {
        EntryState::Waiting => "",
        EntryState::NextUp => "[next up]",
        EntryState::Active => "[now]",
        EntryState::Completed => "[done]",
    }
}

/// One list line for an entry: number, name, window and badge.
pub fn format_entry_line(entry: &QueueEntry) -> String {
    let badge = state_badge(entry.state);
    let line = format!(
        "{:>3}. {:<20} {}",
        entry.position + 1,
        entry.name,
        format_window(&entry.session_start, &entry.session_end)
    );
    if badge.is_empty() {
        line
    } else {
        format!("{line}  {badge}")
    }
}

/// Overview card for a queue: title, configuration and the now/next summary.
pub fn format_queue_card(queue: &Queue, summary: &QueueSummary) -> String {
    let lock = if queue.locked { "  [locked]" } else { "" };
    let dash = "—";
    format!(
        "{title}{lock}\n  {id}\n  {start} – {end} · {len} min per person\n  in queue: {count}\n  now:  {current}\n  next: {next}",
        title = queue.title,
        lock = lock,
        id = queue.id,
        start = queue.active_start.format("%H:%M"),
        end = queue.active_end.format("%H:%M"),
        len = queue.session_length_minutes,
        count = summary.len,
        current = summary.current.as_deref().unwrap_or(dash),
        next = summary.next.as_deref().unwrap_or(dash),
    )
}
