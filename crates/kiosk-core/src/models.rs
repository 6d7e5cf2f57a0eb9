use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KioskError, Result};

/// Lifecycle state of a queue entry, derived from wall-clock time and
/// list position. Never authoritative in storage — recomputed on every
/// read and on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryState {
    /// Scheduled, but the session window has not opened yet.
    Waiting,
    /// Immediately follows the active entry, whose window is about to close.
    NextUp,
    /// The session window contains the current instant.
    Active,
    /// The session window has already closed.
    Completed,
}

/// A single participant in a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name shown on the kiosk.
    pub name: String,
    /// UTC timestamp when the entry was added.
    pub created_at: DateTime<Utc>,
    /// Zero-based order position, contiguous and unique within the queue.
    pub position: usize,
    /// Derived start of this entry's session window.
    pub session_start: DateTime<Utc>,
    /// Derived end of this entry's session window.
    pub session_end: DateTime<Utc>,
    /// Derived lifecycle state for the entry's current position.
    #[serde(default = "EntryState::waiting")]
    pub state: EntryState,
}

impl EntryState {
    /// Serde default: a freshly loaded entry starts as waiting until the
    /// next derivation pass overwrites it.
    fn waiting() -> Self {
        EntryState::Waiting
    }
}

/// A named queue with its active window, session length, lock flag and
/// ordered participant list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    /// Opaque unique identifier.
    pub id: String,
    /// Display title shown on the kiosk.
    pub title: String,
    /// Time of day when the first session starts.
    pub active_start: NaiveTime,
    /// Time of day when the active window closes.
    pub active_end: NaiveTime,
    /// Fixed length of every session, in minutes.
    pub session_length_minutes: u32,
    /// Whether edits to this queue are currently locked.
    #[serde(default)]
    pub locked: bool,
    /// Ordered participant entries.
    #[serde(default)]
    pub entries: Vec<QueueEntry>,
    /// UTC timestamp of the last structural mutation.
    pub updated_at: DateTime<Utc>,
}

/// Overview-card summary for a queue: who is up now, who follows, and how
/// many people are waiting in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSummary {
    /// Name of the entry whose turn it is (the active entry, or the first
    /// entry when nobody is active yet). `None` for an empty queue.
    pub current: Option<String>,
    /// Name of the entry after the current one, if any.
    pub next: Option<String>,
    /// Total number of entries in the queue.
    pub len: usize,
}

impl Queue {
    /// Build the overview summary from the current derived states.
    pub fn summary(&self) -> QueueSummary {
        if self.entries.is_empty() {
            return QueueSummary {
                current: None,
                next: None,
                len: 0,
            };
        }

        // The active entry wins; before the window opens, the first entry
        // stands in as "current".
        let current_index = self
            .entries
            .iter()
            .position(|e| e.state == EntryState::Active)
            .unwrap_or(0);

        QueueSummary {
            current: Some(self.entries[current_index].name.clone()),
            next: self.entries.get(current_index + 1).map(|e| e.name.clone()),
            len: self.entries.len(),
        }
    }
}

/// Parse a time-of-day string as entered on the kiosk (`"15:00"`, or with
/// seconds `"15:00:30"`).
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| KioskError::TimeParse(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(name: &str, position: usize, state: EntryState) -> QueueEntry {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        QueueEntry {
            id: format!("id-{position}"),
            name: name.to_string(),
            created_at: t,
            position,
            session_start: t,
            session_end: t,
            state,
        }
    }

    fn queue_with(entries: Vec<QueueEntry>) -> Queue {
        Queue {
            id: "q-1".to_string(),
            title: "VR".to_string(),
            active_start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            active_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            session_length_minutes: 10,
            locked: false,
            entries,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap(),
        }
    }

    // ── EntryState serde ─────────────────────────────────────────────────

    #[test]
    fn test_entry_state_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EntryState::NextUp).unwrap(),
            r#""next-up""#
        );
        assert_eq!(
            serde_json::to_string(&EntryState::Waiting).unwrap(),
            r#""waiting""#
        );
        assert_eq!(
            serde_json::to_string(&EntryState::Active).unwrap(),
            r#""active""#
        );
        assert_eq!(
            serde_json::to_string(&EntryState::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn test_entry_state_round_trip() {
        for state in [
            EntryState::Waiting,
            EntryState::NextUp,
            EntryState::Active,
            EntryState::Completed,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            let back: EntryState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }

    // ── wire field names ─────────────────────────────────────────────────

    #[test]
    fn test_entry_uses_camel_case_wire_names() {
        let e = entry("Alice", 0, EntryState::Waiting);
        let value = serde_json::to_value(&e).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("sessionStart").is_some());
        assert!(value.get("sessionEnd").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_queue_uses_camel_case_wire_names() {
        let q = queue_with(vec![]);
        let value = serde_json::to_value(&q).unwrap();
        assert!(value.get("activeTimeStart").is_none());
        assert!(value.get("activeStart").is_some());
        assert!(value.get("sessionLengthMinutes").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    // ── summary ──────────────────────────────────────────────────────────

    #[test]
    fn test_summary_empty_queue() {
        let q = queue_with(vec![]);
        let s = q.summary();
        assert_eq!(s.current, None);
        assert_eq!(s.next, None);
        assert_eq!(s.len, 0);
    }

    #[test]
    fn test_summary_with_active_entry() {
        let q = queue_with(vec![
            entry("Alice", 0, EntryState::Completed),
            entry("Bob", 1, EntryState::Active),
            entry("Carol", 2, EntryState::Waiting),
        ]);
        let s = q.summary();
        assert_eq!(s.current.as_deref(), Some("Bob"));
        assert_eq!(s.next.as_deref(), Some("Carol"));
        assert_eq!(s.len, 3);
    }

    #[test]
    fn test_summary_falls_back_to_first_entry() {
        // Nobody active yet (before the window opens).
        let q = queue_with(vec![
            entry("Alice", 0, EntryState::Waiting),
            entry("Bob", 1, EntryState::Waiting),
        ]);
        let s = q.summary();
        assert_eq!(s.current.as_deref(), Some("Alice"));
        assert_eq!(s.next.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_summary_last_entry_has_no_next() {
        let q = queue_with(vec![entry("Alice", 0, EntryState::Active)]);
        let s = q.summary();
        assert_eq!(s.current.as_deref(), Some("Alice"));
        assert_eq!(s.next, None);
    }

    // ── parse_time_of_day ────────────────────────────────────────────────

    #[test]
    fn test_parse_time_of_day_hm() {
        let t = parse_time_of_day("15:00").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_time_of_day_hms() {
        let t = parse_time_of_day("09:30:15").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(9, 30, 15).unwrap());
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        assert!(parse_time_of_day("quarter past three").is_err());
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    // ── queue serde round trip ───────────────────────────────────────────

    #[test]
    fn test_queue_round_trip() {
        let q = queue_with(vec![entry("Alice", 0, EntryState::Active)]);
        let json = serde_json::to_string(&q).unwrap();
        let back: Queue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, q.id);
        assert_eq!(back.title, q.title);
        assert_eq!(back.active_start, q.active_start);
        assert_eq!(back.session_length_minutes, 10);
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.entries[0].name, "Alice");
        assert_eq!(back.entries[0].created_at, q.entries[0].created_at);
    }
}
