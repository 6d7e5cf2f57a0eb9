//! The session deriver.
//!
//! Maps a queue's configuration plus the current wall-clock instant onto a
//! session window and lifecycle state for every entry. Pure: identical
//! inputs give identical output, so it is safe to re-run on every tick.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::models::{EntryState, QueueEntry};

/// Minutes before the active session ends at which the following entry
/// becomes next-up.
pub const DEFAULT_NEXT_UP_WINDOW_MINUTES: i64 = 2;

/// The slice of queue configuration the deriver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time of day when the first session window opens.
    pub active_start: NaiveTime,
    /// Fixed length of every session, in minutes.
    pub session_length_minutes: u32,
    /// Width of the next-up warning window, in minutes.
    pub next_up_window_minutes: i64,
}

impl ScheduleConfig {
    pub fn new(active_start: NaiveTime, session_length_minutes: u32) -> Self {
        Self {
            active_start,
            session_length_minutes,
            next_up_window_minutes: DEFAULT_NEXT_UP_WINDOW_MINUTES,
        }
    }

    pub fn with_next_up_window(mut self, minutes: i64) -> Self {
        self.next_up_window_minutes = minutes;
        self
    }
}

/// Recompute every entry's session window and lifecycle state.
///
/// Output has identical length, ids and positions as the input; only
/// `session_start`, `session_end` and `state` change. The active window is
/// anchored to the calendar day of `now` — a queue is always interpreted
/// against "today".
///
/// Window for position `i`: `start = active_start + i × session_length`,
/// `end = start + session_length`. Windows are contiguous and
/// non-overlapping, so at most one entry is active at any instant.
///
/// State precedence: completed (now ≥ end), then active (start ≤ now < end),
/// then next-up (immediately follows the active entry while it is strictly
/// inside its final warning window), then waiting.
pub fn derive_schedule(
    config: &ScheduleConfig,
    entries: &[QueueEntry],
    now: DateTime<Utc>,
) -> Vec<QueueEntry> {
    let anchor = now.date_naive().and_time(config.active_start).and_utc();
    let session = Duration::minutes(i64::from(config.session_length_minutes));

    let mut derived: Vec<QueueEntry> = entries.to_vec();
    for (i, entry) in derived.iter_mut().enumerate() {
        let start = anchor + session * i as i32;
        let end = start + session;

        entry.session_start = start;
        entry.session_end = end;
        entry.state = if now >= end {
            EntryState::Completed
        } else if now >= start {
            EntryState::Active
        } else {
            EntryState::Waiting
        };
    }

    // Second pass: promote the entry after the active one to next-up once
    // the active session has less than the warning window remaining.
    if let Some(active_index) = derived.iter().position(|e| e.state == EntryState::Active) {
        let remaining = derived[active_index].session_end - now;
        if remaining < Duration::minutes(config.next_up_window_minutes) {
            if let Some(follower) = derived.get_mut(active_index + 1) {
                if follower.state == EntryState::Waiting {
                    follower.state = EntryState::NextUp;
                }
            }
        }
    }

    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> ScheduleConfig {
        ScheduleConfig::new(NaiveTime::from_hms_opt(15, 0, 0).unwrap(), 10)
    }

    fn entries(n: usize) -> Vec<QueueEntry> {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
        (0..n)
            .map(|i| QueueEntry {
                id: format!("id-{i}"),
                name: format!("person-{i}"),
                created_at: t,
                position: i,
                session_start: t,
                session_end: t,
                state: EntryState::Waiting,
            })
            .collect()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    // ── window arithmetic ────────────────────────────────────────────────

    #[test]
    fn test_windows_are_contiguous_and_fixed_length() {
        let derived = derive_schedule(&config(), &entries(5), at(15, 0));

        assert_eq!(derived.len(), 5);
        for (i, e) in derived.iter().enumerate() {
            assert_eq!(e.position, i);
            assert_eq!(e.session_end - e.session_start, Duration::minutes(10));
            if i > 0 {
                // Each window starts exactly where the previous one ends.
                assert_eq!(e.session_start, derived[i - 1].session_end);
            }
        }
        assert_eq!(derived[0].session_start, at(15, 0));
        assert_eq!(derived[4].session_end, at(15, 50));
    }

    #[test]
    fn test_ids_and_positions_unchanged() {
        let input = entries(3);
        let derived = derive_schedule(&config(), &input, at(16, 0));
        for (before, after) in input.iter().zip(&derived) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.position, after.position);
            assert_eq!(before.name, after.name);
            assert_eq!(before.created_at, after.created_at);
        }
    }

    #[test]
    fn test_windows_anchor_to_day_of_evaluation() {
        let derived = derive_schedule(
            &config(),
            &entries(1),
            Utc.with_ymd_and_hms(2024, 7, 20, 12, 0, 0).unwrap(),
        );
        assert_eq!(
            derived[0].session_start,
            Utc.with_ymd_and_hms(2024, 7, 20, 15, 0, 0).unwrap()
        );
    }

    // ── state assignment ─────────────────────────────────────────────────

    #[test]
    fn test_at_most_one_active() {
        for minute in [0, 5, 9, 10, 25, 31, 50] {
            let derived = derive_schedule(&config(), &entries(5), at(15, minute));
            let active = derived
                .iter()
                .filter(|e| e.state == EntryState::Active)
                .count();
            assert!(active <= 1, "minute {minute}: {active} active entries");
        }
    }

    #[test]
    fn test_scenario_three_entries() {
        let cfg = config();
        let list = entries(3);

        // 15:00 — first active, second still waiting.
        let d = derive_schedule(&cfg, &list, at(15, 0));
        assert_eq!(d[0].state, EntryState::Active);
        assert_eq!(d[1].state, EntryState::Waiting);
        assert_eq!(d[2].state, EntryState::Waiting);

        // 15:09 — second becomes next-up.
        let d = derive_schedule(&cfg, &list, at(15, 9));
        assert_eq!(d[0].state, EntryState::Active);
        assert_eq!(d[1].state, EntryState::NextUp);
        assert_eq!(d[2].state, EntryState::Waiting);

        // 15:10 — first completed, second active.
        let d = derive_schedule(&cfg, &list, at(15, 10));
        assert_eq!(d[0].state, EntryState::Completed);
        assert_eq!(d[1].state, EntryState::Active);
        assert_eq!(d[2].state, EntryState::Waiting);
    }

    #[test]
    fn test_next_up_window_opens_strictly_inside_threshold() {
        // Exactly 2 minutes remaining is not yet inside the warning window.
        let d = derive_schedule(&config(), &entries(2), at(15, 8));
        assert_eq!(d[1].state, EntryState::Waiting);

        let d = derive_schedule(&config(), &entries(2), at(15, 9));
        assert_eq!(d[1].state, EntryState::NextUp);
    }

    #[test]
    fn test_no_next_up_without_active_predecessor() {
        // Before the window opens nobody is active, so nobody is next-up.
        let d = derive_schedule(&config(), &entries(3), at(14, 59));
        assert!(d.iter().all(|e| e.state == EntryState::Waiting));
    }

    #[test]
    fn test_all_completed_after_window() {
        let d = derive_schedule(&config(), &entries(3), at(16, 0));
        assert!(d.iter().all(|e| e.state == EntryState::Completed));
    }

    #[test]
    fn test_custom_next_up_window() {
        let cfg = config().with_next_up_window(5);
        // 15:06 — 4 minutes remain of the first session, inside a 5-minute window.
        let d = derive_schedule(&cfg, &entries(2), at(15, 6));
        assert_eq!(d[1].state, EntryState::NextUp);
    }

    #[test]
    fn test_empty_list() {
        let d = derive_schedule(&config(), &[], at(15, 0));
        assert!(d.is_empty());
    }

    #[test]
    fn test_derivation_is_pure() {
        let cfg = config();
        let list = entries(4);
        let now = at(15, 19);

        let a = derive_schedule(&cfg, &list, now);
        let b = derive_schedule(&cfg, &list, now);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.state, y.state);
            assert_eq!(x.session_start, y.session_start);
            assert_eq!(x.session_end, y.session_end);
        }
    }
}
