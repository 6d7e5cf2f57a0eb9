//! The queue store.
//!
//! Owns the full queue collection and every mutation on it. Each operation
//! computes its new state synchronously — re-deriving session windows and
//! lifecycle states through the session deriver — before the caller sees
//! anything, so the store is always internally consistent. No globals: the
//! store is constructed once and passed by handle.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use kiosk_core::error::{KioskError, Result};
use kiosk_core::models::{EntryState, Queue, QueueEntry, QueueSummary};
use kiosk_core::schedule::{derive_schedule, ScheduleConfig, DEFAULT_NEXT_UP_WINDOW_MINUTES};
use kiosk_core::settings::DEFAULT_UNLOCK_CODE;

// ── StoreConfig ───────────────────────────────────────────────────────────────

/// Tunables shared by every queue in the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Code that unlocks a locked queue or the overview, and authorizes
    /// reset-all.
    pub unlock_code: String,
    /// Width of the next-up warning window, in minutes.
    pub next_up_window_minutes: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            unlock_code: DEFAULT_UNLOCK_CODE.to_string(),
            next_up_window_minutes: DEFAULT_NEXT_UP_WINDOW_MINUTES,
        }
    }
}

// ── QueueStore ────────────────────────────────────────────────────────────────

/// In-memory ordered collection of queues plus the global lock and the
/// currently-open queue selection.
pub struct QueueStore {
    config: StoreConfig,
    queues: Vec<Queue>,
    global_locked: bool,
    current_queue_id: Option<String>,
}

impl QueueStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            queues: Vec::new(),
            global_locked: false,
            current_queue_id: None,
        }
    }

    /// Seed a store from a persisted snapshot. Every queue is re-derived
    /// against `now` so no stale derived fields survive a cold start.
    pub fn from_parts(
        config: StoreConfig,
        queues: Vec<Queue>,
        global_locked: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let mut store = Self {
            config,
            queues,
            global_locked,
            current_queue_id: None,
        };
        let window = store.config.next_up_window_minutes;
        for queue in &mut store.queues {
            rederive(queue, window, now);
        }
        store
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    pub fn queue(&self, queue_id: &str) -> Option<&Queue> {
        self.queues.iter().find(|q| q.id == queue_id)
    }

    pub fn global_locked(&self) -> bool {
        self.global_locked
    }

    pub fn current_queue_id(&self) -> Option<&str> {
        self.current_queue_id.as_deref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Overview-card summary for one queue.
    pub fn summary(&self, queue_id: &str) -> Option<QueueSummary> {
        self.queue(queue_id).map(Queue::summary)
    }

    // ── Queue lifecycle ───────────────────────────────────────────────────

    /// Create a queue and make it current. Returns the new queue's id, or
    /// `None` when the input is invalid (empty title, zero session length) —
    /// validation belongs to the caller, so the store only refuses quietly.
    pub fn create_queue(
        &mut self,
        title: &str,
        active_start: NaiveTime,
        active_end: NaiveTime,
        session_length_minutes: u32,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let title = title.trim();
        if title.is_empty() || session_length_minutes == 0 {
            warn!(title, session_length_minutes, "ignoring invalid queue creation");
            return None;
        }

        let id = Uuid::new_v4().to_string();
        self.queues.push(Queue {
            id: id.clone(),
            title: title.to_string(),
            active_start,
            active_end,
            session_length_minutes,
            locked: false,
            entries: Vec::new(),
            updated_at: now,
        });
        self.current_queue_id = Some(id.clone());

        info!(queue_id = %id, title, "queue created");
        Some(id)
    }

    /// Clear a queue's entries, keeping its configuration.
    pub fn reset_queue(&mut self, queue_id: &str, now: DateTime<Utc>) -> bool {
        let Some(queue) = self.queues.iter_mut().find(|q| q.id == queue_id) else {
            return false;
        };
        queue.entries.clear();
        queue.updated_at = now;
        info!(queue_id, "queue reset");
        true
    }

    /// Remove a queue entirely. If it was the currently-open queue, the
    /// selection falls back to the overview.
    pub fn delete_queue(&mut self, queue_id: &str) -> bool {
        let before = self.queues.len();
        self.queues.retain(|q| q.id != queue_id);
        if self.queues.len() == before {
            return false;
        }
        if self.current_queue_id.as_deref() == Some(queue_id) {
            self.current_queue_id = None;
        }
        info!(queue_id, "queue deleted");
        true
    }

    /// Delete every queue, gated by the unlock code. Wrong code: failure
    /// reported, nothing mutated.
    pub fn reset_all(&mut self, code: &str) -> bool {
        if code != self.config.unlock_code {
            warn!("reset-all refused: wrong code");
            return false;
        }
        self.queues.clear();
        self.current_queue_id = None;
        info!("all queues deleted");
        true
    }

    // ── Entry mutations ───────────────────────────────────────────────────

    /// Append a participant at the tail of a queue. No-op when the queue
    /// does not exist.
    pub fn add_entry(&mut self, queue_id: &str, name: &str, now: DateTime<Utc>) -> bool {
        let window = self.config.next_up_window_minutes;
        let Some(queue) = self.queues.iter_mut().find(|q| q.id == queue_id) else {
            warn!(queue_id, "add ignored: queue not found");
            return false;
        };

        let position = queue.entries.len();
        queue.entries.push(QueueEntry {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
            position,
            session_start: now,
            session_end: now,
            state: EntryState::Waiting,
        });
        queue.updated_at = now;
        rederive(queue, window, now);

        debug!(queue_id, name, position, "entry added");
        true
    }

    /// Remove an entry and renumber the remainder contiguously from zero,
    /// preserving relative order.
    pub fn remove_entry(&mut self, queue_id: &str, entry_id: &str, now: DateTime<Utc>) -> bool {
        let window = self.config.next_up_window_minutes;
        let Some(queue) = self.queues.iter_mut().find(|q| q.id == queue_id) else {
            return false;
        };

        let before = queue.entries.len();
        queue.entries.retain(|e| e.id != entry_id);
        if queue.entries.len() == before {
            return false;
        }

        renumber(&mut queue.entries);
        queue.updated_at = now;
        rederive(queue, window, now);

        debug!(queue_id, entry_id, "entry removed");
        true
    }

    /// Replace a queue's entry order with `new_order`.
    ///
    /// Guard invariants — any violation aborts with no mutation: the list
    /// must have the queue's exact length, every entry must carry a
    /// non-empty id, and the id multiset must equal the queue's (duplicated
    /// or substituted ids of the right length are rejected too).
    pub fn reorder_entries(
        &mut self,
        queue_id: &str,
        new_order: Vec<QueueEntry>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let window = self.config.next_up_window_minutes;
        let queue = self
            .queues
            .iter_mut()
            .find(|q| q.id == queue_id)
            .ok_or_else(|| KioskError::QueueNotFound(queue_id.to_string()))?;

        if new_order.len() != queue.entries.len() {
            return Err(KioskError::ReorderLength {
                expected: queue.entries.len(),
                actual: new_order.len(),
            });
        }
        if let Some(index) = new_order.iter().position(|e| e.id.is_empty()) {
            return Err(KioskError::ReorderEmptyId(index));
        }

        // Id multiset equality: every id in the new order must consume one
        // occurrence from the existing entries.
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        for entry in &queue.entries {
            *remaining.entry(entry.id.as_str()).or_default() += 1;
        }
        for entry in &new_order {
            match remaining.get_mut(entry.id.as_str()) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return Err(KioskError::ReorderIdMismatch),
            }
        }

        queue.entries = new_order;
        renumber(&mut queue.entries);
        queue.updated_at = now;
        rederive(queue, window, now);

        debug!(queue_id, "entries reordered");
        Ok(())
    }

    // ── Locks ─────────────────────────────────────────────────────────────

    /// Toggle a queue's lock. Unlocked queues lock unconditionally; locked
    /// queues unlock only with the correct code. Anything else is a silent
    /// no-op. Returns whether the lock state changed.
    pub fn toggle_lock(&mut self, queue_id: &str, code: Option<&str>) -> bool {
        let unlock_code = self.config.unlock_code.clone();
        let Some(queue) = self.queues.iter_mut().find(|q| q.id == queue_id) else {
            return false;
        };

        if queue.locked {
            if code == Some(unlock_code.as_str()) {
                queue.locked = false;
                info!(queue_id, "queue unlocked");
                true
            } else {
                debug!(queue_id, "unlock refused: wrong or missing code");
                false
            }
        } else {
            queue.locked = true;
            info!(queue_id, "queue locked");
            true
        }
    }

    /// Same toggle rule for the whole-app lock that gates destructive
    /// operations across all queues.
    pub fn toggle_global_lock(&mut self, code: Option<&str>) -> bool {
        if self.global_locked {
            if code == Some(self.config.unlock_code.as_str()) {
                self.global_locked = false;
                info!("overview unlocked");
                true
            } else {
                debug!("overview unlock refused: wrong or missing code");
                false
            }
        } else {
            self.global_locked = true;
            info!("overview locked");
            true
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────

    /// Make a queue the currently-open one.
    pub fn open_queue(&mut self, queue_id: &str) -> bool {
        if self.queue(queue_id).is_none() {
            return false;
        }
        self.current_queue_id = Some(queue_id.to_string());
        true
    }

    /// Return to the overview.
    pub fn close_queue(&mut self) {
        self.current_queue_id = None;
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance lifecycle states as time passes. Positions never change;
    /// each non-empty queue is re-derived, and the result is applied only
    /// when at least one entry's state actually changed, so a quiet tick
    /// costs no persistence write. Returns whether anything changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let window = self.config.next_up_window_minutes;
        let mut changed = false;

        for queue in self.queues.iter_mut().filter(|q| !q.entries.is_empty()) {
            let config = schedule_config(queue, window);
            let derived = derive_schedule(&config, &queue.entries, now);
            let state_changed = queue
                .entries
                .iter()
                .zip(&derived)
                .any(|(before, after)| before.state != after.state);

            if state_changed {
                debug!(queue_id = %queue.id, "tick advanced entry states");
                queue.entries = derived;
                changed = true;
            }
        }

        changed
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn schedule_config(queue: &Queue, next_up_window_minutes: i64) -> ScheduleConfig {
    ScheduleConfig::new(queue.active_start, queue.session_length_minutes)
        .with_next_up_window(next_up_window_minutes)
}

/// Re-derive a queue's windows and states in place.
fn rederive(queue: &mut Queue, next_up_window_minutes: i64, now: DateTime<Utc>) {
    let config = schedule_config(queue, next_up_window_minutes);
    queue.entries = derive_schedule(&config, &queue.entries, now);
}

/// Reassign positions 0..n-1 in current list order.
fn renumber(entries: &mut [QueueEntry]) {
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
