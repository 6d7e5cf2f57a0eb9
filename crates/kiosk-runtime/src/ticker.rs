//! The periodic tick loop.
//!
//! Runs the store's `tick` in a tokio task, sending [`TickSnapshot`]s
//! through an `mpsc` channel so the presentation side can consume updates
//! without any shared mutable state — the task owns the store outright.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time;

use kiosk_core::models::Queue;
use kiosk_store::persistence::StateFile;
use kiosk_store::store::QueueStore;

// ── Public types ──────────────────────────────────────────────────────────────

/// A snapshot of the queue collection forwarded after a tick.
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    /// All queues with freshly derived windows and states.
    pub queues: Vec<Queue>,
    /// Whole-app destructive-action lock.
    pub global_locked: bool,
}

// ── TickOrchestrator ──────────────────────────────────────────────────────────

/// Background tick coordinator.
///
/// Call [`TickOrchestrator::start`] to move a [`QueueStore`] into a
/// dedicated tokio task and receive a channel of [`TickSnapshot`] updates
/// plus a handle for cancellation.
pub struct TickOrchestrator {
    /// How often states are re-derived.
    interval: Duration,
    /// Where to persist after a tick that changed something.
    state_file: Option<StateFile>,
}

impl TickOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Parameters
    /// - `interval_secs` – seconds between ticks.
    /// - `state_file`    – optional persistence target; `None` keeps the
    ///   loop purely in-memory.
    pub fn new(interval_secs: u64, state_file: Option<StateFile>) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            state_file,
        }
    }

    /// Start the tick loop.
    ///
    /// Takes ownership of the store. Returns:
    /// - An `mpsc::Receiver<TickSnapshot>` carrying the initial snapshot
    ///   immediately, then one snapshot per tick that changed a state.
    /// - A [`TickHandle`] that aborts the loop.
    ///
    /// The loop also stops on its own when the receiver is dropped or when
    /// the store holds no queues — an empty kiosk has nothing to advance.
    pub fn start(self, store: QueueStore) -> (mpsc::Receiver<TickSnapshot>, TickHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.tick_loop(store, tx).await;
        });

        (rx, TickHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn tick_loop(self, mut store: QueueStore, tx: mpsc::Sender<TickSnapshot>) {
        // Initial derivation and snapshot so consumers render immediately.
        store.tick(Utc::now());
        if tx.send(snapshot_of(&store)).await.is_err() {
            return;
        }

        let mut interval = time::interval(self.interval);
        // The first interval tick fires immediately; we already derived above.
        interval.tick().await;

        loop {
            if store.queues().is_empty() {
                tracing::info!("no queues left; stopping tick loop");
                break;
            }

            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting tick loop");
                break;
            }

            if store.tick(Utc::now()) {
                if let Some(file) = &self.state_file {
                    file.save(store.queues(), store.global_locked());
                }
                if tx.send(snapshot_of(&store)).await.is_err() {
                    break;
                }
            }
        }
    }
}

// ── TickHandle ────────────────────────────────────────────────────────────────

/// A handle to the background tick task.
///
/// Call [`TickHandle::abort`] to stop the loop.
pub struct TickHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl TickHandle {
    /// Immediately abort the tick loop.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the loop task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn snapshot_of(store: &QueueStore) -> TickSnapshot {
    TickSnapshot {
        queues: store.queues().to_vec(),
        global_locked: store.global_locked(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
