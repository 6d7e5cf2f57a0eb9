//! File-backed persistence for the queue collection.
//!
//! One JSON document holds everything: the queues, the global lock flag and
//! a last-updated stamp. The file is a cache of the in-memory store, not a
//! source of truth — load failures degrade to "no saved state" and write
//! failures leave the in-memory state authoritative.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use kiosk_core::error::{KioskError, Result};
use kiosk_core::models::Queue;

// ── StateSnapshot ─────────────────────────────────────────────────────────────

/// The persisted document. Wire names are camelCase; entry timestamps
/// serialize as ISO-8601 strings through their typed chrono fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// All queues with their entries.
    pub queues: Vec<Queue>,
    /// Whole-app lock gating destructive operations.
    #[serde(default)]
    pub global_locked: bool,
    /// Epoch milliseconds when the snapshot was written.
    #[serde(default)]
    pub last_updated_at: i64,
}

// ── StateFile ─────────────────────────────────────────────────────────────────

/// Handle to the single state file.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current queue collection to disk.
    ///
    /// Fire-and-forget from the caller's perspective: a failure is logged
    /// and reported as `false`, never raised.
    pub fn save(&self, queues: &[Queue], global_locked: bool) -> bool {
        let snapshot = StateSnapshot {
            queues: queues.to_vec(),
            global_locked,
            last_updated_at: Utc::now().timestamp_millis(),
        };

        match self.write_snapshot(&snapshot) {
            Ok(()) => {
                debug!(
                    queues = snapshot.queues.len(),
                    global_locked, "state saved"
                );
                true
            }
            Err(e) => {
                error!(error = %e, "failed to save state; in-memory state remains authoritative");
                false
            }
        }
    }

    /// Load the saved snapshot, if any.
    ///
    /// A missing file, unreadable file or malformed document all yield
    /// `None` ("no saved state") rather than an error.
    pub fn load(&self) -> Option<StateSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved state found");
                return None;
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "failed to read state file");
                return None;
            }
        };

        match serde_json::from_str::<StateSnapshot>(&content) {
            Ok(snapshot) => {
                debug!(
                    queues = snapshot.queues.len(),
                    global_locked = snapshot.global_locked,
                    "state loaded"
                );
                Some(snapshot)
            }
            Err(e) => {
                error!(error = %e, "state file is malformed; treating as no saved state");
                None
            }
        }
    }

    /// Best-effort removal of the state file.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "failed to clear state file");
            }
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Serialize and write atomically: temp file in the same directory,
    /// then rename over the target.
    fn write_snapshot(&self, snapshot: &StateSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| KioskError::StateWrite {
                path: self.path.clone(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|source| KioskError::StateWrite {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| KioskError::StateWrite {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
