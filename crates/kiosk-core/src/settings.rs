use clap::Parser;
use std::path::PathBuf;

use crate::schedule::DEFAULT_NEXT_UP_WINDOW_MINUTES;

/// Seconds between schedule re-derivations in watch mode.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Fixed unlock secret from the original kiosk. A convenience code, not a
/// security boundary — it gates accidental edits, nothing more.
pub const DEFAULT_UNLOCK_CODE: &str = "999999";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Kiosk queue manager
#[derive(Parser, Debug, Clone)]
#[command(name = "queue-kiosk", about = "Kiosk-style queue manager", version)]
pub struct Settings {
    /// State file path (defaults to ~/.queue-kiosk/state.json)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Code required to unlock a queue, the overview, or reset everything
    #[arg(long, default_value = DEFAULT_UNLOCK_CODE)]
    pub unlock_code: String,

    /// Minutes before a session ends when the next entry is flagged (0-60)
    #[arg(long, default_value_t = DEFAULT_NEXT_UP_WINDOW_MINUTES, value_parser = clap::value_parser!(i64).range(0..=60))]
    pub next_up_window: i64,

    /// Seconds between ticks in watch mode (5-3600)
    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(5..=3600))]
    pub tick_interval: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Resolve the state-file path: the explicit flag wins, otherwise
    /// `~/.queue-kiosk/state.json` (falling back to the current directory
    /// when no home directory can be determined).
    pub fn state_file_path(&self) -> PathBuf {
        match &self.state_file {
            Some(p) => p.clone(),
            None => default_state_path(&dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))),
        }
    }

    /// The log level after applying the `--debug` override.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

/// The default state path rooted at `base_dir` (split out for testing).
pub fn default_state_path(base_dir: &std::path::Path) -> PathBuf {
    base_dir.join(".queue-kiosk").join("state.json")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
