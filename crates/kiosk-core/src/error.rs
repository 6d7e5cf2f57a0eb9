use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the kiosk queue manager.
#[derive(Error, Debug)]
pub enum KioskError {
    /// The referenced queue does not exist.
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// A reorder supplied a list of the wrong length.
    #[error("Reorder rejected: expected {expected} entries, got {actual}")]
    ReorderLength { expected: usize, actual: usize },

    /// A reorder supplied an entry without an id.
    #[error("Reorder rejected: entry at index {0} has an empty id")]
    ReorderEmptyId(usize),

    /// A reorder supplied ids that do not match the queue's entries.
    #[error("Reorder rejected: entry ids do not match the queue")]
    ReorderIdMismatch,

    /// A time-of-day string could not be parsed.
    #[error("Invalid time of day: {0}")]
    TimeParse(String),

    /// The state file could not be written.
    #[error("Failed to write state file {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to serialize state: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the kiosk crates.
pub type Result<T> = std::result::Result<T, KioskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_queue_not_found() {
        let err = KioskError::QueueNotFound("q-42".to_string());
        assert_eq!(err.to_string(), "Queue not found: q-42");
    }

    #[test]
    fn test_error_display_reorder_length() {
        let err = KioskError::ReorderLength {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Reorder rejected: expected 3 entries, got 2"
        );
    }

    #[test]
    fn test_error_display_reorder_empty_id() {
        let err = KioskError::ReorderEmptyId(1);
        assert_eq!(
            err.to_string(),
            "Reorder rejected: entry at index 1 has an empty id"
        );
    }

    #[test]
    fn test_error_display_reorder_id_mismatch() {
        let err = KioskError::ReorderIdMismatch;
        assert_eq!(
            err.to_string(),
            "Reorder rejected: entry ids do not match the queue"
        );
    }

    #[test]
    fn test_error_display_time_parse() {
        let err = KioskError::TimeParse("25:99".to_string());
        assert_eq!(err.to_string(), "Invalid time of day: 25:99");
    }

    #[test]
    fn test_error_display_state_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = KioskError::StateWrite {
            path: PathBuf::from("/some/state.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to write state file"));
        assert!(msg.contains("/some/state.json"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KioskError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope}").unwrap_err();
        let err: KioskError = json_err.into();
        assert!(err.to_string().contains("Failed to serialize state"));
    }
}
