//! Core domain layer for the kiosk queue manager.
//!
//! Holds the queue and entry models, the pure session deriver that maps
//! wall-clock time and list position onto session windows and lifecycle
//! states, plus the error taxonomy, CLI settings and display formatting
//! shared by the other crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod schedule;
pub mod settings;

pub use error::{KioskError, Result};
