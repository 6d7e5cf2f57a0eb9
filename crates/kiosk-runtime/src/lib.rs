//! Runtime layer for the kiosk queue manager.
//!
//! Owns the cancellable periodic tick that advances lifecycle states as
//! wall-clock time passes.

pub mod ticker;

pub use kiosk_core as core;
pub use kiosk_store as store;
