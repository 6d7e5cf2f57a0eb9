//! State layer for the kiosk queue manager.
//!
//! Owns the queue collection and every mutation on it, and handles the
//! JSON persistence round-trip that lets a restart pick up where the kiosk
//! left off.

pub mod persistence;
pub mod store;

pub use kiosk_core as core;
