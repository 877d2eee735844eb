//! Keystroke capture types.
//!
//! Clients send completed press/release pairs; [`KeystrokeRecorder`] derives
//! the dwell and flight times the same way when building sessions locally.

pub mod types;

pub use types::{validate_keystrokes, KeystrokeEvent, KeystrokeRecorder};
