//! Keystroke timing events.
//!
//! Every event is a single press/release pair. Times are integer milliseconds
//! relative to the start of the typing session.

use crate::error::BiometricsError;
use serde::{Deserialize, Serialize};

/// A captured key press/release pair with its derived timing features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokeEvent {
    /// Character pressed (e.g. "a", "Space", "Enter")
    pub key: String,
    /// Key code as reported by the client
    pub key_code: String,
    /// When the key went down
    pub press_time: i64,
    /// When the key came up
    pub release_time: i64,
    /// How long the key was held (release - press)
    pub dwell_time: i64,
    /// Time since the previous key release, 0 for the first key
    pub flight_time: i64,
}

impl KeystrokeEvent {
    /// Build an event from raw press/release timings.
    ///
    /// `previous_release` is the release time of the preceding key, if any.
    pub fn new(
        key: impl Into<String>,
        key_code: impl Into<String>,
        press_time: i64,
        release_time: i64,
        previous_release: Option<i64>,
    ) -> Self {
        Self {
            key: key.into(),
            key_code: key_code.into(),
            press_time,
            release_time,
            dwell_time: release_time - press_time,
            flight_time: previous_release.map_or(0, |prev| press_time - prev),
        }
    }

    /// Whether this event carries a flight time (i.e. it had a predecessor).
    pub fn has_flight(&self) -> bool {
        self.flight_time != 0
    }
}

/// Records keystrokes in typing order, deriving dwell and flight times.
#[derive(Debug, Clone, Default)]
pub struct KeystrokeRecorder {
    events: Vec<KeystrokeEvent>,
    last_release: Option<i64>,
}

impl KeystrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed key press and return the derived event.
    pub fn record(
        &mut self,
        key: impl Into<String>,
        key_code: impl Into<String>,
        press_time: i64,
        release_time: i64,
    ) -> &KeystrokeEvent {
        let event = KeystrokeEvent::new(key, key_code, press_time, release_time, self.last_release);
        self.last_release = Some(release_time);
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[KeystrokeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<KeystrokeEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
        self.last_release = None;
    }
}

/// Reject malformed keystroke lists.
///
/// Enrollment requires at least one keystroke; verification tolerates an
/// empty list (it aggregates to a zero signature). Dwell times must be
/// non-negative and agree with the press/release pair they came from.
pub fn validate_keystrokes(
    events: &[KeystrokeEvent],
    require_non_empty: bool,
) -> Result<(), BiometricsError> {
    if require_non_empty && events.is_empty() {
        return Err(BiometricsError::Validation(
            "at least one keystroke is required".to_string(),
        ));
    }

    if let Some((index, event)) = events.iter().enumerate().find(|(_, e)| e.dwell_time < 0) {
        return Err(BiometricsError::Validation(format!(
            "keystroke {index} ({:?}) has negative dwell time {}ms",
            event.key, event.dwell_time
        )));
    }

    if let Some((index, event)) = events
        .iter()
        .enumerate()
        .find(|(_, e)| e.dwell_time != e.release_time - e.press_time)
    {
        return Err(BiometricsError::Validation(format!(
            "keystroke {index} ({:?}) reports dwell time {}ms but was held {}ms",
            event.key,
            event.dwell_time,
            event.release_time - event.press_time
        )));
    }

    Ok(())
}
