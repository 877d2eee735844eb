//! Session signatures.
//!
//! A signature reduces a typing session (or a user's whole history) to two
//! numbers: mean dwell time and mean flight time, both in milliseconds.

use crate::core::numeric::{mean, round_f64};
use crate::keystroke::KeystrokeEvent;
use serde::{Deserialize, Serialize};

/// Mean dwell and flight time of a set of keystrokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSignature {
    pub avg_dwell: f64,
    pub avg_flight: f64,
}

impl SessionSignature {
    pub fn new(avg_dwell: f64, avg_flight: f64) -> Self {
        Self {
            avg_dwell,
            avg_flight,
        }
    }

    /// Copy of this signature with both axes rounded to `dp` decimal places.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            avg_dwell: round_f64(self.avg_dwell, dp),
            avg_flight: round_f64(self.avg_flight, dp),
        }
    }
}

/// Aggregate a session's keystrokes into its signature.
///
/// Flight times of exactly 0 mark "no predecessor" and are left out of the
/// flight mean. Either axis is 0.0 when it has no samples.
pub fn aggregate(events: &[KeystrokeEvent]) -> SessionSignature {
    let avg_dwell = mean(events.iter().map(|e| e.dwell_time)).unwrap_or(0.0);
    let avg_flight = mean(
        events
            .iter()
            .filter(|e| e.has_flight())
            .map(|e| e.flight_time),
    )
    .unwrap_or(0.0);

    SessionSignature {
        avg_dwell,
        avg_flight,
    }
}

/// Running profile signature over every keystroke a user has stored.
///
/// Unlike [`aggregate`], every flight time counts, including the 0 carried by
/// the first keystroke of each session. `None` when there are no keystrokes.
pub fn profile_signature<'a, I>(events: I) -> Option<SessionSignature>
where
    I: IntoIterator<Item = &'a KeystrokeEvent>,
    I::IntoIter: Clone,
{
    let events = events.into_iter();

    Some(SessionSignature {
        avg_dwell: mean(events.clone().map(|e| e.dwell_time))?,
        avg_flight: mean(events.map(|e| e.flight_time))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystroke::KeystrokeRecorder;
    use pretty_assertions::assert_eq;

    fn event(dwell: i64, flight: i64) -> KeystrokeEvent {
        KeystrokeEvent {
            key: "x".to_string(),
            key_code: "88".to_string(),
            press_time: 0,
            release_time: dwell,
            dwell_time: dwell,
            flight_time: flight,
        }
    }

    #[test]
    fn test_empty_session() {
        assert_eq!(aggregate(&[]), SessionSignature::new(0.0, 0.0));
    }

    #[test]
    fn test_first_flight_excluded() {
        let events = vec![event(100, 0), event(110, 40), event(120, 60)];
        assert_eq!(aggregate(&events), SessionSignature::new(110.0, 50.0));
    }

    #[test]
    fn test_all_zero_flights() {
        let events = vec![event(80, 0), event(90, 0)];
        assert_eq!(aggregate(&events), SessionSignature::new(85.0, 0.0));
    }

    #[test]
    fn test_single_keystroke() {
        assert_eq!(aggregate(&[event(97, 0)]), SessionSignature::new(97.0, 0.0));
    }

    #[test]
    fn test_order_independent_given_fixed_flights() {
        let events = vec![event(100, 0), event(130, 25), event(90, 70), event(105, 45)];
        let mut reversed = events.clone();
        reversed.reverse();
        let mut rotated = events.clone();
        rotated.rotate_left(2);

        assert_eq!(aggregate(&events), aggregate(&reversed));
        assert_eq!(aggregate(&events), aggregate(&rotated));
    }

    #[test]
    fn test_recorded_session() {
        let mut recorder = KeystrokeRecorder::new();
        recorder.record("t", "84", 0, 100);
        recorder.record("y", "89", 150, 260);
        recorder.record("p", "80", 330, 420);

        let signature = aggregate(recorder.events());
        assert!((signature.avg_dwell - 290.0 / 3.0).abs() < 1e-9);
        assert_eq!(signature.avg_flight, 60.0);
    }

    #[test]
    fn test_profile_signature_counts_zero_flights() {
        let mut recorder = KeystrokeRecorder::new();
        recorder.record("a", "65", 0, 100);
        recorder.record("b", "66", 140, 240);

        let session = aggregate(recorder.events());
        assert_eq!(session, SessionSignature::new(100.0, 40.0));

        let profile = profile_signature(recorder.events()).unwrap();
        assert_eq!(profile, SessionSignature::new(100.0, 20.0));
        assert_eq!(profile_signature(&[]), None);
    }

    #[test]
    fn test_rounded() {
        let signature = SessionSignature::new(290.0 / 3.0, 52.25);
        assert_eq!(signature.rounded(1), SessionSignature::new(96.7, 52.2));
    }

    #[test]
    fn test_serde_keeps_one_decimal_place() {
        let signature = SessionSignature::new(104.66666666666667, 48.25);
        let json = serde_json::to_string(&signature).unwrap();
        assert!(json.contains("avgDwell"));

        let restored: SessionSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.rounded(1), signature.rounded(1));
    }
}
