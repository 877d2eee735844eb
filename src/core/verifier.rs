//! Nearest-profile verification.
//!
//! An incoming signature is scored against every enrolled profile with the
//! Manhattan distance over (dwell, flight). The claimed identity is verified
//! when its profile is the single closest one.
//!
//! Distances are computed with [`Decimal`] so that both axis terms add up
//! exactly and ties compare equal. Profiles at equal distance keep the order in
//! which the store listed them.

use crate::core::numeric::to_decimal;
use crate::core::signature::SessionSignature;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of matches reported in the verification matrix.
pub const DEFAULT_TOP_N: usize = 5;

/// Decimal places of the reported score.
const SCORE_DP: u32 = 2;

/// Decimal places of the reported confidence and input signature.
const DISPLAY_DP: u32 = 1;

/// A user's profile signature as listed by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAggregate {
    pub user_id: String,
    /// `None` when the user has no qualifying keystroke data
    pub avg_dwell: Option<f64>,
    pub avg_flight: Option<f64>,
}

impl ProfileAggregate {
    pub fn new(user_id: impl Into<String>, avg_dwell: Option<f64>, avg_flight: Option<f64>) -> Self {
        Self {
            user_id: user_id.into(),
            avg_dwell,
            avg_flight,
        }
    }
}

/// One row of the verification matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMatch {
    pub user_id: String,
    /// Manhattan distance to the input, rounded to two places
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    /// `max(0, 100 - distance)`, rounded to one place
    #[serde(with = "rust_decimal::serde::float")]
    pub confidence: Decimal,
    /// Whether this row is the claimed user
    pub is_match: bool,
}

/// Input signature as shown back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputStats {
    pub dwell: f64,
    pub flight: f64,
}

/// Result of verifying a typing sample against all enrolled profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub claimed_user: String,
    pub input_stats: InputStats,
    /// Best matches first, at most `top_n` rows
    pub matrix: Vec<VerificationMatch>,
    pub verified: bool,
}

impl VerificationResult {
    /// The closest profile, if any qualified.
    pub fn best_match(&self) -> Option<&VerificationMatch> {
        self.matrix.first()
    }
}

/// A profile together with its exact distance to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedProfile {
    pub user_id: String,
    pub distance: Decimal,
}

impl RankedProfile {
    pub fn confidence(&self) -> Decimal {
        (Decimal::ONE_HUNDRED - self.distance).max(Decimal::ZERO)
    }
}

/// Ranks signatures against enrolled profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verifier {
    top_n: usize,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl Verifier {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank every qualifying profile by distance to `input`, closest first.
    ///
    /// Profiles with a missing or non-finite average are skipped. The sort is
    /// stable, so equal distances keep their enumeration order.
    pub fn rank(&self, input: &SessionSignature, profiles: &[ProfileAggregate]) -> Vec<RankedProfile> {
        let (Some(in_dwell), Some(in_flight)) =
            (to_decimal(input.avg_dwell), to_decimal(input.avg_flight))
        else {
            return Vec::new();
        };

        let mut ranked: Vec<RankedProfile> = profiles
            .iter()
            .filter_map(|profile| {
                let dwell = profile.avg_dwell.and_then(to_decimal)?;
                let flight = profile.avg_flight.and_then(to_decimal)?;
                Some(RankedProfile {
                    user_id: profile.user_id.clone(),
                    distance: (in_dwell - dwell).abs() + (in_flight - flight).abs(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| a.distance.cmp(&b.distance));
        ranked
    }

    /// Verify that `input` was typed by `claimed_user_id`.
    ///
    /// Verification succeeds only when the closest profile of the full ranking
    /// belongs to the claimed user; the matrix is just the top slice of it.
    pub fn verify(
        &self,
        input: &SessionSignature,
        claimed_user_id: &str,
        profiles: &[ProfileAggregate],
    ) -> VerificationResult {
        let ranked = self.rank(input, profiles);

        let verified = ranked
            .first()
            .is_some_and(|best| best.user_id == claimed_user_id);

        let matrix = ranked
            .iter()
            .take(self.top_n)
            .map(|r| VerificationMatch {
                user_id: r.user_id.clone(),
                score: r.distance.round_dp(SCORE_DP),
                confidence: r.confidence().round_dp(DISPLAY_DP),
                is_match: r.user_id == claimed_user_id,
            })
            .collect();

        let shown = input.rounded(DISPLAY_DP);

        VerificationResult {
            claimed_user: claimed_user_id.to_string(),
            input_stats: InputStats {
                dwell: shown.avg_dwell,
                flight: shown.avg_flight,
            },
            matrix,
            verified,
        }
    }
}
