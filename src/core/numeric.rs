//! Small numeric helpers shared by the aggregator and the verifier.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Arithmetic mean of integer samples, `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = i64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0i128, 0u64), |(sum, count), v| (sum + v as i128, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Convert a float into an exact decimal, keeping every bit the float carries.
///
/// Returns `None` for NaN and infinities.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64_retain(value).or_else(|| Decimal::from_f64(value))
}

/// Round a float to `dp` decimal places, half-to-even on its exact value.
pub fn round_f64(value: f64, dp: u32) -> f64 {
    to_decimal(value)
        .and_then(|d| d.round_dp(dp).to_f64())
        .unwrap_or(value)
}
