/*!
# WarpClip: Numeric Utilities

Small floating-point helpers shared by the warp map and the clip
orchestrator. All inter-marker time comparisons in this crate go through
[`almost_equal`] with [`TIME_RELATIVE_TOLERANCE`]/[`TIME_ABSOLUTE_TOLERANCE`],
never a bare `==`.
*/

use crate::SR0;



/// # Time Comparison Tolerance.
///
/// Used as both the relative and absolute tolerance for every marker-time
/// comparison in the crate: `1.0 / (SR0 * 10)`, roughly 2.27 microseconds at
/// the default sample rate.
pub const TIME_TOLERANCE: f64 = 1.0 / (SR0 as f64 * 10.0);

/// # Relative Time Tolerance.
pub const TIME_RELATIVE_TOLERANCE: f64 = TIME_TOLERANCE;

/// # Absolute Time Tolerance.
pub const TIME_ABSOLUTE_TOLERANCE: f64 = TIME_TOLERANCE;



#[must_use]
/// # Almost Equal (With Tolerance).
///
/// Returns `true` if `a` and `b` are within `abs_tol` of each other, or, if
/// not, within `rel_tol` of each other relative to whichever of the two has
/// the larger magnitude.
///
/// The absolute check always runs first; it is what keeps this usable for
/// values near zero, where a relative comparison alone would be meaningless.
pub fn almost_equal(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> bool {
	let diff = (a - b).abs();
	if diff < abs_tol { return true; }

	let denom = if a.abs() > b.abs() { a.abs() } else { b.abs() };
	if denom == 0.0 { return false; }

	diff / denom < rel_tol
}

#[must_use]
/// # Linear Map.
///
/// Remaps `value` from `[lo1, hi1]` to `[lo2, hi2]`.
///
/// If `hi1 == lo1` the source range is degenerate and `0.0` is returned as a
/// sentinel; callers (the warp map's time conversions) rely on this rather
/// than treating it as an error.
pub fn linear_map(value: f64, lo1: f64, hi1: f64, lo2: f64, hi2: f64) -> f64 {
	let divisor = hi1 - lo1;
	if divisor == 0.0 { return 0.0; }

	lo2 + (value - lo1) * (hi2 - lo2) / divisor
}

#[must_use]
/// # Round (Half Away From Zero, Clamped).
///
/// Rounds `value` to the nearest integer, ties rounding away from zero for
/// positive inputs (matching the source's "round half up"), and clamps the
/// result to the range of `i64`.
pub fn round(value: f64) -> i64 {
	if value < i64::MIN as f64 - 0.5 { return i64::MIN; }
	if value > i64::MAX as f64 { return i64::MAX; }

	if value - value.floor() < 0.5 { value.floor() as i64 }
	else { value.ceil() as i64 }
}

#[must_use]
/// # Is Valid Time?
///
/// A time value is valid if it is finite (not `±∞`, not `NaN`) and is not
/// the smallest positive subnormal `f64`. Zero is valid.
pub fn is_valid_time(value: f64) -> bool {
	const DENORM_MIN: f64 = f64::from_bits(1);
	value.is_finite() && value != DENORM_MIN && value != -DENORM_MIN
}
