//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Round a f32 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f32_to_i32(value: f32) -> i32 {
    round_f64_to_i32(f64::from(value))
}

/// Replace non-finite values with zero so they can never poison a bounded field.
#[must_use]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Rounded percentage `100 * part / whole`, clamped to `0..=100`.
///
/// Returns `None` when `whole` is zero so the caller decides what an empty
/// denominator means.
#[must_use]
pub fn rounded_percent(part: u32, whole: u32) -> Option<f32> {
    if whole == 0 {
        return None;
    }
    let ratio = f64::from(part) * 100.0 / f64::from(whole);
    let rounded = round_f64_to_i32(ratio).clamp(0, 100);
    cast::<i32, f32>(rounded)
}
