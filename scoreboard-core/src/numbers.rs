//! Numeric helpers centralizing rounding and safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 to `places` decimal places, returning 0.0 for non-finite values.
#[must_use]
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let exponent = cast::<u32, i32>(places).unwrap_or(0);
    let scale = 10f64.powi(exponent);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    // Normalize -0.0 so rounded values compare and print like their positive twin.
    (scaled.round() / scale) + 0.0
}

/// Clamp a percentage into [0, 100], returning 0.0 for NaN.
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_requested_places() {
        assert!((round_to_places(87.4999, 1) - 87.5).abs() < f64::EPSILON);
        assert!((round_to_places(143.2249, 2) - 143.22).abs() < f64::EPSILON);
        assert!((round_to_places(2.5, 0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_handles_non_finite_and_negative_zero() {
        assert!((round_to_places(f64::NAN, 2) - 0.0).abs() < f64::EPSILON);
        assert!((round_to_places(f64::INFINITY, 2) - 0.0).abs() < f64::EPSILON);
        let rounded = round_to_places(-0.001, 2);
        assert!(rounded.is_sign_positive());
    }

    #[test]
    fn clamps_percent_range() {
        assert!((clamp_percent(120.0) - 100.0).abs() < f64::EPSILON);
        assert!((clamp_percent(-3.0) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_percent(f64::NAN) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_percent(42.5) - 42.5).abs() < f64::EPSILON);
    }
}
