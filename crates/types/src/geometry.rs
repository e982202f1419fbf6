//! Strict (fixed-point) geometry.
//!
//! Every position and size that enters the traversal or layout path is held as
//! an `i64` count of micro-points (1/100000 of a point). Conversions from
//! floating point happen exactly once, at the boundary, so that repeated
//! passes over the same report derive bit-identical values.

use serde::{Deserialize, Serialize};

/// Micro-points per point.
const CORRECTION_FACTOR: f64 = 100_000.0;

/// Precision of the first rounding step (four decimal digits).
const INTERMEDIATE_FACTOR: f64 = 10_000.0;

/// Sentinel used for "automatic" sizes, `0x80000000000` points in micro-points.
pub const MAX_AUTO: i64 = 879_609_302_220_800_000;

/// Converts a point value into micro-points.
///
/// The value is first rounded to four decimal digits and then rescaled and
/// rounded again. This is not the same as a single `round(value * 100000)`.
pub fn to_internal(value: f64) -> i64 {
    let rounded = (value * INTERMEDIATE_FACTOR).round();
    (rounded * CORRECTION_FACTOR / INTERMEDIATE_FACTOR).round() as i64
}

/// Converts micro-points back into points.
pub fn to_external(value: i64) -> f64 {
    value as f64 / CORRECTION_FACTOR
}

/// Multiplies two micro-point values, returning micro-points.
///
/// The larger operand is scaled down before the product is taken so that the
/// intermediate result cannot overflow. Operand selection compares the signed
/// values.
pub fn multiply(x: i64, y: i64) -> i64 {
    if x < y {
        return (x as f64 * (y as f64 / CORRECTION_FACTOR)) as i64;
    }
    (y as f64 * (x as f64 / CORRECTION_FACTOR)) as i64
}

/// Converts micro-points into font-metrics units (1/1000 of a point).
pub fn to_font_metrics(value: i64) -> f64 {
    value as f64 * 1000.0 / CORRECTION_FACTOR
}

/// Converts font-metrics units (1/1000 of a point) into micro-points.
pub fn from_font_metrics(value: i64) -> i64 {
    to_internal(value as f64 / 1000.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrictPoint {
    pub x: i64,
    pub y: i64,
}

impl StrictPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn from_points(x: f64, y: f64) -> Self {
        Self::new(to_internal(x), to_internal(y))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrictDimension {
    pub width: i64,
    pub height: i64,
}

impl StrictDimension {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn from_points(width: f64, height: f64) -> Self {
        Self::new(to_internal(width), to_internal(height))
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrictBounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl StrictBounds {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_points(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            to_internal(x),
            to_internal(y),
            to_internal(width),
            to_internal(height),
        )
    }

    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    pub fn origin(&self) -> StrictPoint {
        StrictPoint::new(self.x, self.y)
    }

    pub fn size(&self) -> StrictDimension {
        StrictDimension::new(self.width, self.height)
    }

    /// Returns `true` if `other` lies completely inside these bounds.
    pub fn contains(&self, other: &StrictBounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the external (point based) representation as `(x, y, width, height)`.
    pub fn to_points(&self) -> (f64, f64, f64, f64) {
        (
            to_external(self.x),
            to_external(self.y),
            to_external(self.width),
            to_external(self.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_internal_scales_points() {
        assert_eq!(to_internal(1.0), 100_000);
        assert_eq!(to_internal(0.5), 50_000);
        assert_eq!(to_internal(-2.25), -225_000);
        assert_eq!(to_internal(0.0), 0);
    }

    #[test]
    fn test_to_internal_rounds_to_four_decimals_first() {
        // The fifth decimal digit is dropped by the first rounding step.
        assert_eq!(to_internal(1.00004), 100_000);
        assert_eq!(to_internal(1.00005), 100_010);
        assert_eq!(to_internal(-1.00005), -100_010);
    }

    #[test]
    fn test_round_trip_stays_within_rounding_step() {
        for i in -2000..2000 {
            let v = i as f64 * 0.123_457;
            let back = to_external(to_internal(v));
            assert!((back - v).abs() <= 0.000_05 + 1e-12, "value {v} came back as {back}");
        }
    }

    #[test]
    fn test_to_internal_is_idempotent() {
        for i in -5000..5000 {
            let v = i as f64 * 0.0731;
            let once = to_internal(v);
            assert_eq!(to_internal(to_external(once)), once);
        }
    }

    #[test]
    fn test_repeated_conversion_is_deterministic() {
        let values = [12.345678, 595.275, 841.889_764, 0.000_01];
        let first: Vec<i64> = values.iter().map(|v| to_internal(*v)).collect();
        let second: Vec<i64> = values.iter().map(|v| to_internal(*v)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multiply_scales_larger_operand() {
        assert_eq!(multiply(to_internal(2.0), to_internal(3.0)), to_internal(6.0));
        assert_eq!(multiply(to_internal(3.0), to_internal(2.0)), to_internal(6.0));
        assert_eq!(multiply(to_internal(-1.5), to_internal(2.0)), to_internal(-3.0));
    }

    #[test]
    fn test_multiply_does_not_overflow_large_values() {
        let big = to_internal(1_000_000.0);
        assert_eq!(multiply(big, big), to_internal(1_000_000_000_000.0));
    }

    #[test]
    fn test_multiply_operand_selection_is_signed() {
        // x < y: y is scaled, so the product is x * (y / 1e5) truncated.
        let x = -7;
        let y = 3;
        assert_eq!(multiply(x, y), (x as f64 * (y as f64 / 100_000.0)) as i64);
        assert_eq!(multiply(y, x), multiply(x, y));
    }

    #[test]
    fn test_max_auto_matches_conversion() {
        assert_eq!(MAX_AUTO, to_internal(0x800_0000_0000_i64 as f64));
    }

    #[test]
    fn test_font_metrics_conversion() {
        assert_eq!(to_font_metrics(to_internal(12.0)), 12_000.0);
        assert_eq!(from_font_metrics(12_000), to_internal(12.0));
    }

    #[test]
    fn test_font_metrics_of_max_auto() {
        // 0x80000000000 points in thousandths of a point.
        assert_eq!(to_font_metrics(MAX_AUTO), 8_796_093_022_208_000.0);
        assert_eq!(to_font_metrics(-MAX_AUTO), -8_796_093_022_208_000.0);
    }

    #[test]
    fn test_bounds_helpers() {
        let outer = StrictBounds::from_points(0.0, 0.0, 100.0, 200.0);
        let inner = StrictBounds::from_points(10.0, 10.0, 50.0, 50.0);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert_eq!(outer.bottom(), to_internal(200.0));
        assert_eq!(inner.size(), StrictDimension::from_points(50.0, 50.0));
        assert_eq!(inner.to_points(), (10.0, 10.0, 50.0, 50.0));
    }
}
