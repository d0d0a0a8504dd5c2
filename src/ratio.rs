//! Aspect ratio model.
//!
//! An [`AspectRatio`] is a `width / height` value paired with a matching
//! tolerance. Two ratios match when their distance is within the larger of
//! the two tolerances, so a loose rule can absorb a strictly measured file
//! and vice versa:
//!
//! ```text
//! |a.ratio - b.ratio| <= max(a.tolerance, b.tolerance)
//! ```
//!
//! Ratios computed from pixel dimensions carry [`DEFAULT_TOLERANCE`].

use serde::Serialize;
use std::fmt;

/// Tolerance applied to ratios computed from dimensions and to label lookup.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Common fractions used for display labels, tested in this order.
const COMMON_FRACTIONS: &[(u32, u32)] = &[
    (1, 1),
    (4, 3),
    (3, 2),
    (16, 9),
    (21, 9),
    (3, 4),
    (2, 3),
    (9, 16),
    (9, 21),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectRatio {
    ratio: f64,
    tolerance: f64,
}

impl AspectRatio {
    /// Build a ratio with an explicit tolerance.
    ///
    /// Negative or non-finite inputs are clamped to zero so the invariants
    /// `ratio >= 0` and `tolerance >= 0` always hold.
    pub fn new(ratio: f64, tolerance: f64) -> Self {
        Self {
            ratio: non_negative(ratio),
            tolerance: non_negative(tolerance),
        }
    }

    /// A ratio with the default tolerance.
    pub fn exact(ratio: f64) -> Self {
        Self::new(ratio, DEFAULT_TOLERANCE)
    }

    /// The placeholder ratio reported for files whose dimensions are unknown.
    pub fn unknown() -> Self {
        Self::new(0.0, 0.0)
    }

    /// `width / height` with the default tolerance.
    ///
    /// Callers must pass positive dimensions; the engine rejects anything
    /// else before getting here.
    pub fn compute(width: f64, height: f64) -> Self {
        Self::exact(width / height)
    }

    /// Ratio of a `width:height` fraction such as `16:9`.
    pub fn from_fraction(width: u32, height: u32, tolerance: f64) -> Self {
        Self::new(width as f64 / height as f64, tolerance)
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Tolerance-based match using the larger of the two tolerances.
    pub fn matches(&self, other: &AspectRatio) -> bool {
        (self.ratio - other.ratio).abs() <= self.tolerance.max(other.tolerance)
    }

    /// Human-readable label: the first common fraction within
    /// [`DEFAULT_TOLERANCE`], or `"%.3f:1"` when none is close.
    pub fn label(&self) -> String {
        COMMON_FRACTIONS
            .iter()
            .find(|(w, h)| (self.ratio - *w as f64 / *h as f64).abs() <= DEFAULT_TOLERANCE)
            .map(|(w, h)| format!("{w}:{h}"))
            .unwrap_or_else(|| format!("{:.3}:1", self.ratio))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn compute_divides_width_by_height() {
        let ratio = AspectRatio::compute(1920.0, 1080.0);
        assert!(approx(ratio.ratio(), 1920.0 / 1080.0));
        assert!(approx(ratio.tolerance(), DEFAULT_TOLERANCE));
    }

    #[test]
    fn swapped_dimensions_invert_the_ratio() {
        for (w, h) in [(1920.0, 1080.0), (3.0, 7.0), (4000.0, 3000.0), (1.0, 1.0)] {
            let forward = AspectRatio::compute(w, h).ratio();
            let inverse = AspectRatio::compute(h, w).ratio();
            assert!(approx(inverse, 1.0 / forward), "{w}x{h}");
        }
    }

    #[test]
    fn matches_uses_the_larger_tolerance() {
        let strict = AspectRatio::new(1.0, 0.01);
        let loose = AspectRatio::new(1.08, 0.1);
        assert!(strict.matches(&loose));
        assert!(loose.matches(&strict));

        let far = AspectRatio::new(1.2, 0.01);
        assert!(!strict.matches(&far));
    }

    #[test]
    fn matches_is_inclusive_at_the_boundary() {
        let a = AspectRatio::new(1.0, 0.25);
        let b = AspectRatio::new(1.25, 0.0);
        assert!(a.matches(&b));
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let ratio = AspectRatio::new(-2.0, -0.5);
        assert_eq!(ratio.ratio(), 0.0);
        assert_eq!(ratio.tolerance(), 0.0);
        assert_eq!(AspectRatio::new(f64::NAN, 0.1).ratio(), 0.0);
    }

    #[test]
    fn label_uses_common_fractions() {
        assert_eq!(AspectRatio::compute(1000.0, 1000.0).label(), "1:1");
        assert_eq!(AspectRatio::compute(1024.0, 768.0).label(), "4:3");
        assert_eq!(AspectRatio::compute(1080.0, 720.0).label(), "3:2");
        assert_eq!(AspectRatio::compute(1920.0, 1080.0).label(), "16:9");
        assert_eq!(AspectRatio::compute(2560.0, 1080.0).label(), "21:9");
        assert_eq!(AspectRatio::compute(768.0, 1024.0).label(), "3:4");
        assert_eq!(AspectRatio::compute(1080.0, 1920.0).label(), "9:16");
    }

    #[test]
    fn label_falls_back_to_decimal() {
        assert_eq!(AspectRatio::compute(500.0, 100.0).label(), "5.000:1");
        assert_eq!(AspectRatio::unknown().label(), "0.000:1");
    }
}
