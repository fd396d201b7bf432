use crate::tensor::NumericPrecision;

/// Maximum allowed deviation between reference and backend values.
///
/// A value passes when its deviation is within `abs` or within `rel * |expected|`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToleranceSpec {
    pub abs: f64,
    pub rel: f64,
}

impl ToleranceSpec {
    pub const EXACT: ToleranceSpec = ToleranceSpec { abs: 0.0, rel: 0.0 };

    pub fn new(abs: f64, rel: f64) -> Self {
        Self { abs, rel }
    }

    pub fn for_precision(precision: NumericPrecision) -> Self {
        match precision {
            NumericPrecision::FP32 => Self::new(1e-5, 1e-5),
            NumericPrecision::FP16 => Self::new(1e-3, 1e-2),
            NumericPrecision::BF16 => Self::new(1e-2, 4e-2),
            NumericPrecision::I16 | NumericPrecision::I32 => Self::EXACT,
        }
    }

    /// Absolute deviation. Matching NaNs and equal infinities deviate by 0, any other
    /// NaN or infinity by infinity.
    pub fn deviation(expected: f64, actual: f64) -> f64 {
        if expected == actual || (expected.is_nan() && actual.is_nan()) {
            return 0.0;
        }
        let diff = (expected - actual).abs();
        if diff.is_nan() { f64::INFINITY } else { diff }
    }

    pub fn allows(&self, expected: f64, actual: f64) -> bool {
        let dev = Self::deviation(expected, actual);
        dev <= self.abs || dev <= self.rel * expected.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_must_match_exactly() {
        let t = ToleranceSpec::for_precision(NumericPrecision::I32);
        assert!(t.allows(7.0, 7.0));
        assert!(!t.allows(7.0, 8.0));
    }

    #[test]
    fn absolute_or_relative_bound() {
        let t = ToleranceSpec::new(1e-3, 1e-2);
        assert!(t.allows(0.0, 0.0005));
        assert!(t.allows(100.0, 100.9));
        assert!(!t.allows(100.0, 101.5));
    }

    #[test]
    fn nan_only_matches_nan() {
        let t = ToleranceSpec::for_precision(NumericPrecision::FP32);
        assert!(t.allows(f64::NAN, f64::NAN));
        assert!(!t.allows(1.0, f64::NAN));
        assert!(!t.allows(f64::NAN, 1.0));
        assert!(t.allows(f64::INFINITY, f64::INFINITY));
        assert!(!t.allows(f64::INFINITY, f64::NEG_INFINITY));
    }
}
