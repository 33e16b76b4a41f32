//! Fixed-point formats and ranges
//!
//! A range is always paired with the format of the value it describes; the
//! format determines the rounding error introduced when the value is
//! produced by a truncating operation.

use serde::{Deserialize, Serialize};

/// Fixed-point format: bit width, fractional bits and signedness.
///
/// Width 0 means "uninitialized": the value has no reduced-precision
/// representation and introduces no rounding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedPointFormat {
    pub width: u32,
    pub frac_bits: u32,
    pub signed: bool,
}

impl FixedPointFormat {
    pub fn new(width: u32, frac_bits: u32, signed: bool) -> Self {
        Self {
            width,
            frac_bits,
            signed,
        }
    }

    /// Signed format
    pub fn signed(width: u32, frac_bits: u32) -> Self {
        Self::new(width, frac_bits, true)
    }

    /// Unsigned format
    pub fn unsigned(width: u32, frac_bits: u32) -> Self {
        Self::new(width, frac_bits, false)
    }

    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn is_uninitialized(&self) -> bool {
        self.width == 0
    }

    /// Rounding error of the format: 2^-frac_bits, 0 when uninitialized
    pub fn rounding_error(&self) -> f64 {
        if self.is_uninitialized() {
            0.0
        } else {
            (-(self.frac_bits as f64)).exp2()
        }
    }

    /// Real value of a raw integer interpreted in this format
    pub fn interpret(&self, raw: i64) -> f64 {
        let raw = if self.signed {
            raw as f64
        } else {
            (raw as u64) as f64
        };
        raw / (self.frac_bits as f64).exp2()
    }

    /// Same width and sign with a different number of fractional bits
    pub fn with_frac_bits(&self, frac_bits: u32) -> Self {
        Self { frac_bits, ..*self }
    }
}

/// Range of a value in the intermediate (real) precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FPInterval {
    pub min: f64,
    pub max: f64,
    pub format: FixedPointFormat,
}

impl FPInterval {
    /// Create an interval, normalizing swapped bounds
    pub fn new(format: FixedPointFormat, min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, format }
    }

    pub fn point(format: FixedPointFormat, value: f64) -> Self {
        Self::new(format, value, value)
    }

    /// Default range entry created when an error is set without a range
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn is_uninitialized(&self) -> bool {
        self.format.is_uninitialized()
    }

    pub fn rounding_error(&self) -> f64 {
        self.format.rounding_error()
    }

    pub fn contains_zero(&self) -> bool {
        self.min <= 0.0 && self.max >= 0.0
    }

    pub fn midpoint(&self) -> f64 {
        self.min + (self.max - self.min) / 2.0
    }

    pub fn radius(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    pub fn max_abs(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }

    /// Smallest hull containing both ranges; keeps this format unless it is uninitialized
    pub fn union(&self, other: &FPInterval) -> FPInterval {
        let format = if self.is_uninitialized() {
            other.format
        } else {
            self.format
        };
        FPInterval {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            format,
        }
    }

    /// Minimum distance between the two ranges, 0 when they overlap
    pub fn min_distance(&self, other: &FPInterval) -> f64 {
        if self.min <= other.max && other.min <= self.max {
            0.0
        } else if self.max < other.min {
            other.min - self.max
        } else {
            self.min - other.max
        }
    }

    /// Range of 1/x for an interval not containing zero
    pub fn reciprocal(&self) -> Option<FPInterval> {
        if self.contains_zero() {
            return None;
        }
        Some(FPInterval::new(self.format, 1.0 / self.max, 1.0 / self.min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_error() {
        assert_eq!(FixedPointFormat::signed(32, 16).rounding_error(), 1.0 / 65536.0);
        assert_eq!(FixedPointFormat::unsigned(8, 0).rounding_error(), 1.0);
        assert_eq!(FixedPointFormat::uninitialized().rounding_error(), 0.0);
    }

    #[test]
    fn test_interpret_raw() {
        let fmt = FixedPointFormat::signed(32, 4);
        assert_eq!(fmt.interpret(32), 2.0);
        assert_eq!(fmt.interpret(-8), -0.5);
    }

    #[test]
    fn test_swapped_bounds_normalized() {
        let r = FPInterval::new(FixedPointFormat::signed(16, 8), 3.0, -1.0);
        assert_eq!(r.min, -1.0);
        assert_eq!(r.max, 3.0);
    }

    #[test]
    fn test_min_distance() {
        let fmt = FixedPointFormat::uninitialized();
        let a = FPInterval::new(fmt, 0.0, 1.0);
        let b = FPInterval::new(fmt, 0.9, 1.0);
        let c = FPInterval::new(fmt, 1.5, 2.0);
        assert_eq!(a.min_distance(&b), 0.0);
        assert_eq!(a.min_distance(&c), 0.5);
        assert_eq!(c.min_distance(&a), 0.5);
    }

    #[test]
    fn test_union_keeps_initialized_format() {
        let fmt = FixedPointFormat::signed(32, 10);
        let a = FPInterval::new(FixedPointFormat::uninitialized(), -1.0, 0.0);
        let b = FPInterval::new(fmt, 2.0, 3.0);
        let u = a.union(&b);
        assert_eq!((u.min, u.max), (-1.0, 3.0));
        assert_eq!(u.format, fmt);
    }

    #[test]
    fn test_reciprocal() {
        let fmt = FixedPointFormat::signed(32, 16);
        let r = FPInterval::new(fmt, 2.0, 4.0).reciprocal().unwrap();
        assert_eq!((r.min, r.max), (0.25, 0.5));
        assert!(FPInterval::new(fmt, -1.0, 1.0).reciprocal().is_none());
    }
}
