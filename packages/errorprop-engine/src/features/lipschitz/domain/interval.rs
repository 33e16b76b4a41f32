//! Plain real intervals for derivative bounds

use crate::shared::models::FPInterval;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self {
            lo: lo.min(hi),
            hi: lo.max(hi),
        }
    }

    pub fn point(v: f64) -> Self {
        Self { lo: v, hi: v }
    }

    pub fn contains_zero(&self) -> bool {
        self.lo <= 0.0 && self.hi >= 0.0
    }

    pub fn max_abs(&self) -> f64 {
        self.lo.abs().max(self.hi.abs())
    }

    pub fn add(self, o: Interval) -> Interval {
        Interval::new(self.lo + o.lo, self.hi + o.hi)
    }

    pub fn sub(self, o: Interval) -> Interval {
        Interval::new(self.lo - o.hi, self.hi - o.lo)
    }

    pub fn mul(self, o: Interval) -> Interval {
        let products = [self.lo * o.lo, self.lo * o.hi, self.hi * o.lo, self.hi * o.hi];
        let lo = products.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval::new(lo, hi)
    }

    /// `None` when the divisor contains zero
    pub fn div(self, o: Interval) -> Option<Interval> {
        if o.contains_zero() {
            return None;
        }
        Some(self.mul(Interval::new(1.0 / o.hi, 1.0 / o.lo)))
    }
}

impl From<&FPInterval> for Interval {
    fn from(r: &FPInterval) -> Self {
        Interval::new(r.min, r.max)
    }
}
