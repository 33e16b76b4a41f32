//! Affine forms
//!
//! An affine form `x0 + Σ xi·εi` represents a quantity whose true value lies
//! within `x0 ± Σ|xi|`; every `εi ∈ [-1, 1]` is an independent noise symbol.
//! Errors are tracked as affine forms so that linear operations keep the
//! correlation between errors that stem from the same source.
//!
//! ## Operations
//! - `+` / `-`: exact, termwise
//! - `*` (form × form): exact up to one new term bounding `rad(a)·rad(b)`
//! - [`MonotonicFn::linearize_error`]: first-order linearization of a
//!   function applied to an erroneous value, plus one new term bounding the
//!   linearization error over the interval
//! - [`AffineForm::flatten`]: collapses every term into a single new one

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use super::fixed_point::FPInterval;

/// Identity of one independent noise source
pub type NoiseSymbol = u64;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique noise symbol
pub fn fresh_symbol() -> NoiseSymbol {
    NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed)
}

/// Central value plus noise terms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AffineForm {
    central: f64,
    terms: BTreeMap<NoiseSymbol, f64>,
}

impl AffineForm {
    /// Exact value (no noise terms)
    pub fn constant(central: f64) -> Self {
        Self {
            central,
            terms: BTreeMap::new(),
        }
    }

    /// Zero error
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// `central ± |magnitude|` with one fresh noise symbol
    pub fn with_error(central: f64, magnitude: f64) -> Self {
        let mut form = Self::constant(central);
        form.push_fresh(magnitude);
        form
    }

    /// Affine form spanning a range: midpoint ± radius
    pub fn from_interval(range: &FPInterval) -> Self {
        Self::with_error(range.midpoint(), range.radius())
    }

    pub fn central(&self) -> f64 {
        self.central
    }

    pub fn set_central(&mut self, central: f64) {
        self.central = central;
    }

    pub fn terms(&self) -> impl Iterator<Item = (NoiseSymbol, f64)> + '_ {
        self.terms.iter().map(|(&s, &c)| (s, c))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn coefficient(&self, symbol: NoiseSymbol) -> f64 {
        self.terms.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Sum of absolute noise coefficients: the absolute error bound
    pub fn noise_bound(&self) -> f64 {
        self.terms.values().map(|c| c.abs()).sum()
    }

    /// Collapse every term into a single fresh one
    pub fn flatten(&self) -> Self {
        Self::with_error(self.central, self.noise_bound())
    }

    /// Multiply every component by a scalar
    pub fn scale(&self, k: f64) -> Self {
        if k == 0.0 {
            return Self::zero();
        }
        Self {
            central: self.central * k,
            terms: self.terms.iter().map(|(&s, &c)| (s, c * k)).collect(),
        }
    }

    /// Append a fresh term; zero magnitudes are never synthesized
    fn push_fresh(&mut self, magnitude: f64) {
        let magnitude = magnitude.abs();
        if magnitude > 0.0 {
            self.terms.insert(fresh_symbol(), magnitude);
        }
    }

    fn combine(&self, other: &AffineForm, sign: f64) -> Self {
        let mut terms = self.terms.clone();
        for (&s, &c) in &other.terms {
            let entry = terms.entry(s).or_insert(0.0);
            *entry += sign * c;
            if *entry == 0.0 {
                terms.remove(&s);
            }
        }
        Self {
            central: self.central + sign * other.central,
            terms,
        }
    }
}

impl Add<&AffineForm> for &AffineForm {
    type Output = AffineForm;

    fn add(self, rhs: &AffineForm) -> AffineForm {
        self.combine(rhs, 1.0)
    }
}

impl Add for AffineForm {
    type Output = AffineForm;

    fn add(self, rhs: AffineForm) -> AffineForm {
        &self + &rhs
    }
}

impl Sub<&AffineForm> for &AffineForm {
    type Output = AffineForm;

    fn sub(self, rhs: &AffineForm) -> AffineForm {
        self.combine(rhs, -1.0)
    }
}

impl Sub for AffineForm {
    type Output = AffineForm;

    fn sub(self, rhs: AffineForm) -> AffineForm {
        &self - &rhs
    }
}

impl Neg for &AffineForm {
    type Output = AffineForm;

    fn neg(self) -> AffineForm {
        self.scale(-1.0)
    }
}

impl Mul<f64> for &AffineForm {
    type Output = AffineForm;

    fn mul(self, rhs: f64) -> AffineForm {
        self.scale(rhs)
    }
}

impl Mul<&AffineForm> for &AffineForm {
    type Output = AffineForm;

    /// `(x0 + Σxi·εi)(y0 + Σyi·εi) = x0·y0 + Σ(x0·yi + y0·xi)·εi + q`,
    /// with the quadratic remainder `q` bounded by one new term.
    fn mul(self, rhs: &AffineForm) -> AffineForm {
        let mut terms: BTreeMap<NoiseSymbol, f64> = BTreeMap::new();
        for (&s, &c) in &self.terms {
            *terms.entry(s).or_insert(0.0) += c * rhs.central;
        }
        for (&s, &c) in &rhs.terms {
            *terms.entry(s).or_insert(0.0) += c * self.central;
        }
        terms.retain(|_, c| *c != 0.0);

        let mut product = AffineForm {
            central: self.central * rhs.central,
            terms,
        };
        product.push_fresh(self.noise_bound() * rhs.noise_bound());
        product
    }
}

impl Mul for AffineForm {
    type Output = AffineForm;

    fn mul(self, rhs: AffineForm) -> AffineForm {
        &self * &rhs
    }
}

// ============================================================================
// Monotonic function linearization
// ============================================================================

/// Functions whose error is bounded by linearizing their derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonotonicFn {
    Reciprocal,
    Sqrt,
    Log,
    Exp,
    Asin,
    Acos,
}

impl MonotonicFn {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            MonotonicFn::Reciprocal => 1.0 / x,
            MonotonicFn::Sqrt => x.sqrt(),
            MonotonicFn::Log => x.ln(),
            MonotonicFn::Exp => x.exp(),
            MonotonicFn::Asin => x.asin(),
            MonotonicFn::Acos => x.acos(),
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            MonotonicFn::Reciprocal => -1.0 / (x * x),
            MonotonicFn::Sqrt => 0.5 / x.sqrt(),
            MonotonicFn::Log => 1.0 / x,
            MonotonicFn::Exp => x.exp(),
            MonotonicFn::Asin => 1.0 / (1.0 - x * x).sqrt(),
            MonotonicFn::Acos => -1.0 / (1.0 - x * x).sqrt(),
        }
    }

    /// Whether the derivative is finite and of constant sign over `[lo, hi]`
    fn derivative_defined(&self, lo: f64, hi: f64) -> bool {
        match self {
            MonotonicFn::Reciprocal => lo > 0.0 || hi < 0.0,
            MonotonicFn::Sqrt | MonotonicFn::Log => lo > 0.0,
            MonotonicFn::Exp => hi.is_finite() && lo.is_finite(),
            MonotonicFn::Asin | MonotonicFn::Acos => lo > -1.0 && hi < 1.0,
        }
    }

    /// Bounds of |f'| over `[lo, hi]`: (min, max, signed f' where |f'| is minimal)
    pub fn derivative_bounds(&self, lo: f64, hi: f64) -> Option<(f64, f64, f64)> {
        if !self.derivative_defined(lo, hi) {
            return None;
        }
        let mut candidates = vec![lo, hi];
        // |asin'| and |acos'| reach their minimum at 0
        if matches!(self, MonotonicFn::Asin | MonotonicFn::Acos) && lo < 0.0 && hi > 0.0 {
            candidates.push(0.0);
        }

        let mut min_abs = f64::INFINITY;
        let mut max_abs: f64 = 0.0;
        let mut alpha = 0.0;
        for x in candidates {
            let d = self.derivative(x);
            if !d.is_finite() {
                return None;
            }
            if d.abs() < min_abs {
                min_abs = d.abs();
                alpha = d;
            }
            max_abs = max_abs.max(d.abs());
        }
        Some((min_abs, max_abs, alpha))
    }

    /// Error of `f(x)` given the range of `x` and its error.
    ///
    /// `f(x + e) - f(x) = f'(ξ)·e` with ξ in the range widened by `|e|`;
    /// the result is `α·e` plus a new term `(max|f'| - min|f'|)·|e|`.
    /// Returns `None` when the widened range leaves the function's domain.
    pub fn linearize_error(&self, range: &FPInterval, error: &AffineForm) -> Option<AffineForm> {
        let spread = error.noise_bound();
        let lo = range.min - spread;
        let hi = range.max + spread;
        let (min_abs, max_abs, alpha) = self.derivative_bounds(lo, hi)?;

        let mut result = error.scale(alpha);
        result.set_central(0.0);
        result.push_fresh((max_abs - min_abs) * spread);
        Some(result)
    }

    /// Match a callee name against the supported library functions
    pub fn from_callee_name(name: &str) -> Option<Self> {
        let base = name
            .strip_prefix("llvm.")
            .map(|n| n.split('.').next().unwrap_or(n))
            .unwrap_or(name);
        let base = base.trim_start_matches('_');
        match base {
            "sqrt" | "sqrtf" | "sqrtl" => Some(MonotonicFn::Sqrt),
            "log" | "logf" | "logl" => Some(MonotonicFn::Log),
            "exp" | "expf" | "expl" => Some(MonotonicFn::Exp),
            "asin" | "asinf" | "asinl" => Some(MonotonicFn::Asin),
            "acos" | "acosf" | "acosl" => Some(MonotonicFn::Acos),
            _ => None,
        }
    }

    /// Image of a range (the functions are monotonic on their domain)
    pub fn image(&self, range: &FPInterval) -> Option<FPInterval> {
        if !self.derivative_defined(range.min, range.max) {
            return None;
        }
        let a = self.eval(range.min);
        let b = self.eval(range.max);
        Some(FPInterval::new(range.format, a.min(b), a.max(b)))
    }
}
