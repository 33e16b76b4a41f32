//! Property-based tests for the numeric models
//!
//! Invariants that should hold for ALL inputs:
//! - Addition/subtraction are exact: no synthesized terms, triangle inequality
//! - Multiplying by the exact identity keeps the error bound
//! - Linearizing over a point range adds nothing
//! - Interval union and separation are consistent

use errorprop_engine::features::propagation::{propagate_add, propagate_div, propagate_mul};
use errorprop_engine::shared::models::{AffineForm, FPInterval, FixedPointFormat, MonotonicFn};
use proptest::prelude::*;

fn fmt() -> FixedPointFormat {
    FixedPointFormat::signed(32, 16)
}

/// Two forms sharing one noise symbol (b = k·a + independent part)
fn correlated_pair() -> impl Strategy<Value = (AffineForm, AffineForm)> {
    (-10.0..10.0f64, 0.0..1.0f64, -2.0..2.0f64, -10.0..10.0f64, 0.0..1.0f64).prop_map(|(c1, m1, k, c2, m2)| {
        let a = AffineForm::with_error(c1, m1);
        let b = &a.scale(k) + &AffineForm::with_error(c2, m2);
        (a, b)
    })
}

fn interval() -> impl Strategy<Value = FPInterval> {
    (-100.0..100.0f64, -100.0..100.0f64).prop_map(|(a, b)| FPInterval::new(fmt(), a, b))
}

// ============================================================================
// AffineForm
// ============================================================================

proptest! {
    #[test]
    fn prop_add_triangle_inequality((a, b) in correlated_pair()) {
        let sum = &a + &b;
        prop_assert!(sum.noise_bound() <= a.noise_bound() + b.noise_bound() + 1e-12);
        prop_assert!(sum.term_count() <= a.term_count() + b.term_count());
    }

    #[test]
    fn prop_sub_is_exact((a, b) in correlated_pair()) {
        let diff = &a - &b;
        prop_assert!(diff.noise_bound() <= a.noise_bound() + b.noise_bound() + 1e-12);
        prop_assert!((diff.central() - (a.central() - b.central())).abs() < 1e-9);
        prop_assert_eq!((&a - &a).noise_bound(), 0.0);
    }

    #[test]
    fn prop_noise_bound_never_negative((a, b) in correlated_pair(), k in -5.0..5.0f64) {
        prop_assert!(a.noise_bound() >= 0.0);
        prop_assert!((&a - &b).scale(k).noise_bound() >= 0.0);
        prop_assert!((a.flatten().noise_bound() - a.noise_bound()).abs() < 1e-12);
    }

    #[test]
    fn prop_identity_product_keeps_bound(c in -10.0..10.0f64, m in 0.0..1.0f64) {
        let a = AffineForm::with_error(c, m);
        let product = &a * &AffineForm::constant(1.0);
        prop_assert_eq!(product.noise_bound(), a.noise_bound());
        prop_assert_eq!(product.term_count(), a.term_count());
    }

    #[test]
    fn prop_add_rule_matches_operator((a, b) in correlated_pair()) {
        prop_assert_eq!(propagate_add(&a, &b), &a + &b);
    }

    #[test]
    fn prop_mul_by_exact_point_scales(e in 0.0..0.5f64, x in interval(), y in 0.5..8.0f64) {
        let err = AffineForm::with_error(0.0, e);
        let point = FPInterval::point(fmt(), y);
        let product = propagate_mul(&x, &err, &point, &AffineForm::zero());
        prop_assert!((product.noise_bound() - e * y).abs() < 1e-9);
    }

    #[test]
    fn prop_div_by_exact_point_scales(e in 0.0..0.5f64, x in interval(), y in 0.5..8.0f64) {
        let err = AffineForm::with_error(0.0, e);
        let point = FPInterval::point(fmt(), y);
        let quotient = propagate_div(&x, &err, &point, &AffineForm::zero()).unwrap();
        prop_assert!((quotient.noise_bound() - e / y).abs() < 1e-9);
    }

    #[test]
    fn prop_point_reciprocal_adds_no_term(y in 0.1..100.0f64) {
        let point = FPInterval::point(fmt(), y);
        let linearized = MonotonicFn::Reciprocal.linearize_error(&point, &AffineForm::zero()).unwrap();
        prop_assert_eq!(linearized.noise_bound(), 0.0);
        prop_assert_eq!(linearized.term_count(), 0);
    }
}

// ============================================================================
// FPInterval
// ============================================================================

proptest! {
    #[test]
    fn prop_interval_bounds_ordered(r in interval()) {
        prop_assert!(r.min <= r.max);
        prop_assert!(r.radius() >= 0.0);
        prop_assert!(r.max_abs() >= r.midpoint().abs());
    }

    #[test]
    fn prop_union_contains_both(a in interval(), b in interval()) {
        let u = a.union(&b);
        prop_assert!(u.min <= a.min && u.min <= b.min);
        prop_assert!(u.max >= a.max && u.max >= b.max);
        prop_assert_eq!(u.min_distance(&a), 0.0);
    }

    #[test]
    fn prop_min_distance_symmetric(a in interval(), b in interval()) {
        prop_assert_eq!(a.min_distance(&b), b.min_distance(&a));
        prop_assert!(a.min_distance(&b) >= 0.0);
    }
}
