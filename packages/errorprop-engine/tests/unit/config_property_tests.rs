//! Property-based tests for the engine configuration
//!
//! Invariants that should hold for ALL possible inputs:
//! - Validity: every in-range config validates, every out-of-range one fails
//! - Roundtrip: from_yaml_str(to_yaml(x)) == x
//! - Unroll count: always within 1..=hint/trip/default, 1 when disabled

use errorprop_engine::config::{ErrorPropConfig, ReportMode, MAX_RECURSION_BOUND, MAX_UNROLL_COUNT};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// QuickCheck Tests (simpler, faster)
// ============================================================================

#[quickcheck]
fn qc_in_range_config_validates(unroll: u32, threshold: u32, recursion: u32) -> TestResult {
    if unroll == 0 || unroll > MAX_UNROLL_COUNT || threshold > 100 || recursion == 0 || recursion > MAX_RECURSION_BOUND {
        return TestResult::discard();
    }
    let config = ErrorPropConfig::default()
        .default_unroll_count(unroll)
        .cmp_error_threshold(threshold)
        .default_max_recursion(recursion);
    TestResult::from_bool(config.validate().is_ok())
}

#[quickcheck]
fn qc_threshold_above_percentage_rejected(threshold: u32) -> TestResult {
    if threshold <= 100 {
        return TestResult::discard();
    }
    let config = ErrorPropConfig::default().cmp_error_threshold(threshold);
    TestResult::from_bool(config.validate().is_err())
}

#[quickcheck]
fn qc_disabled_unrolling_is_single_pass(hint: Option<u32>, trip: Option<u32>) -> bool {
    let config = ErrorPropConfig::default().no_loop_unroll(true);
    config.unroll_count(hint, trip) == 1
}

// ============================================================================
// Proptest (more control over generation)
// ============================================================================

fn valid_config() -> impl Strategy<Value = ErrorPropConfig> {
    (
        1..=MAX_UNROLL_COUNT,
        0u32..=100,
        1..=MAX_RECURSION_BOUND,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(unroll, threshold, recursion, flagged, relative, lipschitz)| {
            ErrorPropConfig::default()
                .default_unroll_count(unroll)
                .cmp_error_threshold(threshold)
                .default_max_recursion(recursion)
                .propagate_only_flagged(flagged)
                .report_mode(if relative { ReportMode::Relative } else { ReportMode::Absolute })
                .lipschitz_loops(lipschitz)
        })
}

proptest! {
    #[test]
    fn prop_yaml_roundtrip(config in valid_config()) {
        let yaml = config.to_yaml().unwrap();
        let parsed = ErrorPropConfig::from_yaml_str(&yaml).unwrap();
        prop_assert_eq!(parsed, config);
    }

    #[test]
    fn prop_unroll_count_bounded(
        default in 1..=MAX_UNROLL_COUNT,
        hint in proptest::option::of(1u32..64),
        trip in proptest::option::of(0u32..5000),
    ) {
        let config = ErrorPropConfig::default().default_unroll_count(default);
        let count = config.unroll_count(hint, trip);
        prop_assert!(count >= 1);
        if let Some(h) = hint {
            prop_assert!(count <= h);
        }
        if let (None, Some(t)) = (hint, trip.filter(|&t| t != 0)) {
            prop_assert_eq!(count, t.min(MAX_UNROLL_COUNT));
        }
        if hint.is_none() && trip.map_or(true, |t| t == 0) {
            prop_assert_eq!(count, default);
        }
    }

    #[test]
    fn prop_zero_recursion_never_valid(unroll in 1..=MAX_UNROLL_COUNT) {
        let config = ErrorPropConfig::default()
            .default_unroll_count(unroll)
            .default_max_recursion(0);
        prop_assert!(config.validate().is_err());
    }
}

// ============================================================================
// YAML files
// ============================================================================

#[test]
fn test_yaml_file_with_partial_settings() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "version: 1\nerrorprop:\n  default_unroll_count: 8\n  report_mode: relative\n"
    )
    .unwrap();

    let config = ErrorPropConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.default_unroll_count, 8);
    assert_eq!(config.report_mode, ReportMode::Relative);
    assert_eq!(config.default_max_recursion, 1);
    assert!(config.lipschitz_loops);
}

#[test]
fn test_yaml_file_out_of_range_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "version: 1\nerrorprop:\n  cmp_error_threshold: 250\n").unwrap();

    let err = ErrorPropConfig::from_yaml_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("cmp_error_threshold"));
}
