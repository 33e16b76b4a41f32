//! Custom assertions for test verification

use errorprop_engine::pipeline::ModuleAnalysis;

pub const TOLERANCE: f64 = 1e-12;

/// Assert that an error bound is present and equal to `expected`
pub fn assert_error_close(actual: Option<f64>, expected: f64) {
    let Some(actual) = actual else {
        panic!("Expected error {expected}, got no error data");
    };
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "Expected error {expected}, got {actual}"
    );
}

/// Assert that two computed bounds agree
pub fn assert_same_bound(a: Option<f64>, b: Option<f64>) {
    match (a, b) {
        (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "Bounds differ: {a} vs {b}"),
        _ => panic!("Expected two bounds, got {a:?} and {b:?}"),
    }
}

/// Assert that every entry function was analyzed to completion
pub fn assert_no_failures(analysis: &ModuleAnalysis) {
    assert!(
        analysis.failed.is_empty(),
        "Expected no failed functions, got: {:?}",
        analysis.failed
    );
}
