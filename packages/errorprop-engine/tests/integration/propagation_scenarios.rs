//! End-to-end propagation scenarios over whole modules
//!
//! Each scenario builds a small host module, runs the module driver and
//! checks the reported bounds.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use errorprop_engine::config::{ErrorPropConfig, ReportMode};
use errorprop_engine::pipeline::ErrorPropagator;
use errorprop_engine::shared::ir::{BinaryOp, InputInfo, Module};
use pretty_assertions::assert_eq;

#[test]
fn scenario_a_add_sums_errors() {
    let (module, f, r) = binary_kernel(BinaryOp::Add, input(0.0, 10.0, 0.1), input(0.0, 10.0, 0.2));
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_error_close(analysis.value_error(f, r), 0.3);
    assert_error_close(analysis.function_error(f), 0.3);
}

#[test]
fn scenario_b_division_without_divisor_error() {
    let divisor = InfoBuilder::new(fixed()).range(1.0, 10.0).build();
    let (module, f, r) = binary_kernel(BinaryOp::SDiv, input(0.0, 10.0, 0.1), divisor);
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_eq!(analysis.value_error(f, r), None);
    assert_eq!(analysis.function_error(f), None);
}

#[test]
fn scenario_c_select_takes_the_larger_error() {
    let (module, f, s) = select_kernel(input(0.0, 1.0, 0.05), input(0.0, 1.0, 0.2));
    let analysis = analyze(&module);

    assert_error_close(analysis.value_error(f, s), 0.2);
}

#[test]
fn select_with_an_unknown_arm_has_no_data() {
    let range_only = InfoBuilder::new(fixed()).range(0.0, 1.0).build();
    let (module, f, s) = select_kernel(input(0.0, 1.0, 0.05), range_only);
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_eq!(analysis.value_error(f, s), None);
    assert_eq!(analysis.function_error(f), None);
}

#[test]
fn phi_skips_incoming_values_without_data() {
    let range_only = InfoBuilder::new(fixed()).range(0.0, 1.0).build();
    let (module, f, m) = branch_merge(input(0.0, 1.0, 0.05), range_only);
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_error_close(analysis.value_error(f, m), 0.1);
    assert_error_close(analysis.function_error(f), 0.1);
}

#[test]
fn scenario_e_overlapping_comparison_flagged() {
    let a = InfoBuilder::new(real()).range(0.0, 1.0).error(0.05).build();
    let b = InfoBuilder::new(real()).range(0.9, 1.0).error(0.001).build();
    let (module, f, c) = compare_kernel(a, b);
    let analysis = analyze(&module);

    let info = analysis.comparison(f, c).expect("comparison checked");
    assert!(info.may_be_wrong);
    assert_eq!(info.tolerance, 0.0);
}

#[test]
fn scenario_e_threshold_silences_the_flag() {
    let a = InfoBuilder::new(real()).range(0.0, 1.0).error(0.05).build();
    let b = InfoBuilder::new(real()).range(0.9, 1.0).error(0.001).build();
    let (module, f, c) = compare_kernel(a, b);
    // relative error ~5.1% stays below a 10% threshold
    let analysis = analyze_with(&module, ErrorPropConfig::default().cmp_error_threshold(10));

    assert!(!analysis.comparison(f, c).expect("comparison checked").may_be_wrong);
}

#[test]
fn separated_comparison_not_flagged() {
    let (module, f, c) = compare_kernel(
        InfoBuilder::new(fixed()).range(0.0, 1.0).error(0.01).build(),
        InfoBuilder::new(fixed()).range(2.0, 3.0).error(0.01).build(),
    );
    let analysis = analyze(&module);

    let info = analysis.comparison(f, c).expect("comparison checked");
    assert!(!info.may_be_wrong);
    assert_eq!(info.tolerance, 1.0);
}

#[test]
fn json_module_produces_relative_report() {
    let (mut module, f, r) = binary_kernel(BinaryOp::Add, input(0.0, 10.0, 0.1), input(0.0, 10.0, 0.2));
    let inst = r.as_inst().unwrap();
    module.functions[f.index()].insts[inst.index()].info = Some(InputInfo::new(fixed(), 0.0, 20.0).into());
    let json = module.to_json().unwrap();
    assert_eq!(Module::from_json(&json).unwrap().functions.len(), 1);

    let config = ErrorPropConfig::default().report_mode(ReportMode::Relative);
    let report = ErrorPropagator::new(config).unwrap().run_json(&json).unwrap();

    let entry = report.instructions.iter().find(|e| e.name == "r").expect("r reported");
    assert_eq!(entry.inst, inst.0);
    assert!((entry.error - 0.3 / 20.0).abs() < 1e-12);
    assert_eq!(report.mode, ReportMode::Relative);
    assert_eq!(report.wrong_comparisons().count(), 0);
}

#[test]
fn malformed_module_rejected() {
    let (mut module, f, _) = binary_kernel(BinaryOp::Add, input(0.0, 1.0, 0.1), input(0.0, 1.0, 0.1));
    module.functions[f.index()].blocks[0].insts.push(errorprop_engine::shared::ir::InstId(99));
    assert!(ErrorPropagator::default().run(&module).is_err());
}
