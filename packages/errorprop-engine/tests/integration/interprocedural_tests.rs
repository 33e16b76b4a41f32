//! Interprocedural propagation: recursion bounds, argument binding and
//! merge-back through pointer arguments

#[path = "../common/mod.rs"]
mod common;

use common::*;
use errorprop_engine::config::ErrorPropConfig;
use errorprop_engine::shared::ir::{BinaryOp, Callee, ModuleBuilder, Type, ValueInfo};
use pretty_assertions::assert_eq;

#[test]
fn recursion_stops_at_annotated_bound() {
    let (module, f) = self_recursive(Some(2));
    let analysis = analyze(&module);
    let summary = analysis.summary(f).expect("summary");

    assert_eq!(summary.peak_recursion, 2);
    assert_eq!(summary.activations, 2);
    assert_eq!(summary.skipped_calls, 1);
    assert_eq!(summary.recursion, 0);
    // y doubles the argument error once per activation: 0.01 -> 0.02 -> 0.04
    assert_error_close(analysis.function_error(f), 0.04);
}

#[test]
fn recursion_uses_configured_default() {
    let (module, f) = self_recursive(None);

    let single = analyze(&module);
    assert_eq!(single.summary(f).unwrap().peak_recursion, 1);
    assert_error_close(single.function_error(f), 0.02);

    let deeper = analyze_with(&module, ErrorPropConfig::default().default_max_recursion(3));
    let summary = deeper.summary(f).unwrap();
    assert_eq!(summary.peak_recursion, 3);
    assert!(summary.peak_recursion <= 3);
    assert_error_close(deeper.function_error(f), 0.08);
}

#[test]
fn pointer_argument_error_merged_back() {
    let fixture = pointer_writer(0.3);
    let analysis = analyze(&fixture.module);

    assert_no_failures(&analysis);
    assert_error_close(analysis.value_error(fixture.caller, fixture.reload), 0.3);
    assert_error_close(analysis.function_error(fixture.caller), 0.3);
    // once as an entry of its own, once for the call site
    assert_eq!(analysis.summary(fixture.callee).unwrap().activations, 2);
}

#[test]
fn callee_arguments_take_actual_errors() {
    let mut mb = ModuleBuilder::new("args");
    let mut sq = mb.function("twice", Type::Int(32));
    let v = sq.param_with_info("v", Type::Int(32), InfoBuilder::new(fixed()).range(0.0, 4.0).build());
    let w = sq.binary(BinaryOp::Add, "w", Type::Int(32), v, v);
    sq.ret(Some(w));
    let callee = mb.define(sq);

    let mut main = mb.function("main", Type::Int(32));
    let a = main.param_with_info("a", Type::Int(32), input(0.0, 4.0, 0.125));
    let r = main.call("r", Type::Int(32), Callee::Direct(callee), vec![a]);
    main.ret(Some(r));
    let caller = mb.define(main);
    let module = mb.finish();

    let analysis = analyze(&module);
    assert_error_close(analysis.function_error(callee), 0.25);
    assert_error_close(analysis.value_error(caller, r), 0.25);
}

#[test]
fn malformed_callee_does_not_stop_the_caller() {
    let mut mb = ModuleBuilder::new("partial");
    let mut bad = mb.function("bad", Type::Void);
    let slot = bad.alloca("slot", Type::Int(32));
    bad.annotate(slot, ValueInfo::Struct(vec![]));
    bad.ret(None);
    let bad_id = mb.define(bad);

    let mut main = mb.function("main", Type::Int(32));
    let a = main.param_with_info("a", Type::Int(32), input(0.0, 1.0, 0.1));
    main.call("", Type::Void, Callee::Direct(bad_id), vec![]);
    let b = main.binary(BinaryOp::Add, "b", Type::Int(32), a, a);
    main.ret(Some(b));
    let main_id = mb.define(main);
    let module = mb.finish();

    let analysis = analyze(&module);
    assert_eq!(analysis.analyzed, vec![main_id]);
    assert_eq!(analysis.failed.len(), 1);
    assert_eq!(analysis.failed[0].0, bad_id);
    assert_error_close(analysis.value_error(main_id, b), 0.2);
}
