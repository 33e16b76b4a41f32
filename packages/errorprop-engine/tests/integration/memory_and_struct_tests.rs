//! Loads resolved through memory states and aggregate field trees

#[path = "../common/mod.rs"]
mod common;

use common::*;
use errorprop_engine::features::memory_deps::{MemoryDependenceResolver, MemorySsa};
use errorprop_engine::features::range_store::RangeErrorStore;
use errorprop_engine::shared::ir::{BinaryOp, InputInfo, InstKind, ModuleBuilder, Type, Value, ValueKey};
use errorprop_engine::shared::models::{AffineForm, FPInterval, RangeError};
use pretty_assertions::assert_eq;

fn joined_range() -> InputInfo {
    InputInfo::new(fixed(), 0.0, 1.0)
}

#[test]
fn load_after_branches_takes_the_worst_store() {
    let (module, f, v) = branch_stores(input(0.0, 1.0, 0.05), input(0.0, 1.0, 0.2), Some(joined_range()));
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_error_close(analysis.value_error(f, v), 0.2);
}

#[test]
fn merged_load_without_its_own_range_has_no_data() {
    let (module, f, v) = branch_stores(input(0.0, 1.0, 0.05), input(0.0, 1.0, 0.2), None);
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_eq!(analysis.value_error(f, v), None);
    assert_eq!(analysis.function_error(f), None);
}

#[test]
fn resolver_collects_both_stores_at_the_join() {
    let (module, f, v) = branch_stores(input(0.0, 1.0, 0.05), input(0.0, 1.0, 0.2), Some(joined_range()));
    let func = module.function(f).unwrap();
    let ssa = MemorySsa::build(func, &module);

    // record the two stores as the propagator would
    let mut store = RangeErrorStore::for_module(&module);
    let range = FPInterval::new(fixed(), 0.0, 1.0);
    let stores: Vec<_> = func
        .insts
        .iter()
        .filter(|i| matches!(i.kind, InstKind::Store { .. }))
        .map(|i| i.id)
        .collect();
    assert_eq!(stores.len(), 2);
    for (id, e) in stores.iter().zip([0.05, 0.2]) {
        store.set_range_error(ValueKey::Inst(f, *id), RangeError::with_error(range, AffineForm::with_error(0.0, e)));
    }

    let candidates = MemoryDependenceResolver::new(&ssa, func).resolve(&store, v.as_inst().unwrap());
    let mut bounds: Vec<f64> = candidates.iter().filter_map(RangeError::abs_error).collect();
    bounds.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(bounds, vec![0.05, 0.2]);
}

#[test]
fn struct_field_roundtrip() {
    let (module, f, v) = struct_roundtrip(input(0.0, 4.0, 0.125));
    let analysis = analyze(&module);

    assert_no_failures(&analysis);
    assert_error_close(analysis.value_error(f, v), 0.125);
}

#[test]
fn load_without_source_or_range_has_no_data() {
    let mut mb = ModuleBuilder::new("empty");
    let mut g = mb.function("g", Type::Int(32));
    let slot = g.alloca("slot", Type::Int(32));
    let v = g.load("v", Type::Int(32), slot);
    g.ret(Some(v));
    let id = mb.define(g);
    let module = mb.finish();

    let analysis = analyze(&module);
    assert_eq!(analysis.value_error(id, v), None);
    assert_eq!(analysis.value_error(id, Value::ConstInt(0)), None);
}

#[test]
fn annotated_global_feeds_its_loads() {
    let mut mb = ModuleBuilder::new("globals");
    let gain = mb.global("gain", Type::Int(32), Some(input(0.0, 1.0, 0.5).into()));
    mb.global_target(gain, "gain");
    let mut f = mb.function("amplify", Type::Int(32));
    let v = f.load("v", Type::Int(32), Value::Global(gain));
    let w = f.binary(BinaryOp::Add, "w", Type::Int(32), v, v);
    f.ret(Some(w));
    let id = mb.define(f);
    let module = mb.finish();

    let analysis = analyze(&module);
    assert_no_failures(&analysis);
    assert_error_close(analysis.global_error(gain), 0.5);
    assert_error_close(analysis.value_error(id, v), 0.5);
    assert_error_close(analysis.value_error(id, w), 1.0);
    assert_eq!(analysis.target_error("gain"), 0.5);
    assert_eq!(module.function_by_name("amplify").map(|f| f.id), Some(id));
}
