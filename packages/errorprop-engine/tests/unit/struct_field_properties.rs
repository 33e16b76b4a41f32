//! Property-based tests for field-sensitive aggregate errors
//!
//! For any nest of struct types (fields optionally wrapped in arrays) and any
//! constant access path into it:
//! - an error stored through the path is read back unchanged through a
//!   separate address computation of the same path
//! - a sibling field of the outermost object stays without data

#[path = "../common/mod.rs"]
mod common;

use common::*;
use errorprop_engine::shared::ir::{FunctionId, Module, ModuleBuilder, Type, Value};
use proptest::prelude::*;

/// One struct level of the nest, outermost first
#[derive(Debug, Clone)]
struct Level {
    width: usize,
    /// Field the path descends into
    field: usize,
    /// Array wrapping the descended field: (length, constant index)
    array: Option<(u64, u64)>,
}

fn level() -> impl Strategy<Value = Level> {
    (1usize..5, 0usize..4, prop::option::of((1u64..5, 0u64..4))).prop_map(|(width, field, array)| Level {
        width,
        field: field % width,
        array: array.map(|(len, idx)| (len, idx % len)),
    })
}

/// Handles into [`nested_access`]
struct NestedAccess {
    module: Module,
    func: FunctionId,
    /// Load through the generated path
    read: Value,
    /// Load of a scalar sibling of the outermost field, when one exists
    sibling: Option<Value>,
}

/// `obj.<path> = x; read = obj.<path>` over the nest described by `levels`
fn nested_access(levels: &[Level], error: f64) -> NestedAccess {
    let mut mb = ModuleBuilder::new("nested");

    // Innermost type first: each level wraps the one below it
    let mut inner = Type::Int(32);
    for (depth, lvl) in levels.iter().enumerate().rev() {
        let descended = match lvl.array {
            Some((len, _)) => Type::array_of(inner, len),
            None => inner,
        };
        let fields = (0..lvl.width)
            .map(|i| if i == lvl.field { descended.clone() } else { Type::Int(32) })
            .collect();
        inner = Type::Struct(mb.struct_type(format!("S{depth}"), fields));
    }

    let mut indices = vec![Value::ConstInt(0)];
    for lvl in levels {
        indices.push(Value::ConstInt(lvl.field as i64));
        if let Some((_, idx)) = lvl.array {
            indices.push(Value::ConstInt(idx as i64));
        }
    }

    let mut f = mb.function("fields", Type::Int(32));
    let x = f.param_with_info(
        "x",
        Type::Int(32),
        InfoBuilder::new(fixed()).range(0.0, 4.0).error(error).build(),
    );
    let obj = f.alloca("obj", inner);
    let dst = f.gep("dst", Type::pointer_to(Type::Int(32)), obj, indices.clone());
    f.store(x, dst);
    let src = f.gep("src", Type::pointer_to(Type::Int(32)), obj, indices);
    let read = f.load("read", Type::Int(32), src);

    let outer = &levels[0];
    let sibling = (outer.width > 1).then(|| {
        let other = (outer.field + 1) % outer.width;
        let ptr = f.gep(
            "other",
            Type::pointer_to(Type::Int(32)),
            obj,
            vec![Value::ConstInt(0), Value::ConstInt(other as i64)],
        );
        f.load("sibling", Type::Int(32), ptr)
    });
    f.ret(Some(read));
    let func = mb.define(f);

    NestedAccess {
        module: mb.finish(),
        func,
        read,
        sibling,
    }
}

proptest! {
    #[test]
    fn prop_field_write_then_read_roundtrips(
        levels in prop::collection::vec(level(), 1..5),
        error in 0.001..1.0f64,
    ) {
        let nest = nested_access(&levels, error);
        let analysis = analyze(&nest.module);

        prop_assert!(analysis.failed.is_empty(), "failures: {:?}", analysis.failed);
        let read = analysis.value_error(nest.func, nest.read);
        prop_assert!(
            read.map_or(false, |e| (e - error).abs() <= TOLERANCE),
            "read back {:?}, stored {}",
            read,
            error
        );
    }

    #[test]
    fn prop_sibling_field_stays_unknown(
        levels in prop::collection::vec(level(), 1..5),
        error in 0.001..1.0f64,
    ) {
        let nest = nested_access(&levels, error);
        prop_assume!(nest.sibling.is_some());
        let analysis = analyze(&nest.module);

        let sibling = nest.sibling.and_then(|s| analysis.value_error(nest.func, s));
        prop_assert_eq!(sibling, None);
    }
}
