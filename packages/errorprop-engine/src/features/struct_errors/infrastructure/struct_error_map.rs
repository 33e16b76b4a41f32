//! Struct error map: pointer walking, argument bindings, cross-call updates
//!
//! A pointer is resolved by walking its defining chain backward:
//!
//! ```text
//!   gep(base, [_, i, j])  ─► collect [i, j], continue with base
//!   load(ptr)             ─► continue with ptr
//!   formal (bound)        ─► continue with the caller's resolved path
//!   formal (S*) / alloca S / global S ─► root
//!   anything else         ─► unresolved
//! ```

use ahash::AHashMap as FastHashMap;
use tracing::debug;

use crate::features::struct_errors::domain::{PathIndex, StructErrorTree};
use crate::shared::ir::{Function, InstKind, Module, StructTypeId, Type, Value, ValueInfo, ValueKey};
use crate::shared::models::RangeError;

/// Root object plus the access path below it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    pub root: ValueKey,
    pub ty: StructTypeId,
    pub indices: Vec<PathIndex>,
}

#[derive(Debug, Clone, Default)]
pub struct StructErrorMap {
    trees: FastHashMap<ValueKey, StructErrorTree>,
    /// Formal aggregate pointer -> caller-side path, valid for one activation
    bindings: FastHashMap<ValueKey, FieldPath>,
}

impl StructErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self, root: &ValueKey) -> Option<&StructErrorTree> {
        self.trees.get(root)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn binding(&self, formal: &ValueKey) -> Option<&FieldPath> {
        self.bindings.get(formal)
    }

    /// Resolve `pointer` (an operand of `func`) to its root object and path
    pub fn resolve_path(&self, module: &Module, func: &Function, pointer: Value) -> Option<FieldPath> {
        let mut reversed: Vec<PathIndex> = Vec::new();
        let mut current = pointer;
        // Def chains are acyclic in well-formed input; the bound guards malformed ones
        for _ in 0..=func.insts.len() + 1 {
            match current {
                Value::Inst(id) => {
                    let inst = func.inst(id)?;
                    match &inst.kind {
                        InstKind::GetElementPtr { base, indices } => {
                            // The first index offsets the base pointer itself
                            for idx in indices.iter().skip(1).rev() {
                                reversed.push(path_index(idx));
                            }
                            current = *base;
                        }
                        InstKind::Load { ptr } => current = *ptr,
                        InstKind::Alloca {
                            allocated: Type::Struct(sid),
                        } => {
                            return Some(finish(ValueKey::Inst(func.id, id), *sid, Vec::new(), reversed));
                        }
                        _ => return None,
                    }
                }
                Value::Arg(idx) => {
                    let formal = ValueKey::Arg(func.id, idx);
                    if let Some(bound) = self.bindings.get(&formal) {
                        return Some(finish(bound.root, bound.ty, bound.indices.clone(), reversed));
                    }
                    let sid = func.params.get(idx as usize)?.ty.pointee_struct()?;
                    return Some(finish(formal, sid, Vec::new(), reversed));
                }
                Value::Global(gid) => {
                    let sid = module.global(gid)?.ty.as_struct()?;
                    return Some(finish(ValueKey::Global(gid), sid, Vec::new(), reversed));
                }
                Value::Function(_) | Value::ConstInt(_) | Value::ConstFloat(_) | Value::Undef => {
                    return None
                }
            }
        }
        None
    }

    /// Record the error of the field addressed by `pointer`; false if unresolved
    pub fn set_field_error(&mut self, module: &Module, func: &Function, pointer: Value, value: RangeError) -> bool {
        let Some(path) = self.resolve_path(module, func, pointer) else {
            return false;
        };
        let tree = self
            .trees
            .entry(path.root)
            .or_insert_with(|| StructErrorTree::new(module, path.ty));
        let written = tree.set(module, &path.indices, value);
        debug!(root = ?path.root, depth = path.indices.len(), written, "struct field write");
        written
    }

    /// Error of the field addressed by `pointer`
    pub fn get_field_error(&self, module: &Module, func: &Function, pointer: Value) -> Option<&RangeError> {
        let path = self.resolve_path(module, func, pointer)?;
        self.trees.get(&path.root)?.get(module, &path.indices)
    }

    /// Bind the aggregate-pointer formals of `callee` to the actuals of a call in `caller`
    pub fn init_argument_bindings(&mut self, module: &Module, caller: &Function, callee: &Function, actual_args: &[Value]) {
        for (idx, (param, actual)) in callee.params.iter().zip(actual_args).enumerate() {
            if param.ty.pointee_struct().is_none() {
                continue;
            }
            if let Some(path) = self.resolve_path(module, caller, *actual) {
                self.bindings.insert(ValueKey::Arg(callee.id, idx as u32), path);
            }
        }
    }

    /// Drop the bindings of one callee activation
    pub fn clear_bindings(&mut self, callee: &Function) {
        self.bindings.retain(|formal, _| formal.owner() != Some(callee.id));
    }

    /// Copy back the trees reachable from the pointer arguments of a call
    pub fn update_struct_tree(&mut self, other: &StructErrorMap, module: &Module, caller: &Function, pointers: &[Value]) {
        for &pointer in pointers {
            let is_pointer = module
                .value_type(caller, pointer)
                .map_or(false, |t| t.is_pointer());
            if !is_pointer {
                continue;
            }
            let Some(path) = self.resolve_path(module, caller, pointer) else {
                continue;
            };
            if let Some(tree) = other.trees.get(&path.root) {
                self.trees.insert(path.root, tree.clone());
            }
        }
    }

    /// Take over trees of module-level objects (globals) from another map
    pub fn merge_global_trees(&mut self, other: &StructErrorMap) {
        for (root, tree) in &other.trees {
            if matches!(root, ValueKey::Global(_)) {
                self.trees.insert(*root, tree.clone());
            }
        }
    }

    /// Seed the tree of an aggregate object from its annotation
    pub fn seed_from_info(&mut self, module: &Module, root: ValueKey, ty: StructTypeId, info: &ValueInfo) {
        if let ValueInfo::Struct(fields) = info {
            self.trees
                .insert(root, StructErrorTree::from_info(module, ty, fields));
        }
    }

    /// Copy with every field error set to zero
    pub fn with_zero_errors(&self) -> StructErrorMap {
        let mut zeroed = self.clone();
        for tree in zeroed.trees.values_mut() {
            tree.zero_errors();
        }
        zeroed
    }

    /// Erase the trees rooted at objects local to `func`
    pub fn erase_locals(&mut self, func: &Function) {
        self.trees.retain(|root, _| root.owner() != Some(func.id));
    }
}

fn path_index(value: &Value) -> PathIndex {
    match value {
        Value::ConstInt(c) if *c >= 0 => PathIndex::Const(*c as u64),
        _ => PathIndex::Dynamic,
    }
}

fn finish(root: ValueKey, ty: StructTypeId, mut prefix: Vec<PathIndex>, reversed: Vec<PathIndex>) -> FieldPath {
    prefix.extend(reversed.into_iter().rev());
    FieldPath {
        root,
        ty,
        indices: prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{Callee, FunctionBuilder, ModuleBuilder};
    use crate::shared::models::{AffineForm, FPInterval, FixedPointFormat};

    fn re(err: f64) -> RangeError {
        RangeError::with_error(
            FPInterval::new(FixedPointFormat::signed(32, 16), 0.0, 4.0),
            AffineForm::with_error(0.0, err),
        )
    }

    /// `struct Pair { i32 a; i32 b[4]; }`, a local `Pair p` and a field pointer into it
    fn pair_module() -> (Module, Value, Value, Value) {
        let mut mb = ModuleBuilder::new("m");
        let pair = mb.struct_type("Pair", vec![Type::Int(32), Type::array_of(Type::Int(32), 4)]);
        let mut f = mb.function("f", Type::Void);
        let p = f.alloca("p", Type::Struct(pair));
        let a = f.gep("a", Type::pointer_to(Type::Int(32)), p, vec![Value::ConstInt(0), Value::ConstInt(0)]);
        let b2 = f.gep(
            "b2",
            Type::pointer_to(Type::Int(32)),
            p,
            vec![Value::ConstInt(0), Value::ConstInt(1), Value::ConstInt(2)],
        );
        f.ret(None);
        mb.define(f);
        (mb.finish(), p, a, b2)
    }

    #[test]
    fn test_field_roundtrip() {
        let (module, _, a, b2) = pair_module();
        let func = &module.functions[0];
        let mut map = StructErrorMap::new();

        assert!(map.set_field_error(&module, func, a, re(0.125)));
        assert!(map.set_field_error(&module, func, b2, re(0.5)));
        assert_eq!(map.get_field_error(&module, func, a).and_then(RangeError::abs_error), Some(0.125));
        assert_eq!(map.get_field_error(&module, func, b2).and_then(RangeError::abs_error), Some(0.5));
        assert_eq!(map.tree_count(), 1);
    }

    #[test]
    fn test_unresolved_pointer() {
        let (module, _, _, _) = pair_module();
        let func = &module.functions[0];
        let mut map = StructErrorMap::new();
        assert!(!map.set_field_error(&module, func, Value::ConstInt(0), re(0.1)));
        assert!(map.get_field_error(&module, func, Value::Undef).is_none());
    }

    #[test]
    fn test_argument_binding_routes_to_caller_tree() {
        let mut mb = ModuleBuilder::new("m");
        let pair = mb.struct_type("Pair", vec![Type::Int(32), Type::Int(32)]);

        // callee(Pair* s) { s->b = ... }
        let mut callee = mb.function("callee", Type::Void);
        let s = callee.param("s", Type::pointer_to(Type::Struct(pair)));
        let fb = callee.gep("fb", Type::pointer_to(Type::Int(32)), s, vec![Value::ConstInt(0), Value::ConstInt(1)]);
        callee.ret(None);
        let callee_id = mb.define(callee);

        // caller() { Pair p; callee(&p); }
        let mut caller: FunctionBuilder = mb.function("caller", Type::Void);
        let p = caller.alloca("p", Type::Struct(pair));
        caller.call("", Type::Void, Callee::Direct(callee_id), vec![p]);
        let pb = caller.gep("pb", Type::pointer_to(Type::Int(32)), p, vec![Value::ConstInt(0), Value::ConstInt(1)]);
        caller.ret(None);
        let caller_id = mb.define(caller);
        let module = mb.finish();
        let callee_fn = module.function(callee_id).unwrap();
        let caller_fn = module.function(caller_id).unwrap();

        let mut caller_map = StructErrorMap::new();
        let mut callee_map = caller_map.clone();
        callee_map.init_argument_bindings(&module, caller_fn, callee_fn, &[p]);
        assert!(callee_map.binding(&ValueKey::Arg(callee_id, 0)).is_some());
        assert!(callee_map.set_field_error(&module, callee_fn, fb, re(0.75)));

        caller_map.update_struct_tree(&callee_map, &module, caller_fn, &[p]);
        assert_eq!(
            caller_map.get_field_error(&module, caller_fn, pb).and_then(RangeError::abs_error),
            Some(0.75)
        );
    }
}
