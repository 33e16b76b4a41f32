//! Pointer origins and a conservative may-alias test
//!
//! Two accesses do not alias when they provably address distinct identified
//! objects (different stack slots or globals), or the same object through
//! constant paths that diverge at some step. Formals, loaded pointers and
//! anything unrecognized may alias everything.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::shared::ir::{Callee, Function, GlobalId, InstId, InstKind, Module, Value};
use crate::shared::models::MonotonicFn;

/// Library calls that read no caller memory and write none
static PURE_LIBRARY_CALLS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sin", "cos", "tan", "atan", "atan2", "sinh", "cosh", "tanh", "fabs", "abs", "pow",
        "floor", "ceil", "round", "trunc", "fmin", "fmax", "log2", "log10", "exp2",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRoot {
    Alloca(InstId),
    Global(GlobalId),
    Arg(u32),
    Unknown,
}

impl MemoryRoot {
    fn is_identified(&self) -> bool {
        matches!(self, MemoryRoot::Alloca(_) | MemoryRoot::Global(_))
    }
}

/// Root object of a pointer plus its index path (`None` for unknown steps)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerOrigin {
    pub root: MemoryRoot,
    pub path: Vec<Option<i64>>,
}

impl PointerOrigin {
    fn unknown() -> Self {
        Self {
            root: MemoryRoot::Unknown,
            path: Vec::new(),
        }
    }
}

pub fn pointer_origin(func: &Function, pointer: Value) -> PointerOrigin {
    // GEP index groups, innermost GEP first
    let mut groups: Vec<Vec<Option<i64>>> = Vec::new();
    let mut current = pointer;
    for _ in 0..=func.insts.len() {
        let root = match current {
            Value::Global(g) => MemoryRoot::Global(g),
            Value::Arg(idx) => MemoryRoot::Arg(idx),
            Value::Inst(id) => match func.inst(id).map(|i| &i.kind) {
                Some(InstKind::Alloca { .. }) => MemoryRoot::Alloca(id),
                Some(InstKind::GetElementPtr { base, indices }) => {
                    groups.push(
                        indices
                            .iter()
                            .map(|v| match v {
                                Value::ConstInt(c) => Some(*c),
                                _ => None,
                            })
                            .collect(),
                    );
                    current = *base;
                    continue;
                }
                Some(InstKind::Cast { operand, .. }) => {
                    current = *operand;
                    continue;
                }
                _ => MemoryRoot::Unknown,
            },
            _ => MemoryRoot::Unknown,
        };
        return PointerOrigin {
            root,
            path: flatten_groups(groups),
        };
    }
    PointerOrigin::unknown()
}

/// Concatenate GEP groups root-first; a nested GEP offsetting its base by a
/// non-zero first index makes the rest of the path unknown
fn flatten_groups(mut groups: Vec<Vec<Option<i64>>>) -> Vec<Option<i64>> {
    groups.reverse();
    let mut path = Vec::new();
    for (n, group) in groups.into_iter().enumerate() {
        let mut steps = group.into_iter();
        if n > 0 {
            match steps.next() {
                Some(Some(0)) | None => {}
                Some(_) => {
                    path.push(None);
                    return path;
                }
            }
        }
        path.extend(steps);
    }
    path
}

pub fn may_alias(a: &PointerOrigin, b: &PointerOrigin) -> bool {
    if !a.root.is_identified() || !b.root.is_identified() {
        return true;
    }
    if a.root != b.root {
        return false;
    }
    for (x, y) in a.path.iter().zip(&b.path) {
        match (x, y) {
            (Some(x), Some(y)) if x == y => continue,
            (Some(_), Some(_)) => return false,
            _ => return true,
        }
    }
    true
}

/// Whether a call leaves caller-visible memory untouched
pub fn is_pure_call(module: &Module, callee: &Callee) -> bool {
    match module.callee_name(callee) {
        Some(name) => {
            MonotonicFn::from_callee_name(name).is_some() || PURE_LIBRARY_CALLS.contains(name)
        }
        None => false,
    }
}
