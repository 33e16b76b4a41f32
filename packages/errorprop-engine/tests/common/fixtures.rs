//! Canned host modules
//!
//! Each fixture returns the module together with the ids and values the
//! tests inspect.

use errorprop_engine::shared::ir::{
    BinaryOp, Callee, CmpPredicate, FunctionId, InputInfo, Module, ModuleBuilder, Type, Value,
};

use super::builders::{counter, fixed, real, InfoBuilder};

/// `r = a <op> b` over two annotated parameters
pub fn binary_kernel(op: BinaryOp, a: InputInfo, b: InputInfo) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("binary");
    let mut f = mb.function("kernel", Type::Int(32));
    let a = f.param_with_info("a", Type::Int(32), a);
    let b = f.param_with_info("b", Type::Int(32), b);
    let r = f.binary(op, "r", Type::Int(32), a, b);
    f.ret(Some(r));
    let id = mb.define(f);
    (mb.finish(), id, r)
}

/// `s = c ? a : b`
pub fn select_kernel(a: InputInfo, b: InputInfo) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("select");
    let mut f = mb.function("pick", Type::Int(32));
    let c = f.param("c", Type::Int(1));
    let a = f.param_with_info("a", Type::Int(32), a);
    let b = f.param_with_info("b", Type::Int(32), b);
    let s = f.select("s", Type::Int(32), c, a, b);
    f.ret(Some(s));
    let id = mb.define(f);
    (mb.finish(), id, s)
}

/// `c = a < b` over native-precision operands
pub fn compare_kernel(a: InputInfo, b: InputInfo) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("compare");
    let mut f = mb.function("less", Type::Int(1));
    let a = f.param_with_info("a", Type::Float(64), a);
    let b = f.param_with_info("b", Type::Float(64), b);
    let c = f.fcmp(CmpPredicate::Lt, "c", a, b);
    f.ret(Some(c));
    let id = mb.define(f);
    (mb.finish(), id, c)
}

/// Handles into [`halving_loop`]
pub struct HalvingLoop {
    pub module: Module,
    pub func: FunctionId,
    /// Loop-carried update `x1 = 0.5 * x`
    pub update: Value,
    /// Exit phi returned by the function
    pub exit: Value,
}

/// `x = x0; for i in 0..trip { x = 0.5 * x }; return x`, with `x0` error `e0`
pub fn halving_loop(trip: u32, e0: f64) -> HalvingLoop {
    let mut mb = ModuleBuilder::new("halving");
    let mut f = mb.function("halve", Type::Float(64));
    let x0 = f.param_with_info(
        "x0",
        Type::Float(64),
        InfoBuilder::new(real()).range(0.0, 1.0).error(e0).build(),
    );
    let entry = f.block("entry");
    let body = f.block("loop");
    let exit = f.block("exit");
    f.position_at_end(entry);
    f.br(body);

    f.position_at_end(body);
    let x = f.phi("x", Type::Float(64), vec![(x0, entry)]);
    f.annotate(x, InputInfo::new(real(), 0.0, 1.0));
    let i = f.phi("i", Type::Int(32), vec![(Value::ConstInt(0), entry)]);
    f.annotate(i, InputInfo::new(counter(), 0.0, f64::from(trip)));
    let x1 = f.binary(BinaryOp::FMul, "x1", Type::Float(64), x, Value::ConstFloat(0.5));
    f.annotate(x1, InputInfo::new(real(), 0.0, 1.0));
    let i1 = f.binary(BinaryOp::Add, "i1", Type::Int(32), i, Value::ConstInt(1));
    f.annotate(i1, InputInfo::new(counter(), 1.0, f64::from(trip)));
    let c = f.icmp(CmpPredicate::Lt, "c", i1, Value::ConstInt(i64::from(trip)));
    f.cond_br(c, body, exit);
    f.add_incoming(x, x1, body);
    f.add_incoming(i, i1, body);

    f.position_at_end(exit);
    let r = f.phi("r", Type::Float(64), vec![(x1, body)]);
    f.ret(Some(r));
    f.loop_hints(body, None, Some(trip));
    let func = mb.define(f);

    HalvingLoop {
        module: mb.finish(),
        func,
        update: x1,
        exit: r,
    }
}

/// `f(x) { y = x + x; f(y); return y }`, optionally with its own recursion bound
pub fn self_recursive(bound: Option<u32>) -> (Module, FunctionId) {
    let mut mb = ModuleBuilder::new("recursion");
    let mut f = mb.function("f", Type::Int(32));
    let id = f.id();
    if let Some(bound) = bound {
        f.max_recursion(bound);
    }
    let x = f.param_with_info(
        "x",
        Type::Int(32),
        InfoBuilder::new(fixed()).range(0.0, 1.0).error(0.01).build(),
    );
    let y = f.binary(BinaryOp::Add, "y", Type::Int(32), x, x);
    f.call("", Type::Int(32), Callee::Direct(id), vec![y]);
    f.ret(Some(y));
    mb.define(f);
    (mb.finish(), id)
}

/// Handles into [`pointer_writer`]
pub struct PointerWriter {
    pub module: Module,
    pub caller: FunctionId,
    pub callee: FunctionId,
    /// Load of the slot after the call
    pub reload: Value,
}

/// `write(int* p, int v) { *p = v }` called on a caller's stack slot
pub fn pointer_writer(error: f64) -> PointerWriter {
    let mut mb = ModuleBuilder::new("writer");

    let mut w = mb.function("write", Type::Void);
    let p = w.param("p", Type::pointer_to(Type::Int(32)));
    let v = w.param_with_info("v", Type::Int(32), InputInfo::new(fixed(), 0.0, 8.0));
    w.store(v, p);
    w.ret(None);
    let callee = mb.define(w);

    let mut c = mb.function("main", Type::Int(32));
    let input = c.param_with_info(
        "input",
        Type::Int(32),
        InfoBuilder::new(fixed()).range(0.0, 8.0).error(error).build(),
    );
    let slot = c.alloca("slot", Type::Int(32));
    c.call("", Type::Void, Callee::Direct(callee), vec![slot, input]);
    let reload = c.load("reload", Type::Int(32), slot);
    c.ret(Some(reload));
    let caller = mb.define(c);

    PointerWriter {
        module: mb.finish(),
        caller,
        callee,
        reload,
    }
}

/// `m = phi(a + a from the left arm, b from the right arm)`
pub fn branch_merge(a: InputInfo, b: InputInfo) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("merge");
    let mut f = mb.function("merge", Type::Int(32));
    let c = f.param("c", Type::Int(1));
    let a = f.param_with_info("a", Type::Int(32), a);
    let b = f.param_with_info("b", Type::Int(32), b);
    let entry = f.block("entry");
    let left = f.block("left");
    let right = f.block("right");
    let join = f.block("join");

    f.position_at_end(entry);
    f.cond_br(c, left, right);
    f.position_at_end(left);
    let doubled = f.binary(BinaryOp::Add, "doubled", Type::Int(32), a, a);
    f.br(join);
    f.position_at_end(right);
    f.br(join);
    f.position_at_end(join);
    let m = f.phi("m", Type::Int(32), vec![(doubled, left), (b, right)]);
    f.ret(Some(m));
    let id = mb.define(f);
    (mb.finish(), id, m)
}

/// Stores of `a` or `b` on the two sides of a branch, loaded at the join.
/// `load` annotates the joined load.
pub fn branch_stores(a: InputInfo, b: InputInfo, load: Option<InputInfo>) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("memory");
    let mut f = mb.function("join", Type::Int(32));
    let c = f.param("c", Type::Int(1));
    let a = f.param_with_info("a", Type::Int(32), a);
    let b = f.param_with_info("b", Type::Int(32), b);
    let entry = f.block("entry");
    let then = f.block("then");
    let other = f.block("else");
    let join = f.block("join");

    f.position_at_end(entry);
    let slot = f.alloca("slot", Type::Int(32));
    f.cond_br(c, then, other);
    f.position_at_end(then);
    f.store(a, slot);
    f.br(join);
    f.position_at_end(other);
    f.store(b, slot);
    f.br(join);
    f.position_at_end(join);
    let v = f.load("v", Type::Int(32), slot);
    if let Some(info) = load {
        f.annotate(v, info);
    }
    f.ret(Some(v));
    let id = mb.define(f);
    (mb.finish(), id, v)
}

/// `Pair p; p.b = x; return p.b` through two separate address computations
pub fn struct_roundtrip(x: InputInfo) -> (Module, FunctionId, Value) {
    let mut mb = ModuleBuilder::new("structs");
    let pair = mb.struct_type("Pair", vec![Type::Int(32), Type::Int(32)]);
    let mut f = mb.function("fields", Type::Int(32));
    let x = f.param_with_info("x", Type::Int(32), x);
    let p = f.alloca("p", Type::Struct(pair));
    let field = vec![Value::ConstInt(0), Value::ConstInt(1)];
    let dst = f.gep("dst", Type::pointer_to(Type::Int(32)), p, field.clone());
    f.store(x, dst);
    let src = f.gep("src", Type::pointer_to(Type::Int(32)), p, field);
    let v = f.load("v", Type::Int(32), src);
    f.ret(Some(v));
    let id = mb.define(f);
    (mb.finish(), id, v)
}
