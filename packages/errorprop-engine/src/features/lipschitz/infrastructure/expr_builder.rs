//! Reconstruction of loop-carried update expressions
//!
//! Each phi of the condition block carries one variable. Its value on the
//! back edge (the "body value") is rebuilt as an [`Expr`] over symbols:
//!
//! - a body value gets a symbol whose expression is its update rule
//! - a value defined outside the loop, an argument or a global is an
//!   external symbol whose expression is itself
//! - a condition phi inside an expression stands for the body value it
//!   receives on the back edge
//!
//! Shifts and width/sign conversions collapse to their first operand.

use ahash::AHashMap as FastHashMap;
use tracing::debug;

use super::loop_shape::LoopShape;
use crate::features::lipschitz::domain::Expr;
use crate::features::lipschitz::error::{LipschitzError, LipschitzResult};
use crate::features::propagation::InstructionPropagator;
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{BinaryOp, CastOp, InstKind, Instruction, Value, ValueKey};
use crate::shared::models::FixedPointFormat;

/// One row of the loop system
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSymbol {
    pub key: ValueKey,
    pub value: Value,
    pub name: String,
    pub expr: Expr,
    /// Value whose error seeds this symbol before the first iteration
    pub initial: Option<Value>,
    /// Loop-invariant input: its expression is the symbol itself
    pub external: bool,
}

/// Symbols in creation order; `Expr::Symbol(i)` refers to `symbols[i]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSystem {
    pub symbols: Vec<LoopSymbol>,
}

impl LoopSystem {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, key: &ValueKey) -> Option<usize> {
        self.symbols.iter().position(|s| s.key == *key)
    }
}

struct PendingSymbol {
    key: ValueKey,
    value: Value,
    expr: Option<Expr>,
    initial: Option<Value>,
}

pub struct LoopExprBuilder<'p, 'a> {
    propagator: &'p InstructionPropagator<'a>,
    store: &'p RangeErrorStore,
    shape: LoopShape,
    symbols: Vec<PendingSymbol>,
    index: FastHashMap<ValueKey, usize>,
}

impl<'p, 'a> LoopExprBuilder<'p, 'a> {
    pub fn new(propagator: &'p InstructionPropagator<'a>, store: &'p RangeErrorStore, shape: LoopShape) -> Self {
        Self {
            propagator,
            store,
            shape,
            symbols: Vec::new(),
            index: FastHashMap::new(),
        }
    }

    pub fn build(mut self) -> LipschitzResult<LoopSystem> {
        let func = self.propagator.func;
        let cond_phis: Vec<&Instruction> = func.phis(self.shape.cond).collect();
        for phi in cond_phis {
            let (entry_value, body_value) = self.phi_incoming(phi)?;
            let key = self.key_of(body_value)?;
            if self.index.get(&key).map_or(false, |&i| self.symbols[i].expr.is_some()) {
                continue;
            }
            let expr = self.build_value(body_value, None)?.simplify();
            let idx = self.symbol(key, body_value);
            debug!(phi = %phi.name, expr = %expr, "loop expression");
            self.symbols[idx].expr = Some(expr);
            self.symbols[idx].initial = entry_value;
        }

        let mut symbols = Vec::with_capacity(self.symbols.len());
        for (i, pending) in self.symbols.into_iter().enumerate() {
            let name = value_name(self.propagator, pending.value);
            let expr = match pending.expr {
                Some(expr) => expr,
                None => return Err(LipschitzError::UnsupportedValue(name)),
            };
            symbols.push(LoopSymbol {
                key: pending.key,
                value: pending.value,
                name,
                external: expr == Expr::Symbol(i),
                expr,
                initial: pending.initial,
            });
        }
        Ok(LoopSystem { symbols })
    }

    /// Preheader and back-edge incoming values of a condition phi
    fn phi_incoming(&self, phi: &Instruction) -> LipschitzResult<(Option<Value>, Value)> {
        let InstKind::Phi { incoming } = &phi.kind else {
            return Err(LipschitzError::UnsupportedValue(phi.name.clone()));
        };
        let from = |block| incoming.iter().find(|(_, b)| *b == block).map(|(v, _)| *v);
        let body = from(self.shape.body).ok_or_else(|| LipschitzError::MissingIncoming(phi.name.clone()))?;
        Ok((from(self.shape.preheader), body))
    }

    fn key_of(&self, value: Value) -> LipschitzResult<ValueKey> {
        self.propagator
            .value_key(value)
            .ok_or_else(|| LipschitzError::UnsupportedValue(value_name(self.propagator, value)))
    }

    fn symbol(&mut self, key: ValueKey, value: Value) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.symbols.len();
        self.symbols.push(PendingSymbol {
            key,
            value,
            expr: None,
            initial: None,
        });
        self.index.insert(key, idx);
        idx
    }

    fn external(&mut self, value: Value) -> LipschitzResult<Expr> {
        let key = self.key_of(value)?;
        let idx = self.symbol(key, value);
        let pending = &mut self.symbols[idx];
        if pending.expr.is_none() {
            pending.expr = Some(Expr::Symbol(idx));
            pending.initial = Some(value);
        }
        Ok(Expr::Symbol(idx))
    }

    /// Expression of `value`; `format` reads integer constants
    fn build_value(&mut self, value: Value, format: Option<FixedPointFormat>) -> LipschitzResult<Expr> {
        match value {
            Value::ConstInt(raw) => Ok(Expr::Const(format.map_or(raw as f64, |f| f.interpret(raw)))),
            Value::ConstFloat(v) => Ok(Expr::Const(v)),
            Value::Arg(_) | Value::Global(_) => self.external(value),
            Value::Function(_) | Value::Undef => Err(LipschitzError::UnsupportedValue(value_name(self.propagator, value))),
            Value::Inst(id) => {
                let inst = self
                    .propagator
                    .func
                    .inst(id)
                    .ok_or_else(|| LipschitzError::UnsupportedValue(format!("%{}", id.0)))?;
                if !self.shape.contains(inst.block) {
                    return self.external(value);
                }
                self.build_inst(inst)
            }
        }
    }

    fn build_inst(&mut self, inst: &Instruction) -> LipschitzResult<Expr> {
        let format = self
            .propagator
            .result_range(self.store, inst)
            .map(|r| r.format)
            .filter(|f| !f.is_uninitialized());
        match &inst.kind {
            InstKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add | BinaryOp::FAdd => Ok(Expr::add(self.build_value(*lhs, format)?, self.build_value(*rhs, format)?)),
                BinaryOp::Sub | BinaryOp::FSub => Ok(Expr::sub(self.build_value(*lhs, format)?, self.build_value(*rhs, format)?)),
                BinaryOp::Mul | BinaryOp::FMul => Ok(Expr::mul(self.build_value(*lhs, format)?, self.build_value(*rhs, format)?)),
                BinaryOp::SDiv | BinaryOp::UDiv | BinaryOp::FDiv => {
                    Ok(Expr::div(self.build_value(*lhs, format)?, self.build_value(*rhs, format)?))
                }
                BinaryOp::Shl | BinaryOp::LShr | BinaryOp::AShr => self.build_value(*lhs, format),
                _ => Err(self.unsupported(inst)),
            },
            InstKind::Cast { op, operand } => match op {
                CastOp::Trunc | CastOp::ZExt | CastOp::SExt | CastOp::FpTrunc | CastOp::FpExt => {
                    self.build_value(*operand, format)
                }
                _ => Err(self.unsupported(inst)),
            },
            InstKind::Phi { .. } => {
                if inst.block != self.shape.cond {
                    return Err(self.unsupported(inst));
                }
                let (entry_value, body_value) = self.phi_incoming(inst)?;
                let key = self.key_of(body_value)?;
                let idx = self.symbol(key, body_value);
                if self.symbols[idx].initial.is_none() {
                    self.symbols[idx].initial = entry_value;
                }
                Ok(Expr::Symbol(idx))
            }
            _ => Err(self.unsupported(inst)),
        }
    }

    fn unsupported(&self, inst: &Instruction) -> LipschitzError {
        LipschitzError::UnsupportedOperation {
            name: inst.name.clone(),
            opcode: inst.opcode(),
        }
    }
}

fn value_name(propagator: &InstructionPropagator<'_>, value: Value) -> String {
    match value {
        Value::Inst(id) => propagator
            .func
            .inst(id)
            .map_or_else(|| format!("%{}", id.0), |i| i.name.clone()),
        Value::Arg(idx) => propagator
            .func
            .params
            .get(idx as usize)
            .map_or_else(|| format!("arg{}", idx), |p| p.name.clone()),
        Value::Global(id) => propagator
            .module
            .global(id)
            .map_or_else(|| format!("@{}", id.0), |g| g.name.clone()),
        other => format!("{:?}", other),
    }
}
