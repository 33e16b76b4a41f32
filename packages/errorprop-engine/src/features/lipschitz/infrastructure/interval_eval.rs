//! Post-order interval evaluation of an expression tree

use crate::features::lipschitz::domain::{Expr, Interval};
use crate::features::lipschitz::error::{LipschitzError, LipschitzResult};

enum Visit<'e> {
    Enter(&'e Expr),
    Combine(&'e Expr),
}

/// Interval of `expr` with every symbol ranging over `lookup(symbol)`.
///
/// Iterative: operands are pushed on a value stack and combined when their
/// parent is revisited.
pub fn evaluate<F>(expr: &Expr, lookup: F) -> LipschitzResult<Interval>
where
    F: Fn(usize) -> LipschitzResult<Interval>,
{
    let mut work = vec![Visit::Enter(expr)];
    let mut values: Vec<Interval> = Vec::new();

    while let Some(visit) = work.pop() {
        match visit {
            Visit::Enter(e) => match e {
                Expr::Const(c) => values.push(Interval::point(*c)),
                Expr::Symbol(s) => values.push(lookup(*s)?),
                Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                    work.push(Visit::Combine(e));
                    work.push(Visit::Enter(b));
                    work.push(Visit::Enter(a));
                }
            },
            Visit::Combine(e) => {
                let (Some(rhs), Some(lhs)) = (values.pop(), values.pop()) else {
                    return Err(LipschitzError::UnsupportedValue(e.to_string()));
                };
                let combined = match e {
                    Expr::Add(..) => lhs.add(rhs),
                    Expr::Sub(..) => lhs.sub(rhs),
                    Expr::Mul(..) => lhs.mul(rhs),
                    Expr::Div(..) => lhs.div(rhs).ok_or(LipschitzError::UnboundedDerivative)?,
                    Expr::Const(_) | Expr::Symbol(_) => return Err(LipschitzError::UnsupportedValue(e.to_string())),
                };
                values.push(combined);
            }
        }
    }
    values.pop().ok_or_else(|| LipschitzError::UnsupportedValue(expr.to_string()))
}

/// Largest magnitude of `expr` over the symbol ranges
pub fn max_abs<F>(expr: &Expr, lookup: F) -> LipschitzResult<f64>
where
    F: Fn(usize) -> LipschitzResult<Interval>,
{
    if let Some(c) = expr.as_const() {
        return Ok(c.abs());
    }
    Ok(evaluate(expr, lookup)?.max_abs())
}
