//! Loop-carried expressions
//!
//! A closed sum over the supported grammar: constants, symbols and the four
//! arithmetic operations. Symbols index the analyzer's symbol table.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Symbol(usize),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn add(a: Expr, b: Expr) -> Expr {
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Expr {
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::Div(Box::new(a), Box::new(b))
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// Partial derivative with respect to `symbol`, simplified
    pub fn diff(&self, symbol: usize) -> Expr {
        let d = match self {
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Symbol(s) => Expr::Const(if *s == symbol { 1.0 } else { 0.0 }),
            Expr::Add(a, b) => Expr::add(a.diff(symbol), b.diff(symbol)),
            Expr::Sub(a, b) => Expr::sub(a.diff(symbol), b.diff(symbol)),
            Expr::Mul(a, b) => Expr::add(
                Expr::mul(a.diff(symbol), (**b).clone()),
                Expr::mul((**a).clone(), b.diff(symbol)),
            ),
            // (a'b - ab') / b²
            Expr::Div(a, b) => Expr::div(
                Expr::sub(
                    Expr::mul(a.diff(symbol), (**b).clone()),
                    Expr::mul((**a).clone(), b.diff(symbol)),
                ),
                Expr::mul((**b).clone(), (**b).clone()),
            ),
        };
        d.simplify()
    }

    /// Fold constants and drop neutral/absorbing operands
    pub fn simplify(self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Symbol(_) => self,
            Expr::Add(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Const(x), Expr::Const(y)) => Expr::Const(x + y),
                (Expr::Const(z), e) | (e, Expr::Const(z)) if z == 0.0 => e,
                (x, y) => Expr::add(x, y),
            },
            Expr::Sub(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Const(x), Expr::Const(y)) => Expr::Const(x - y),
                (e, Expr::Const(z)) if z == 0.0 => e,
                (x, y) if x == y => Expr::Const(0.0),
                (x, y) => Expr::sub(x, y),
            },
            Expr::Mul(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Const(x), Expr::Const(y)) => Expr::Const(x * y),
                (Expr::Const(z), _) | (_, Expr::Const(z)) if z == 0.0 => Expr::Const(0.0),
                (Expr::Const(o), e) | (e, Expr::Const(o)) if o == 1.0 => e,
                (x, y) => Expr::mul(x, y),
            },
            Expr::Div(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Const(z), _) if z == 0.0 => Expr::Const(0.0),
                (Expr::Const(x), Expr::Const(y)) if y != 0.0 => Expr::Const(x / y),
                (e, Expr::Const(o)) if o == 1.0 => e,
                (x, y) => Expr::div(x, y),
            },
        }
    }

    /// Symbols referenced by the expression, in first-occurrence order
    pub fn symbols(&self) -> Vec<usize> {
        fn walk(e: &Expr, out: &mut Vec<usize>) {
            match e {
                Expr::Const(_) => {}
                Expr::Symbol(s) => {
                    if !out.contains(s) {
                        out.push(*s);
                    }
                }
                Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{}", c),
            Expr::Symbol(s) => write!(f, "s{}", s),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => write!(f, "({} * {})", a, b),
            Expr::Div(a, b) => write!(f, "({} / {})", a, b),
        }
    }
}
