use std::collections::BTreeMap;

use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
use crate::expression::error::ExprError;

/// Variable lookup used while evaluating an expression.
pub(crate) trait Scope {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Scope for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// A scope that shadows `base` with a few extra bindings.
pub(crate) struct Layered<'a> {
    pub(crate) base: &'a dyn Scope,
    pub(crate) extra: &'a [(&'a str, f64)],
}

impl Scope for Layered<'_> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.extra
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .or_else(|| self.base.lookup(name))
    }
}

fn truthy(v: f64) -> bool {
    v != 0.0
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

pub(crate) fn eval(expr: &Expr, scope: &dyn Scope) -> Result<f64, ExprError> {
    match expr {
        Expr::Num(v) => Ok(*v),
        Expr::Var { name, offset } => scope
            .lookup(name)
            .ok_or_else(|| ExprError::new(*offset, format!("unknown identifier '{name}'"))),
        Expr::Unary { op, expr } => {
            let v = eval(expr, scope)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Not => flag(!truthy(v)),
            })
        }
        Expr::Binary { op, left, right } => {
            let l = eval(left, scope)?;
            // Short-circuit logical operators.
            match op {
                BinaryOp::And if !truthy(l) => return Ok(0.0),
                BinaryOp::Or if truthy(l) => return Ok(1.0),
                _ => {}
            }
            let r = eval(right, scope)?;
            Ok(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Mod => l % r,
                BinaryOp::Eq => flag(l == r),
                BinaryOp::Ne => flag(l != r),
                BinaryOp::Lt => flag(l < r),
                BinaryOp::Le => flag(l <= r),
                BinaryOp::Gt => flag(l > r),
                BinaryOp::Ge => flag(l >= r),
                BinaryOp::And | BinaryOp::Or => flag(truthy(r)),
            })
        }
        Expr::Cond {
            cond,
            then,
            otherwise,
        } => {
            if truthy(eval(cond, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Call { func, args, offset } => {
            let vals = args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(func, &vals, *offset)
        }
    }
}

fn call(func: &str, a: &[f64], offset: usize) -> Result<f64, ExprError> {
    let arity = |n: usize| -> Result<(), ExprError> {
        if a.len() == n {
            Ok(())
        } else {
            Err(ExprError::new(
                offset,
                format!("{func}() expects {n} argument(s), got {}", a.len()),
            ))
        }
    };

    match func {
        "sin" | "cos" | "tan" | "abs" | "floor" | "ceil" | "round" | "sqrt" => {
            arity(1)?;
            let x = a[0];
            Ok(match func {
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "abs" => x.abs(),
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                "round" => x.round(),
                _ => x.sqrt(),
            })
        }
        "pow" => {
            arity(2)?;
            Ok(a[0].powf(a[1]))
        }
        "min" | "max" => {
            if a.is_empty() {
                return Err(ExprError::new(
                    offset,
                    format!("{func}() expects at least one argument"),
                ));
            }
            let pick = if func == "min" { f64::min } else { f64::max };
            Ok(a[1..].iter().copied().fold(a[0], pick))
        }
        "clamp" => {
            arity(3)?;
            Ok(a[0].max(a[1]).min(a[2]))
        }
        "mix" => {
            arity(3)?;
            Ok(a[0] + (a[1] - a[0]) * a[2])
        }
        other => Err(ExprError::new(
            offset,
            format!("unknown function '{other}'"),
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
