//! Arithmetic expressions used inside keyframe values.
//!
//! Expressions are parsed once and evaluated against a variable scope (layer and object
//! properties, `rep`, `t`, `v`). Booleans are represented as `1.0`/`0.0`.

pub(crate) mod ast;
pub(crate) mod error;
pub(crate) mod eval;
pub(crate) mod lexer;
pub(crate) mod parser;

pub(crate) use error::ExprError;

/// Parse and evaluate `src` in one step.
pub(crate) fn evaluate(src: &str, scope: &dyn eval::Scope) -> Result<f64, ExprError> {
    let expr = parser::parse_expr(src)?;
    eval::eval(&expr, scope)
}
