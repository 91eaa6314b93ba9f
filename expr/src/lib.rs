//! The expression language evaluated by Tidewater directives.
//!
//! Directive values such as `count + 1`, `open = !open` or `user.name` are small
//! JavaScript-like expressions. This crate tokenizes and parses them into an [`Expr`]
//! tree and evaluates that tree against a [`Scope`], the component's data, plus a set
//! of per-call [`Bindings`].
//!
//! ```
//! use core::cell::RefCell;
//! use tidewater_expr::{Bindings, Map, Value, evaluate, execute};
//!
//! let data = RefCell::new(Map::from_iter([("count".to_string(), Value::from(1))]));
//! execute("count += 2", &data, &Bindings::new()).unwrap();
//! assert_eq!(evaluate("count * 2", &data, &Bindings::new()).unwrap(), Value::from(6));
//! ```
//!
//! Names resolve against the data scope first and the extra bindings second. Writes
//! always land in the data scope, which is how directive handlers mutate component
//! state.

mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use error::{EvalError, ParseError};
pub use eval::{Bindings, Environment, Scope};
pub use parser::{AssignOp, BinaryOp, Expr, LogicalOp, MAX_DEPTH, UnaryOp, UpdateOp, parse};
pub use value::{Map, Value, format_number};

/// Parses and evaluates `source`, returning its value.
///
/// # Errors
///
/// Returns an [`EvalError`] if the source fails to parse or evaluation fails.
pub fn evaluate(source: &str, data: &dyn Scope, extras: &Bindings) -> Result<Value, EvalError> {
    let expr = parse(source)?;
    let value = expr.evaluate(&Environment::new(data, extras))?;
    tracing::trace!(expression = source, value = %value, "evaluated expression");
    Ok(value)
}

/// Parses and evaluates `source` for its side effects, discarding the value.
///
/// # Errors
///
/// Returns an [`EvalError`] if the source fails to parse or evaluation fails.
pub fn execute(source: &str, data: &dyn Scope, extras: &Bindings) -> Result<(), EvalError> {
    evaluate(source, data, extras).map(drop)
}
