//! Tree-walking evaluation against an explicit name-resolution environment.

use core::cell::RefCell;
use core::cmp::Ordering;

use crate::{
    EvalError, Value,
    parser::{AssignOp, BinaryOp, Expr, LogicalOp, UnaryOp, UpdateOp},
    value::Map,
};

/// Per-call variables visible to an expression in addition to its data scope.
pub type Bindings = Map;

/// Mutable data context whose properties resolve as bare identifiers.
///
/// Implementors decide what a write means; the binding engine uses this seam to
/// observe every assignment an expression performs.
pub trait Scope {
    /// Reads a property.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Writes a property.
    ///
    /// # Errors
    ///
    /// Implementors may refuse the write.
    fn assign(&self, name: &str, value: Value) -> Result<(), EvalError>;

    /// Returns `true` if the property exists.
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// A plain, unobserved scope.
impl Scope for RefCell<Map> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.borrow().get(name).cloned()
    }

    fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.borrow().contains_key(name)
    }
}

/// Name resolution environment: the data scope first, then the extra bindings.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    data: &'a dyn Scope,
    extras: &'a Bindings,
}

impl<'a> Environment<'a> {
    /// Creates an environment over a data scope and per-call extra bindings.
    #[must_use]
    pub const fn new(data: &'a dyn Scope, extras: &'a Bindings) -> Self {
        Self { data, extras }
    }

    fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        self.data
            .lookup(name)
            .or_else(|| self.extras.get(name).cloned())
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    /// Writes go to the data scope; names that only exist as extra bindings are read-only.
    fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if !self.data.contains(name) && self.extras.contains_key(name) {
            return Err(EvalError::ReadOnlyBinding(name.to_string()));
        }
        self.data.assign(name, value)
    }
}

impl core::fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Environment")
            .field("extras", self.extras)
            .finish_non_exhaustive()
    }
}

impl Expr {
    /// Evaluates the expression.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] on undefined names, property reads on `null`/`undefined`
    /// and writes to read-only bindings.
    pub fn evaluate(&self, env: &Environment<'_>) -> Result<Value, EvalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Identifier(name) => env.resolve(name),
            Self::Array(items) => items
                .iter()
                .map(|item| item.evaluate(env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Self::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), value.evaluate(env)?);
                }
                Ok(Value::Object(map))
            }
            Self::Member { object, property } => {
                let base = object.evaluate(env)?;
                read_property(&base, property)
            }
            Self::Index { object, index } => {
                let base = object.evaluate(env)?;
                let key = index.evaluate(env)?.to_string();
                read_property(&base, &key)
            }
            Self::Unary { op, operand } => {
                let value = operand.evaluate(env)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                })
            }
            Self::Update { op, prefix, target } => {
                let old = env.resolve(target)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                env.assign(target, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Self::Binary { op, left, right } => {
                let left = left.evaluate(env)?;
                let right = right.evaluate(env)?;
                Ok(apply_binary(*op, &left, &right))
            }
            Self::Logical { op, left, right } => {
                let left = left.evaluate(env)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => right.evaluate(env),
                }
            }
            Self::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if test.evaluate(env)?.is_truthy() {
                    consequent.evaluate(env)
                } else {
                    alternate.evaluate(env)
                }
            }
            Self::Assign { op, target, value } => {
                let value = match op {
                    AssignOp::Assign => value.evaluate(env)?,
                    AssignOp::Compound(binary) => {
                        let current = env.resolve(target)?;
                        let rhs = value.evaluate(env)?;
                        apply_binary(*binary, &current, &rhs)
                    }
                };
                env.assign(target, value.clone())?;
                Ok(value)
            }
        }
    }
}

fn read_property(base: &Value, property: &str) -> Result<Value, EvalError> {
    base.property(property)
        .ok_or_else(|| EvalError::NullishProperty {
            property: property.to_string(),
            base: base.type_name(),
        })
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let ordered = |accept: fn(Ordering) -> bool| Value::Bool(left.compare(right).is_some_and(accept));

    match op {
        BinaryOp::Add => {
            if is_stringy(left) || is_stringy(right) {
                Value::String(format!("{left}{right}"))
            } else {
                numeric(|a, b| a + b)
            }
        }
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt => ordered(Ordering::is_lt),
        BinaryOp::Le => ordered(Ordering::is_le),
        BinaryOp::Gt => ordered(Ordering::is_gt),
        BinaryOp::Ge => ordered(Ordering::is_ge),
        BinaryOp::LooseEq => Value::Bool(left.loose_equals(right)),
        BinaryOp::LooseNe => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
    }
}

/// Strings, arrays and objects concatenate under `+`.
const fn is_stringy(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Array(_) | Value::Object(_)
    )
}
