use thiserror::Error;
use tidewater_expr::EvalError;

/// Result type used throughout the engine.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Error produced while mounting or driving a component.
#[derive(Debug, Error)]
pub enum Error {
    /// An expression failed to parse or evaluate.
    #[error("failed to evaluate `{expression}`: {source}")]
    Expression {
        /// The expression as written in the attribute.
        expression: String,
        /// The underlying evaluator error.
        #[source]
        source: EvalError,
    },
    /// The data attribute evaluated to something other than an object.
    #[error("`{attribute}` must evaluate to an object, found {found}")]
    DataNotObject {
        /// The attribute name, e.g. `x-data`.
        attribute: String,
        /// The type name of the value it produced.
        found: &'static str,
    },
    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The configured directive prefix cannot form attribute names.
    #[error("invalid directive prefix `{0}`")]
    InvalidPrefix(String),
}

impl Error {
    pub(crate) fn expression(expression: &str, source: EvalError) -> Self {
        Self::Expression {
            expression: expression.to_string(),
            source,
        }
    }
}
