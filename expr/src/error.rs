use thiserror::Error;

/// Error raised while turning source text into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the source.
        offset: usize,
    },
    /// A string literal without its closing quote.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },
    /// A numeric literal that does not form a valid number.
    #[error("invalid number literal `{literal}` at offset {offset}")]
    InvalidNumber {
        /// The literal as written.
        literal: String,
        /// Byte offset into the source.
        offset: usize,
    },
    /// A token that does not fit the grammar at this position.
    #[error("unexpected `{found}` at offset {offset}, expected {expected}")]
    UnexpectedToken {
        /// The token that was found.
        found: String,
        /// What the parser was looking for.
        expected: &'static str,
        /// Byte offset into the source.
        offset: usize,
    },
    /// The source ended in the middle of an expression.
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// The left-hand side of an assignment or update is not a plain identifier.
    #[error("invalid assignment target at offset {offset}")]
    InvalidAssignmentTarget {
        /// Byte offset of the operator.
        offset: usize,
    },
    /// The expression nests deeper than the parser accepts.
    #[error("expression nested too deeply at offset {offset}")]
    TooDeep {
        /// Byte offset of the token where the limit was reached.
        offset: usize,
    },
}

/// Error raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The expression failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An identifier resolved neither in the data scope nor in the extra bindings.
    #[error("`{0}` is not defined")]
    UndefinedVariable(String),
    /// A property was read from `null` or `undefined`.
    #[error("cannot read property `{property}` of {base}")]
    NullishProperty {
        /// The property being read.
        property: String,
        /// Either `null` or `undefined`.
        base: &'static str,
    },
    /// An assignment targeted a per-call extra binding.
    #[error("cannot assign to read-only binding `{0}`")]
    ReadOnlyBinding(String),
}
