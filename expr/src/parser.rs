//! Recursive-descent parser producing [`Expr`] trees.

use crate::{
    ParseError, Value,
    lexer::{Punct, Token, TokenKind, tokenize},
};

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!value`
    Not,
    /// `-value`
    Negate,
    /// `+value`
    Plus,
}

/// Arithmetic, comparison and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`, numeric addition or string concatenation.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Assignment operators. Compound forms apply their [`BinaryOp`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `op=`
    Compound(BinaryOp),
}

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// A bare name resolved against the evaluation environment.
    Identifier(String),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `{ key: value }`, entries in source order.
    Object(Vec<(String, Expr)>),
    /// `object.property`
    Member {
        /// The expression being accessed.
        object: Box<Expr>,
        /// The property name.
        property: String,
    },
    /// `object[index]`
    Index {
        /// The expression being accessed.
        object: Box<Expr>,
        /// The computed key.
        index: Box<Expr>,
    },
    /// A prefix operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// `++name`, `name++`, `--name` or `name--`.
    Update {
        /// Increment or decrement.
        op: UpdateOp,
        /// Whether the operator was written before the name.
        prefix: bool,
        /// The updated identifier.
        target: String,
    },
    /// A binary operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `&&` or `||`.
    Logical {
        /// The operator.
        op: LogicalOp,
        /// Left operand, always evaluated.
        left: Box<Expr>,
        /// Right operand, evaluated only when needed.
        right: Box<Expr>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// The condition.
        test: Box<Expr>,
        /// Evaluated when the condition is truthy.
        consequent: Box<Expr>,
        /// Evaluated otherwise.
        alternate: Box<Expr>,
    },
    /// `target = value` and its compound forms.
    Assign {
        /// The operator.
        op: AssignOp,
        /// The assigned identifier.
        target: String,
        /// The right-hand side.
        value: Box<Expr>,
    },
}

/// Parses a single expression, optionally followed by semicolons.
///
/// # Errors
///
/// Returns a [`ParseError`] if the source is not a single well-formed expression.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_assignment()?;
    while parser.eat(Punct::Semicolon) {}
    if let Some(token) = parser.peek() {
        return Err(unexpected(token, "end of expression"));
    }
    Ok(expr)
}

/// Deepest nesting of sub-expressions and operator chains the parser accepts.
pub const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

type ParseResult = Result<Expr, ParseError>;

const EQUALITY: &[(Punct, BinaryOp)] = &[
    (Punct::EqEqEq, BinaryOp::StrictEq),
    (Punct::NotEqEq, BinaryOp::StrictNe),
    (Punct::EqEq, BinaryOp::LooseEq),
    (Punct::NotEq, BinaryOp::LooseNe),
];

const RELATIONAL: &[(Punct, BinaryOp)] = &[
    (Punct::Lt, BinaryOp::Lt),
    (Punct::Le, BinaryOp::Le),
    (Punct::Gt, BinaryOp::Gt),
    (Punct::Ge, BinaryOp::Ge),
];

const ADDITIVE: &[(Punct, BinaryOp)] = &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)];

const MULTIPLICATIVE: &[(Punct, BinaryOp)] = &[
    (Punct::Star, BinaryOp::Mul),
    (Punct::Slash, BinaryOp::Div),
    (Punct::Percent, BinaryOp::Rem),
];

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self) -> Option<Punct> {
        match self.peek()?.kind {
            TokenKind::Punct(punct) => Some(punct),
            _ => None,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct, expected: &'static str) -> Result<(), ParseError> {
        let token = self.next(expected)?;
        if token.kind == TokenKind::Punct(punct) {
            Ok(())
        } else {
            Err(unexpected(&token, expected))
        }
    }

    /// Claims one level of nesting, failing once [`MAX_DEPTH`] is reached.
    ///
    /// Callers restore `depth` themselves when the nested construct is done.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            let offset = self
                .peek()
                .or_else(|| self.tokens.last())
                .map_or(0, |token| token.offset);
            return Err(ParseError::TooDeep { offset });
        }
        self.depth += 1;
        Ok(())
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult) -> ParseResult {
        let depth = self.depth;
        self.descend()?;
        let expr = parse(self)?;
        self.depth = depth;
        Ok(expr)
    }

    fn parse_assignment(&mut self) -> ParseResult {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult {
        let left = self.parse_conditional()?;

        let op = match self.peek_punct() {
            Some(Punct::Assign) => AssignOp::Assign,
            Some(Punct::PlusAssign) => AssignOp::Compound(BinaryOp::Add),
            Some(Punct::MinusAssign) => AssignOp::Compound(BinaryOp::Sub),
            Some(Punct::StarAssign) => AssignOp::Compound(BinaryOp::Mul),
            Some(Punct::SlashAssign) => AssignOp::Compound(BinaryOp::Div),
            Some(Punct::PercentAssign) => AssignOp::Compound(BinaryOp::Rem),
            _ => return Ok(left),
        };
        let offset = self.tokens[self.pos].offset;
        self.pos += 1;

        let Expr::Identifier(target) = left else {
            return Err(ParseError::InvalidAssignmentTarget { offset });
        };
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target,
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> ParseResult {
        let test = self.parse_logical(LogicalOp::Or)?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(Punct::Colon, "`:`")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical(&mut self, op: LogicalOp) -> ParseResult {
        let depth = self.depth;
        let (punct, mut left) = match op {
            LogicalOp::Or => (Punct::OrOr, self.parse_logical(LogicalOp::And)?),
            LogicalOp::And => (Punct::AndAnd, self.parse_binary(0)?),
        };
        while self.eat(punct) {
            self.descend()?;
            let right = match op {
                LogicalOp::Or => self.parse_logical(LogicalOp::And)?,
                LogicalOp::And => self.parse_binary(0)?,
            };
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    /// Parses the left-associative binary levels, loosest first.
    fn parse_binary(&mut self, level: usize) -> ParseResult {
        const LEVELS: [&[(Punct, BinaryOp)]; 4] = [EQUALITY, RELATIONAL, ADDITIVE, MULTIPLICATIVE];

        let Some(operators) = LEVELS.get(level) else {
            return self.parse_unary();
        };

        let depth = self.depth;
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek_punct().and_then(|punct| {
            operators
                .iter()
                .find(|(candidate, _)| *candidate == punct)
                .map(|(_, op)| *op)
        }) {
            self.pos += 1;
            self.descend()?;
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult {
        let op = match self.peek_punct() {
            Some(Punct::Bang) => UnaryOp::Not,
            Some(Punct::Minus) => UnaryOp::Negate,
            Some(Punct::Plus) => UnaryOp::Plus,
            Some(punct @ (Punct::PlusPlus | Punct::MinusMinus)) => {
                let offset = self.tokens[self.pos].offset;
                self.pos += 1;
                let Expr::Identifier(target) = self.nested(Self::parse_unary)? else {
                    return Err(ParseError::InvalidAssignmentTarget { offset });
                };
                return Ok(Expr::Update {
                    op: update_op(punct),
                    prefix: true,
                    target,
                });
            }
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult {
        let expr = self.parse_member()?;
        let Some(punct @ (Punct::PlusPlus | Punct::MinusMinus)) = self.peek_punct() else {
            return Ok(expr);
        };
        let offset = self.tokens[self.pos].offset;
        self.pos += 1;
        let Expr::Identifier(target) = expr else {
            return Err(ParseError::InvalidAssignmentTarget { offset });
        };
        Ok(Expr::Update {
            op: update_op(punct),
            prefix: false,
            target,
        })
    }

    fn parse_member(&mut self) -> ParseResult {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(Punct::Dot) {
                self.descend()?;
                let token = self.next("property name")?;
                let TokenKind::Ident(property) = token.kind else {
                    return Err(unexpected(&token, "property name"));
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat(Punct::LBracket) {
                self.descend()?;
                let index = self.parse_assignment()?;
                self.expect(Punct::RBracket, "`]`")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.depth = depth;
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult {
        let token = self.next("expression")?;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            TokenKind::String(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                _ => Expr::Identifier(name),
            }),
            TokenKind::Punct(Punct::LParen) => {
                let expr = self.parse_assignment()?;
                self.expect(Punct::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => self.parse_array(),
            TokenKind::Punct(Punct::LBrace) => self.parse_object(),
            _ => Err(unexpected(&token, "expression")),
        }
    }

    fn parse_array(&mut self) -> ParseResult {
        let mut elements = Vec::new();
        while !self.eat(Punct::RBracket) {
            elements.push(self.parse_assignment()?);
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBracket, "`,` or `]`")?;
                break;
            }
        }
        Ok(Expr::Array(elements))
    }

    fn parse_object(&mut self) -> ParseResult {
        let mut entries = Vec::new();
        while !self.eat(Punct::RBrace) {
            let token = self.next("property key")?;
            let key = match token.kind {
                TokenKind::Ident(name) | TokenKind::String(name) => name,
                TokenKind::Number(n) => Value::Number(n).to_string(),
                TokenKind::Punct(_) => return Err(unexpected(&token, "property key")),
            };
            self.expect(Punct::Colon, "`:`")?;
            let value = self.parse_assignment()?;
            entries.push((key, value));
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBrace, "`,` or `}`")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

const fn update_op(punct: Punct) -> UpdateOp {
    if matches!(punct, Punct::PlusPlus) {
        UpdateOp::Increment
    } else {
        UpdateOp::Decrement
    }
}

fn unexpected(token: &Token, expected: &'static str) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.kind.to_string(),
        expected,
        offset: token.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.to_string()))
    }

    fn number(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("a + b * 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: number(2.0),
                }),
            }
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            parse("a - b - c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: ident("a"),
                    right: ident("b"),
                }),
                right: ident("c"),
            }
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(
            parse("a = b = 1").unwrap(),
            Expr::Assign {
                op: AssignOp::Assign,
                target: "a".into(),
                value: Box::new(Expr::Assign {
                    op: AssignOp::Assign,
                    target: "b".into(),
                    value: number(1.0),
                }),
            }
        );
    }

    #[test]
    fn test_command_expression() {
        assert_eq!(
            parse("count = count + 1").unwrap(),
            Expr::Assign {
                op: AssignOp::Assign,
                target: "count".into(),
                value: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: ident("count"),
                    right: number(1.0),
                }),
            }
        );
        assert_eq!(
            parse("count += 2;").unwrap(),
            Expr::Assign {
                op: AssignOp::Compound(BinaryOp::Add),
                target: "count".into(),
                value: number(2.0),
            }
        );
    }

    #[test]
    fn test_update_forms() {
        assert_eq!(
            parse("count++").unwrap(),
            Expr::Update {
                op: UpdateOp::Increment,
                prefix: false,
                target: "count".into(),
            }
        );
        assert_eq!(
            parse("--count").unwrap(),
            Expr::Update {
                op: UpdateOp::Decrement,
                prefix: true,
                target: "count".into(),
            }
        );
    }

    #[test]
    fn test_object_literal_with_trailing_comma() {
        assert_eq!(
            parse("{ count: 0, 'label': 'hi', }").unwrap(),
            Expr::Object(vec![
                ("count".into(), Expr::Literal(Value::Number(0.0))),
                ("label".into(), Expr::Literal(Value::String("hi".into()))),
            ])
        );
        assert_eq!(parse("{}").unwrap(), Expr::Object(Vec::new()));
    }

    #[test]
    fn test_member_and_index_chain() {
        assert_eq!(
            parse("user.tags[0]").unwrap(),
            Expr::Index {
                object: Box::new(Expr::Member {
                    object: ident("user"),
                    property: "tags".into(),
                }),
                index: number(0.0),
            }
        );
    }

    #[test]
    fn test_conditional_and_logical() {
        assert!(matches!(
            parse("open && !busy ? 'yes' : 'no'").unwrap(),
            Expr::Conditional { .. }
        ));
    }

    #[test]
    fn test_invalid_assignment_targets() {
        assert_eq!(
            parse("a + b = 1"),
            Err(ParseError::InvalidAssignmentTarget { offset: 6 })
        );
        assert_eq!(
            parse("user.name = 'x'"),
            Err(ParseError::InvalidAssignmentTarget { offset: 10 })
        );
        assert_eq!(
            parse("1++"),
            Err(ParseError::InvalidAssignmentTarget { offset: 1 })
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(
            parse(""),
            Err(ParseError::UnexpectedEnd {
                expected: "expression"
            })
        );
        assert_eq!(
            parse("count +"),
            Err(ParseError::UnexpectedEnd {
                expected: "expression"
            })
        );
        assert!(matches!(
            parse("a b"),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
        assert!(matches!(
            parse("(a"),
            Err(ParseError::UnexpectedEnd { expected: "`)`" })
        ));
    }

    fn wrapped(open: &str, inner: &str, close: &str, depth: usize) -> String {
        format!("{}{inner}{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        assert_eq!(
            parse(&wrapped("(", "1", ")", 200)),
            Err(ParseError::TooDeep { offset: 64 })
        );
        assert!(matches!(
            parse(&wrapped("!", "x", "", 200)),
            Err(ParseError::TooDeep { .. })
        ));
        assert!(matches!(
            parse(&wrapped("- ", "x", "", 200)),
            Err(ParseError::TooDeep { .. })
        ));
        assert!(matches!(
            parse(&wrapped("[", "", "]", 200)),
            Err(ParseError::TooDeep { .. })
        ));
        assert!(matches!(
            parse(&wrapped("{a:", "1", "}", 200)),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_long_operator_chains_are_rejected() {
        let sum = format!("1{}", " + 1".repeat(200));
        assert!(matches!(parse(&sum), Err(ParseError::TooDeep { .. })));

        let path = format!("a{}", ".b".repeat(200));
        assert!(matches!(parse(&path), Err(ParseError::TooDeep { .. })));

        let either = format!("a{}", " || a".repeat(200));
        assert!(matches!(parse(&either), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        assert_eq!(parse(&wrapped("(", "1", ")", 50)).unwrap(), *number(1.0));
        assert!(parse(&wrapped("!", "x", "", 50)).is_ok());
        assert!(parse(&wrapped("[", "", "]", 50)).is_ok());
        assert!(parse(&format!("1{}", " + 1".repeat(40))).is_ok());

        // Depth is released once a nested construct closes.
        let siblings = vec![wrapped("(", "1", ")", 40); 10].join(" + ");
        assert!(parse(&siblings).is_ok());
    }
}
