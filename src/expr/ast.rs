// Token types for the symbolic expression layer
use thiserror::Error;

/// A single lexical token of a symbolic expression.
///
/// Numbers keep their original lexeme so that generated code reproduces
/// the author's literal (`1e-10` must not come back as `0.0000000001`).
/// Exponentiation is stored canonically as `Op('^')` regardless of
/// whether the source wrote `^` or `**`; the target's own power token is
/// chosen at serialization time.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(String),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
    Assign,
    Semicolon,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    And,
    Or,
    Bang,
    Question,
    Colon,
}

impl Token {
    /// Whether this token serializes to identifier-like text (so two of
    /// them in a row need a separating space).
    pub(crate) fn is_wordy(&self) -> bool {
        matches!(self, Token::Num(_) | Token::Ident(_))
    }
}

/// Error produced while tokenizing an expression string.
#[derive(Debug, Clone, Error)]
#[error("invalid expression at offset {pos}: {message}")]
pub struct ParseError {
    /// Byte offset of the offending input.
    pub pos: usize,
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}
