//! Symbolic expression interface.
//!
//! Expressions arrive as plain text, are tokenized into a
//! token-addressable form ([`SymbolicExpr`]), edited structurally
//! (renaming, call-argument injection, reused-term substitution), and
//! serialized back to target-language text.

mod ast;
mod parser;
mod symbolic;

pub use ast::{ParseError, Token};
pub use parser::tokenize;
pub use symbolic::SymbolicExpr;
