//! Token-addressable expression value type.
//!
//! `SymbolicExpr` wraps the token sequence of one symbolic expression
//! and supports the structural edits code generation needs: bulk
//! identifier renaming, call-site argument injection, subsequence
//! replacement for reused-term factoring, and re-serialization with a
//! target-specific exponentiation token.

use std::collections::BTreeMap;

use crate::expr::ast::{ParseError, Token};
use crate::expr::parser::tokenize;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicExpr {
    tokens: Vec<Token>,
}

impl SymbolicExpr {
    /// Parse expression text into a token sequence.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(text)?,
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rename identifiers by whole token. Names absent from the table
    /// are left untouched; substrings of longer identifiers are never
    /// rewritten because matching is per token.
    pub fn map_names(&mut self, renames: &BTreeMap<String, String>) {
        for tok in &mut self.tokens {
            if let Token::Ident(name) = tok {
                if let Some(new) = renames.get(name) {
                    *name = new.clone();
                }
            }
        }
    }

    /// Whether any identifier in the expression equals `name`.
    pub fn references(&self, name: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::Ident(id) if id == name))
    }

    /// Returns the conditional construct this expression contains, if
    /// any: the `if` keyword or a ternary `? :`. The MATLAB target
    /// cannot express either form directly, so generation rejects them.
    pub fn find_conditional(&self) -> Option<&'static str> {
        for tok in &self.tokens {
            match tok {
                Token::Ident(id) if id == "if" => return Some("if"),
                Token::Question => return Some("?:"),
                _ => {}
            }
        }
        None
    }

    /// Replace every non-overlapping occurrence of `needle` (a token
    /// subsequence) with a single identifier token. Returns the number
    /// of replacements made.
    pub fn replace_subsequence(&mut self, needle: &[Token], replacement: &str) -> usize {
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return 0;
        }
        let mut out = Vec::with_capacity(self.tokens.len());
        let mut count = 0;
        let mut i = 0;
        while i < self.tokens.len() {
            if self.tokens[i..].starts_with(needle) {
                out.push(Token::Ident(replacement.to_string()));
                i += needle.len();
                count += 1;
            } else {
                out.push(self.tokens[i].clone());
                i += 1;
            }
        }
        self.tokens = out;
        count
    }

    /// Append `extra` as a final argument to every call of a function
    /// named in `names`. A call site is an identifier token directly
    /// followed by `(`; the insertion happens at the matching `)`, so
    /// nested calls and calls embedded in larger expressions are handled
    /// without any text matching.
    pub fn add_arg_to_calls(&mut self, names: &[String], extra: &str) {
        // (paren depth of the call, token index of its open paren)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        // (token index of the close paren, call had no arguments)
        let mut inserts: Vec<(usize, bool)> = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;
        while i < self.tokens.len() {
            match &self.tokens[i] {
                Token::Ident(n)
                    if names.iter().any(|c| c == n)
                        && matches!(self.tokens.get(i + 1), Some(Token::LParen)) =>
                {
                    depth += 1;
                    stack.push((depth, i + 1));
                    i += 2;
                    continue;
                }
                Token::LParen => depth += 1,
                Token::RParen => {
                    if let Some(&(d, open)) = stack.last() {
                        if d == depth {
                            inserts.push((i, open + 1 == i));
                            stack.pop();
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            i += 1;
        }

        if inserts.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.tokens.len() + 2 * inserts.len());
        let mut pending = inserts.iter().peekable();
        for (idx, tok) in self.tokens.iter().enumerate() {
            if let Some(&&(at, empty)) = pending.peek() {
                if at == idx {
                    if !empty {
                        out.push(Token::Comma);
                    }
                    out.push(Token::Ident(extra.to_string()));
                    pending.next();
                }
            }
            out.push(tok.clone());
        }
        self.tokens = out;
    }

    /// Serialize back to target text, emitting `power_sign` for the
    /// canonical power token. Arithmetic operators are written without
    /// surrounding spaces; argument separators as `", "`.
    pub fn to_code(&self, power_sign: &str) -> String {
        let mut out = String::new();
        for tok in &self.tokens {
            if tok.is_wordy() && out.ends_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                out.push(' ');
            }
            match tok {
                Token::Num(s) => out.push_str(s),
                Token::Ident(s) => out.push_str(s),
                Token::Op('^') => out.push_str(power_sign),
                Token::Op(c) => out.push(*c),
                Token::LParen => out.push('('),
                Token::RParen => out.push(')'),
                Token::Comma => out.push_str(", "),
                Token::Assign => out.push_str(" = "),
                Token::Semicolon => out.push(';'),
                Token::Lt => out.push('<'),
                Token::Gt => out.push('>'),
                Token::Le => out.push_str("<="),
                Token::Ge => out.push_str(">="),
                Token::EqEq => out.push_str("=="),
                Token::Ne => out.push_str("!="),
                Token::And => out.push_str("&&"),
                Token::Or => out.push_str("||"),
                Token::Bang => out.push('!'),
                Token::Question => out.push('?'),
                Token::Colon => out.push(':'),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> SymbolicExpr {
        SymbolicExpr::parse(s).unwrap()
    }

    #[test]
    fn round_trips_with_power_sign() {
        assert_eq!(expr("a * x ** 2").to_code("^"), "a*x^2");
        assert_eq!(expr("a*x^2").to_code("**"), "a*x**2");
    }

    #[test]
    fn map_names_is_whole_token() {
        let mut e = expr("x + xx + f(x)");
        let renames = BTreeMap::from([("x".to_string(), "x__".to_string())]);
        e.map_names(&renames);
        assert_eq!(e.to_code("^"), "x__+xx+f(x__)");
    }

    #[test]
    fn injects_argument_into_named_calls() {
        let mut e = expr("f(x)+1");
        e.add_arg_to_calls(&["f".to_string()], "p_");
        assert_eq!(e.to_code("^"), "f(x, p_)+1");
    }

    #[test]
    fn injects_into_nested_and_empty_calls() {
        let mut e = expr("f(g(a+b), h()) + g(2)");
        let names = vec!["f".to_string(), "g".to_string(), "h".to_string()];
        e.add_arg_to_calls(&names, "p_");
        assert_eq!(e.to_code("^"), "f(g(a+b, p_), h(p_), p_)+g(2, p_)");
    }

    #[test]
    fn does_not_touch_other_calls() {
        let mut e = expr("sin(x) + f(x)");
        e.add_arg_to_calls(&["f".to_string()], "p_");
        assert_eq!(e.to_code("^"), "sin(x)+f(x, p_)");
    }

    #[test]
    fn detects_conditionals() {
        assert_eq!(expr("if(x>0, 1, 2)").find_conditional(), Some("if"));
        assert_eq!(expr("x > 0 ? 1 : 2").find_conditional(), Some("?:"));
        assert_eq!(expr("a*x").find_conditional(), None);
    }

    #[test]
    fn replaces_token_subsequences() {
        let mut e = expr("(a+b)*c + (a + b)");
        let needle = expr("a+b");
        let n = e.replace_subsequence(needle.tokens(), "w0");
        assert_eq!(n, 2);
        assert_eq!(e.to_code("^"), "(w0)*c+(w0)");
    }
}
