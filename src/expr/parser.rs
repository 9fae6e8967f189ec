//! Tokenizer for symbolic expression text.
//!
//! Whitespace-insensitive; both `^` and `**` are accepted for
//! exponentiation and normalized to a single power token. Unknown
//! characters are an error: a code generator must never silently drop
//! part of its input.

use crate::expr::ast::{ParseError, Token};

pub fn tokenize(s: &str) -> Result<Vec<Token>, ParseError> {
    let mut toks = Vec::new();
    let mut chars = s.char_indices().peekable();
    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let mut num = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit()
                    || d == '.'
                    || d == 'e'
                    || d == 'E'
                    || ((d == '+' || d == '-') && (num.ends_with('e') || num.ends_with('E')))
                {
                    num.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if num.parse::<f64>().is_err() {
                return Err(ParseError::new(
                    pos,
                    format!("malformed numeric literal '{}'", num),
                ));
            }
            toks.push(Token::Num(num));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut id = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    id.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            toks.push(Token::Ident(id));
            continue;
        }
        match c {
            '(' => {
                toks.push(Token::LParen);
                chars.next();
            }
            ')' => {
                toks.push(Token::RParen);
                chars.next();
            }
            ',' => {
                toks.push(Token::Comma);
                chars.next();
            }
            ';' => {
                toks.push(Token::Semicolon);
                chars.next();
            }
            '?' => {
                toks.push(Token::Question);
                chars.next();
            }
            ':' => {
                toks.push(Token::Colon);
                chars.next();
            }
            '+' | '-' | '/' => {
                toks.push(Token::Op(c));
                chars.next();
            }
            '*' => {
                chars.next();
                if let Some(&(_, '*')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Op('^'));
                } else {
                    toks.push(Token::Op('*'));
                }
            }
            '^' => {
                toks.push(Token::Op('^'));
                chars.next();
            }
            '<' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Le);
                } else {
                    toks.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Ge);
                } else {
                    toks.push(Token::Gt);
                }
            }
            '=' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    toks.push(Token::EqEq);
                } else {
                    toks.push(Token::Assign);
                }
            }
            '!' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Ne);
                } else {
                    toks.push(Token::Bang);
                }
            }
            '&' => {
                chars.next();
                if let Some(&(_, '&')) = chars.peek() {
                    chars.next();
                    toks.push(Token::And);
                } else {
                    return Err(ParseError::new(pos, "single '&' is not an operator"));
                }
            }
            '|' => {
                chars.next();
                if let Some(&(_, '|')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Or);
                } else {
                    return Err(ParseError::new(pos, "single '|' is not an operator"));
                }
            }
            _ => {
                return Err(ParseError::new(
                    pos,
                    format!("unexpected character '{}'", c),
                ));
            }
        }
    }
    Ok(toks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_arithmetic() {
        let toks = tokenize("a*x + b_2/3.5").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Ident("a".into()),
                Token::Op('*'),
                Token::Ident("x".into()),
                Token::Op('+'),
                Token::Ident("b_2".into()),
                Token::Op('/'),
                Token::Num("3.5".into()),
            ]
        );
    }

    #[test]
    fn double_star_becomes_power() {
        assert_eq!(tokenize("x**2").unwrap(), tokenize("x^2").unwrap());
    }

    #[test]
    fn keeps_scientific_notation_lexeme() {
        let toks = tokenize("1e-10").unwrap();
        assert_eq!(toks, vec![Token::Num("1e-10".into())]);
    }

    #[test]
    fn rejects_malformed_number() {
        let err = tokenize("1.2.3").unwrap_err();
        assert!(err.message.contains("malformed"));
    }

    #[test]
    fn rejects_unknown_character() {
        let err = tokenize("a $ b").unwrap_err();
        assert_eq!(err.pos, 2);
    }
}
