//! Turns a line of Tourmaline source into a flat sequence of string
//! tokens. Newlines are not tokens: the statement executor recovers line
//! boundaries by splitting the original source on `\n`, so lexing a
//! single line (or a full program, callers just concatenate the result)
//! is well defined either way.

use std::iter::Peekable;
use std::str::Chars;

use log::trace;

use crate::error::TourmalineError;

const SINGLE_CHAR: &[char] = &['(', ')', '[', ']', '{', '}', ',', ':'];
const OPERATOR_CHARS: &[char] = &['=', '!', '<', '>', '+', '-', '*', '/', '%'];
const TWO_CHAR_OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=",
];

struct Lexer<'a> {
    iterator: Peekable<Chars<'a>>,
    tokens: Vec<String>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            iterator: source.chars().peekable(),
            tokens: Vec::new(),
            line: 1,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.iterator.peek()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.iterator.next();
        if next == Some('\n') {
            self.line += 1;
        }
        next
    }

    fn lex(mut self) -> Result<Vec<String>, TourmalineError> {
        while let Some(&next) = self.peek() {
            if next.is_whitespace() {
                self.bump();
                continue;
            }

            if next == '"' || next == '\'' {
                self.lex_string(next)?;
                continue;
            }

            if SINGLE_CHAR.contains(&next) {
                self.bump();
                self.tokens.push(next.to_string());
                continue;
            }

            if OPERATOR_CHARS.contains(&next) {
                self.lex_operator();
                continue;
            }

            if next == '.' {
                self.lex_dot();
                continue;
            }

            self.lex_word();
        }

        trace!("lexed {} tokens: {:?}", self.tokens.len(), self.tokens);
        Ok(self.tokens)
    }

    fn lex_string(&mut self, quote: char) -> Result<(), TourmalineError> {
        let start_line = self.line;
        let mut literal = String::new();
        literal.push(self.bump().expect("caller peeked the opening quote"));

        loop {
            match self.bump() {
                Some('\\') => {
                    literal.push('\\');
                    if let Some(escaped) = self.bump() {
                        literal.push(escaped);
                    }
                }
                Some(c) if c == quote => {
                    literal.push(c);
                    self.tokens.push(literal);
                    return Ok(());
                }
                Some(c) => literal.push(c),
                None => {
                    return Err(TourmalineError::Lexical(format!(
                        "unterminated string literal starting on line {start_line}"
                    )))
                }
            }
        }
    }

    fn lex_operator(&mut self) {
        let first = self.bump().expect("caller peeked an operator char");
        if let Some(&second) = self.peek() {
            let candidate: String = [first, second].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&candidate.as_str()) {
                self.bump();
                self.tokens.push(candidate);
                return;
            }
        }
        self.tokens.push(first.to_string());
    }

    fn lex_dot(&mut self) {
        let starts_digit = self
            .tokens
            .last()
            .and_then(|t| t.chars().next())
            .is_some_and(|c| c.is_ascii_digit());

        if starts_digit {
            if let Some(last) = self.tokens.last_mut() {
                last.push('.');
                self.bump();
                return;
            }
        }

        self.bump();
        self.tokens.push(".".to_string());
    }

    fn lex_word(&mut self) {
        let mut word = String::new();
        while let Some(&next) = self.peek() {
            if next.is_whitespace()
                || SINGLE_CHAR.contains(&next)
                || OPERATOR_CHARS.contains(&next)
                || next == '.'
                || next == '"'
                || next == '\''
            {
                break;
            }
            word.push(next);
            self.bump();
        }
        self.tokens.push(word);
    }
}

/// Lex a single logical line (or a whole multi-line snippet — only
/// newlines-as-whitespace matter here, statement splitting happens
/// upstream) into a flat token vector.
pub fn lex(source: &str) -> Result<Vec<String>, TourmalineError> {
    Lexer::new(source).lex()
}

pub fn is_string_literal(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some('"') | Some('\'') => token.len() >= 2,
        _ => false,
    }
}

/// Strip the surrounding quotes and interpret `\n`/`\t` escapes: the lexer
/// preserves the delimiters, the value parser interprets escapes.
pub fn unquote(token: &str) -> String {
    let inner = &token[1..token.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('t') => {
                    out.push('\t');
                    chars.next();
                }
                Some(&other) => {
                    out.push(other);
                    chars.next();
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_simple_declaration() {
        assert_eq!(
            lex("let x = 2 + 3 * 4").unwrap(),
            vec!["let", "x", "=", "2", "+", "3", "*", "4"]
        );
    }

    #[test]
    fn lexes_string_literal_with_delimiters_included() {
        assert_eq!(lex(r#"let s = "a" + "b""#).unwrap()[3], "\"a\"");
    }

    #[test]
    fn lexes_two_char_operators() {
        assert_eq!(lex("i += 1").unwrap(), vec!["i", "+=", "1"]);
        assert_eq!(lex("a == b").unwrap(), vec!["a", "==", "b"]);
        assert_eq!(lex("a<=b").unwrap(), vec!["a", "<=", "b"]);
    }

    #[test]
    fn dot_is_decimal_point_after_digit_and_member_access_otherwise() {
        assert_eq!(lex("3.14").unwrap(), vec!["3.14"]);
        assert_eq!(lex("m.key").unwrap(), vec!["m", ".", "key"]);
    }

    #[test]
    fn unterminated_string_is_a_lexical_error() {
        assert!(matches!(lex("\"oops"), Err(TourmalineError::Lexical(_))));
    }

    #[test]
    fn structural_punctuation_always_splits_tokens() {
        assert_eq!(
            lex("f(a,b)").unwrap(),
            vec!["f", "(", "a", ",", "b", ")"]
        );
    }

    #[test]
    fn unquote_interprets_newline_and_tab_escapes() {
        assert_eq!(unquote("\"a\\nb\\tc\""), "a\nb\tc");
    }
}
