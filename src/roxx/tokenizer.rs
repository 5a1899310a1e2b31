//! Lexer for targeting expressions.
//!
//! The grammar is deliberately tiny: literals (double-quoted strings, numbers, `true`, `false`,
//! `undefined`), operator names, and call punctuation. There are no infix operators, loops or
//! user-defined functions.

use super::ParseError;

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Double-quoted string literal, escapes resolved.
    String(String),
    /// Number value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// The `undefined` keyword.
    Undefined,
    /// Operator name.
    Identifier(String),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
}

/// A token along with its byte offset in the source expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset.
    pub position: usize,
}

/// Scanner over an expression string.
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Scan `input`.
    pub fn new(input: &'input str) -> Self {
        Tokenizer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Scan the whole input. Stops at the first malformed token.
    pub fn tokenize_all(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Scan the next token. `None` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_whitespace();

        let Some(&ch) = self.bytes.get(self.pos) else {
            return Ok(None);
        };
        let position = self.pos;

        let token = match ch {
            b'(' => {
                self.pos += 1;
                Token::LeftParen
            }
            b')' => {
                self.pos += 1;
                Token::RightParen
            }
            b',' => {
                self.pos += 1;
                Token::Comma
            }
            b'"' => Token::String(self.parse_string()?),
            b'-' | b'0'..=b'9' => Token::Number(self.parse_number()?),
            ch if is_id_start(ch) => match self.parse_identifier() {
                "true" => Token::Boolean(true),
                "false" => Token::Boolean(false),
                "undefined" => Token::Undefined,
                name => Token::Identifier(name.to_owned()),
            },
            _ => {
                return Err(ParseError::UnexpectedCharacter {
                    // The offending byte may be in the middle of a multi-byte character.
                    ch: self.input[position..].chars().next().unwrap_or('\u{fffd}'),
                    position,
                })
            }
        };

        Ok(Some(Spanned { token, position }))
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.bytes.get(self.pos) {
            self.pos += 1;
        }
    }

    fn parse_identifier(&mut self) -> &'input str {
        let start = self.pos;
        while self.bytes.get(self.pos).copied().is_some_and(is_id_continue) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        if self.bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        self.skip_digits();
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            self.skip_digits();
        }

        let literal = &self.input[start..self.pos];
        literal.parse().map_err(|_| ParseError::InvalidNumber {
            literal: literal.to_owned(),
            position: start,
        })
    }

    fn skip_digits(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1; // opening quote

        let mut value = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += offset + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                ch => value.push(ch),
            }
        }

        Err(ParseError::UnterminatedString { position: start })
    }
}

fn is_id_start(ch: u8) -> bool {
    matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'_')
}

fn is_id_continue(ch: u8) -> bool {
    matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.')
}
