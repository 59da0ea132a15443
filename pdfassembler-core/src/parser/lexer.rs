//! PDF Lexer
//!
//! Splits raw bytes into lexical tokens. The tokenizer is total: malformed
//! input degrades into delimiter or keyword tokens, and unterminated strings
//! consume the rest of the buffer instead of failing. Callers decide what a
//! token sequence means.

use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"(?-u)^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)$")
        .expect("BUG: invalid NUMBER regex literal");
}

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Stray delimiter byte: `{`, `}`, `)` or a lone `>`
    Delimiter(u8),

    /// Name object with `#xx` escapes decoded (e.g., /Type)
    Name(String),

    /// Literal string `( ... )` after escape processing
    LiteralString(Vec<u8>),

    /// Hexadecimal string `< ... >`
    HexString(Vec<u8>),

    Integer(i64),

    Real(f64),

    Boolean(bool),

    Null,

    /// Any other bare word: operators, `obj`, `R`, `stream`, ...
    Keyword(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,
}

impl Token {
    /// Numeric value of an integer or real token.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Integer(i) => Some(*i as f64),
            Token::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self, Token::Keyword(k) if k == word)
    }
}

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\0' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r' | b' ')
}

pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Byte-slice tokenizer. Yields tokens until the input is exhausted.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            if is_whitespace(ch) {
                self.position += 1;
            } else if ch == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.position += 1;
                }
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> Token {
        self.position += 1; // Skip '/'
        let mut bytes = Vec::new();

        while let Some(ch) = self.peek() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
            if ch == b'#' {
                let escaped = self
                    .peek()
                    .and_then(hex_value)
                    .zip(self.peek_next().and_then(hex_value));
                if let Some((hi, lo)) = escaped {
                    self.position += 2;
                    bytes.push((hi << 4) | lo);
                    continue;
                }
            }
            bytes.push(ch);
        }

        Token::Name(crate::objects::decode_latin1(&bytes))
    }

    fn read_literal_string(&mut self) -> Token {
        self.position += 1; // Skip opening '('
        let mut result = Vec::new();
        let mut depth = 1usize;

        while let Some(ch) = self.peek() {
            self.position += 1;
            match ch {
                b'\\' => {
                    let Some(esc) = self.peek() else { break };
                    self.position += 1;
                    match esc {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(b'\x08'),
                        b'f' => result.push(b'\x0C'),
                        b'0'..=b'7' => {
                            let mut value = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + (d - b'0') as u32;
                                        self.position += 1;
                                    }
                                    _ => break,
                                }
                            }
                            result.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.position += 1;
                            }
                        }
                        b'\n' => {}
                        other => result.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    result.push(ch);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        Token::LiteralString(result)
    }

    fn read_hex_string(&mut self) -> Token {
        self.position += 1; // Skip opening '<'
        let mut result = Vec::new();
        let mut nibble: Option<u8> = None;

        while let Some(ch) = self.peek() {
            self.position += 1;
            if ch == b'>' {
                break;
            }
            if let Some(digit) = hex_value(ch) {
                match nibble.take() {
                    Some(hi) => result.push((hi << 4) | digit),
                    None => nibble = Some(digit),
                }
            }
        }

        if let Some(hi) = nibble {
            result.push(hi << 4);
        }
        Token::HexString(result)
    }

    fn read_bare(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }
        classify(&self.input[start..self.position])
    }
}

/// Classifies a bare run of regular bytes.
fn classify(word: &[u8]) -> Token {
    if NUMBER.is_match(word) {
        // The pattern is pure ASCII, so the run is valid UTF-8 here.
        let text = String::from_utf8_lossy(word);
        if !word.contains(&b'.') {
            if let Ok(value) = text.parse::<i64>() {
                return Token::Integer(value);
            }
        }
        if let Ok(value) = text.parse::<f64>() {
            return Token::Real(value);
        }
    }

    match word {
        b"true" => Token::Boolean(true),
        b"false" => Token::Boolean(false),
        b"null" => Token::Null,
        _ => Token::Keyword(crate::objects::decode_latin1(word)),
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let ch = self.peek()?;

        let token = match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.peek_next() == Some(b'<') {
                    self.position += 2;
                    Token::DictStart
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'>') {
                    self.position += 2;
                    Token::DictEnd
                } else {
                    self.position += 1;
                    Token::Delimiter(b'>')
                }
            }
            b'[' => {
                self.position += 1;
                Token::ArrayStart
            }
            b']' => {
                self.position += 1;
                Token::ArrayEnd
            }
            b'{' | b'}' | b')' => {
                self.position += 1;
                Token::Delimiter(ch)
            }
            _ => self.read_bare(),
        };

        Some(token)
    }
}

/// Tokenizes a whole buffer.
pub fn tokenize(input: &[u8]) -> Vec<Token> {
    Tokenizer::new(input).collect()
}
