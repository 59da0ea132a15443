//! PDF Object Parser
//!
//! Builds [`Object`] values from a token stream. The same grammar serves
//! indirect object bodies, stream headers and the trailer dictionary.

use super::lexer::{Token, Tokenizer};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId, PdfString};
use std::collections::VecDeque;

/// Token source with two tokens of lookahead, enough to recognise `n g R`.
pub struct TokenCursor<I: Iterator<Item = Token>> {
    tokens: I,
    lookahead: VecDeque<Token>,
}

impl<'a> TokenCursor<Tokenizer<'a>> {
    pub fn from_bytes(input: &'a [u8]) -> Self {
        Self::new(Tokenizer::new(input))
    }
}

impl<I: Iterator<Item = Token>> TokenCursor<I> {
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            lookahead: VecDeque::with_capacity(2),
        }
    }

    /// Looks `n` tokens ahead without consuming anything.
    pub fn peek(&mut self, n: usize) -> Option<&Token> {
        while self.lookahead.len() <= n {
            let token = self.tokens.next()?;
            self.lookahead.push_back(token);
        }
        self.lookahead.get(n)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.lookahead.pop_front().or_else(|| self.tokens.next())
    }

    /// True when tokens have been pulled from the source but not consumed.
    pub fn has_lookahead(&self) -> bool {
        !self.lookahead.is_empty()
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.peek(0).is_none()
    }

    /// Consumes `g R` when the cursor sits right after an object number.
    fn take_reference_tail(&mut self, number: i64) -> Option<ObjectId> {
        let number = u32::try_from(number).ok()?;
        let generation = match self.peek(0)? {
            Token::Integer(g) => u16::try_from(*g).ok()?,
            _ => return None,
        };
        if !self.peek(1)?.is_keyword("R") {
            return None;
        }
        self.next_token();
        self.next_token();
        Some(ObjectId::new(number, generation))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Delimiter(b) => format!("delimiter '{}'", *b as char),
        Token::Keyword(k) => format!("keyword '{k}'"),
        Token::ArrayEnd => "']'".to_string(),
        Token::DictEnd => "'>>'".to_string(),
        other => format!("{other:?}"),
    }
}

/// Parses one value from the cursor.
pub fn parse_value<I: Iterator<Item = Token>>(cursor: &mut TokenCursor<I>) -> ParseResult<Object> {
    let token = cursor.next_token().ok_or(ParseError::UnexpectedEof)?;

    match token {
        Token::DictStart => parse_dictionary(cursor).map(Object::Dictionary),
        Token::ArrayStart => parse_array(cursor).map(Object::Array),
        Token::Integer(n) => Ok(cursor
            .take_reference_tail(n)
            .map(Object::Reference)
            .unwrap_or(Object::Integer(n))),
        Token::Real(f) => Ok(Object::Real(f)),
        Token::Boolean(b) => Ok(Object::Boolean(b)),
        Token::Null => Ok(Object::Null),
        Token::Name(name) => Ok(Object::Name(name)),
        Token::LiteralString(bytes) => Ok(Object::String(PdfString::literal(bytes))),
        Token::HexString(bytes) => Ok(Object::String(PdfString::hex(bytes))),
        other @ (Token::ArrayEnd | Token::DictEnd | Token::Delimiter(_) | Token::Keyword(_)) => {
            Err(ParseError::UnexpectedToken {
                expected: "value".to_string(),
                found: describe(&other),
            })
        }
    }
}

fn parse_dictionary<I: Iterator<Item = Token>>(
    cursor: &mut TokenCursor<I>,
) -> ParseResult<Dictionary> {
    let mut dict = Dictionary::new();

    loop {
        match cursor.next_token() {
            None => return Err(ParseError::UnterminatedDictionary),
            Some(Token::DictEnd) => return Ok(dict),
            Some(Token::Name(key)) => {
                if cursor.is_exhausted() {
                    return Err(ParseError::UnterminatedDictionary);
                }
                let value = parse_value(cursor)?;
                dict.set(key, value);
            }
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "name".to_string(),
                    found: describe(&other),
                })
            }
        }
    }
}

fn parse_array<I: Iterator<Item = Token>>(cursor: &mut TokenCursor<I>) -> ParseResult<Vec<Object>> {
    let mut items = Vec::new();

    loop {
        match cursor.peek(0) {
            None => return Err(ParseError::UnterminatedArray),
            Some(Token::ArrayEnd) => {
                cursor.next_token();
                return Ok(items);
            }
            Some(_) => items.push(parse_value(cursor)?),
        }
    }
}

/// Parses the first value found in `input`.
pub fn parse_bytes(input: &[u8]) -> ParseResult<Object> {
    parse_value(&mut TokenCursor::from_bytes(input))
}
