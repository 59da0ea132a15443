//! PDF Parser Module
//!
//! Reads the restricted PDF subset this crate edits: direct objects located by
//! scanning for `obj ... endobj` spans, a single trailer dictionary, and page
//! content streams limited to text and image placement operators.
//!
//! The pieces are layered bottom-up:
//!
//! - [`lexer`] turns bytes into [`Token`]s and never fails
//! - [`objects`] builds [`crate::objects::Object`] values from a token cursor
//! - [`reader`] and [`trailer`] extract the object table and trailer
//! - [`content`] replays a page's content stream into editable elements

pub mod content;
pub mod lexer;
pub mod objects;
pub mod reader;
pub mod trailer;

use crate::error::PdfError;

pub use self::content::ContentInterpreter;
pub use self::lexer::{Token, Tokenizer};
pub use self::objects::{parse_value, TokenCursor};
pub use self::reader::PdfReader;
pub use self::trailer::Trailer;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Low-level syntax errors. Every variant becomes [`PdfError::Format`] at the
/// crate boundary.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Unterminated dictionary")]
    UnterminatedDictionary,

    #[error("Unterminated array")]
    UnterminatedArray,

    #[error("Invalid trailer: {0}")]
    InvalidTrailer(String),

    #[error("Missing required key: {0}")]
    MissingKey(String),
}

impl From<ParseError> for PdfError {
    fn from(err: ParseError) -> Self {
        PdfError::Format(err.to_string())
    }
}

/// Load-time settings for [`crate::Document::load_with_options`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Page size used when a page has no usable MediaBox.
    pub default_page_size: (f64, f64),
    /// Font assumed by text shown before any `Tf`.
    pub default_font_name: String,
    pub default_font_size: f64,
    /// Bytes inserted between the streams of a multi-part `Contents` array.
    pub content_separator: Vec<u8>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_page_size: (612.0, 792.0),
            default_font_name: "F1".to_string(),
            default_font_size: 12.0,
            content_separator: b"\n".to_vec(),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_page_size(mut self, width: f64, height: f64) -> Self {
        self.default_page_size = (width, height);
        self
    }

    pub fn with_default_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.default_font_name = name.into();
        self.default_font_size = size;
        self
    }

    pub fn with_content_separator(mut self, separator: impl Into<Vec<u8>>) -> Self {
        self.content_separator = separator.into();
        self
    }
}
