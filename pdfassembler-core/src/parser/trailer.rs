//! PDF Trailer Parser
//!
//! Locates the trailer dictionary by scanning for the `trailer` keyword. The
//! cross-reference table itself is never read: every save writes a fresh one.

use super::objects::{parse_value, TokenCursor};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId};
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref TRAILER: Regex =
        Regex::new(r"(?-u)trailer\s*<<").expect("BUG: invalid TRAILER regex literal");
    static ref STARTXREF: Regex =
        Regex::new(r"(?-u)startxref\s+([0-9]+)").expect("BUG: invalid STARTXREF regex literal");
}

/// PDF Trailer information
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// Document catalog
    root: ObjectId,
    /// `Size` as declared in the source file
    size: Option<u32>,
    /// Offset recorded after `startxref`, informational only
    startxref: Option<u64>,
    /// Document information dictionary, carried through saves
    info: Option<Object>,
    /// File identifier array, carried through saves
    id: Option<Object>,
}

impl Trailer {
    pub fn new(root: ObjectId) -> Self {
        Self {
            root,
            size: None,
            startxref: None,
            info: None,
            id: None,
        }
    }

    /// Parse trailer from a dictionary
    pub fn from_dict(dict: &Dictionary, startxref: Option<u64>) -> ParseResult<Self> {
        let root = dict
            .get("Root")
            .and_then(|obj| obj.as_reference())
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))?;

        let size = dict
            .get("Size")
            .and_then(|obj| obj.as_integer())
            .and_then(|i| u32::try_from(i).ok());

        Ok(Self {
            root,
            size,
            startxref,
            info: dict.get("Info").cloned(),
            id: dict.get("ID").cloned(),
        })
    }

    /// Finds the trailer in a whole file buffer. With several `trailer`
    /// dictionaries present the last one wins.
    pub fn locate(buffer: &[u8]) -> ParseResult<Self> {
        let matches: Vec<_> = TRAILER.find_iter(buffer).collect();
        let Some(last) = matches.last() else {
            return Err(ParseError::InvalidTrailer("no trailer dictionary found".to_string()));
        };
        if matches.len() > 1 {
            tracing::warn!(
                count = matches.len(),
                "multiple trailer dictionaries, using the last one"
            );
        }

        // Re-scan from the `<<` that ends the match.
        let dict_start = last.end() - 2;
        let mut cursor = TokenCursor::from_bytes(&buffer[dict_start..]);
        let dict = match parse_value(&mut cursor)? {
            Object::Dictionary(dict) => dict,
            _ => {
                return Err(ParseError::InvalidTrailer(
                    "trailer is not a dictionary".to_string(),
                ))
            }
        };

        let startxref = STARTXREF
            .captures_iter(buffer)
            .last()
            .and_then(|caps| caps.get(1))
            .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
            .and_then(|s| s.parse::<u64>().ok());

        Self::from_dict(&dict, startxref)
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn startxref(&self) -> Option<u64> {
        self.startxref
    }

    pub fn info(&self) -> Option<&Object> {
        self.info.as_ref()
    }

    pub fn id(&self) -> Option<&Object> {
        self.id.as_ref()
    }

    /// Dictionary written after a fresh cross-reference table with `size` entries.
    pub fn to_dictionary(&self, size: u32) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Size", size);
        dict.set("Root", self.root);
        if let Some(info) = &self.info {
            dict.set("Info", info.clone());
        }
        if let Some(id) = &self.id {
            dict.set("ID", id.clone());
        }
        dict
    }
}
