//! Indirect object extraction.
//!
//! Objects are found by scanning the buffer for `<id> <gen> obj` headers
//! rather than by following the cross-reference table, so files with a stale
//! or broken xref still load. Each body is parsed from its header onward and
//! the scan resumes after it; stream payloads are skipped by their `Length`,
//! so keywords inside them are never mistaken for object syntax. Compressed
//! object streams are not read.

use super::lexer::{is_whitespace, Tokenizer};
use super::objects::{parse_value, TokenCursor};
use super::trailer::Trailer;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, IndirectObject, Object, ObjectId, ObjectTable, Stream};
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref OBJECT_HEADER: Regex = Regex::new(r"(?-u)([0-9]+)\s+([0-9]+)\s+obj\b")
        .expect("BUG: invalid OBJECT_HEADER regex literal");
    static ref STREAM_END: Regex =
        Regex::new(r"(?-u)endstream\s*endobj").expect("BUG: invalid STREAM_END regex literal");
    static ref ENDSTREAM_KEYWORD: Regex =
        Regex::new(r"(?-u)endstream").expect("BUG: invalid ENDSTREAM_KEYWORD regex literal");
}

/// Reads the object table and trailer out of a complete file buffer.
pub struct PdfReader<'a> {
    buffer: &'a [u8],
}

impl<'a> PdfReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Extracts every indirect object. A later object with the same id
    /// replaces an earlier one.
    pub fn read_objects(&self) -> ParseResult<ObjectTable> {
        let mut table = ObjectTable::new();
        let mut offset = 0;

        while let Some(caps) = OBJECT_HEADER.captures_at(self.buffer, offset) {
            let (Some(whole), Some(number), Some(generation)) =
                (caps.get(0), caps.get(1), caps.get(2))
            else {
                break;
            };
            offset = whole.end();

            let Some(id) = parse_id(number.as_bytes(), generation.as_bytes()) else {
                tracing::warn!(
                    offset = whole.start(),
                    "object number out of range, skipping header"
                );
                continue;
            };

            let (value, resume) = read_object_body(self.buffer, whole.end()).map_err(|err| {
                ParseError::SyntaxError {
                    position: whole.start(),
                    message: format!("object {} {}: {err}", id.number(), id.generation()),
                }
            })?;
            offset = resume.max(whole.end());

            if table.insert(IndirectObject::new(id, value)).is_some() {
                tracing::debug!(object = id.number(), "duplicate object id, keeping later one");
            }
        }

        Ok(table)
    }

    pub fn read_trailer(&self) -> ParseResult<Trailer> {
        Trailer::locate(self.buffer)
    }

    /// Reads objects and trailer, and checks that the trailer leads to a
    /// catalog with a `Pages` reference.
    pub fn read(&self) -> ParseResult<(ObjectTable, Trailer)> {
        let trailer = self.read_trailer()?;
        let objects = self.read_objects()?;

        let catalog = objects
            .get(trailer.root())
            .ok()
            .and_then(|obj| obj.value().as_dict())
            .ok_or_else(|| {
                ParseError::InvalidTrailer(format!("Root {} does not resolve", trailer.root()))
            })?;

        if catalog.get("Pages").and_then(|p| p.as_reference()).is_none() {
            return Err(ParseError::MissingKey("Pages".to_string()));
        }

        tracing::debug!(
            objects = objects.len(),
            root = trailer.root().number(),
            "extracted object table"
        );
        Ok((objects, trailer))
    }
}

fn parse_id(number: &[u8], generation: &[u8]) -> Option<ObjectId> {
    let number = std::str::from_utf8(number).ok()?.parse::<u32>().ok()?;
    let generation = std::str::from_utf8(generation).ok()?.parse::<u16>().ok()?;
    Some(ObjectId::new(number, generation))
}

/// Parses the value starting at `start` and returns it with the offset the
/// object scan should resume from.
fn read_object_body(buffer: &[u8], start: usize) -> ParseResult<(Object, usize)> {
    let mut tokens = Tokenizer::new(&buffer[start..]);
    let (value, settled) = {
        let mut cursor = TokenCursor::new(tokens.by_ref());
        let value = parse_value(&mut cursor)?;
        (value, !cursor.has_lookahead())
    };
    let value_end = start + tokens.position();

    let header = match value {
        Object::Dictionary(dict) if settled => dict,
        other => return Ok((other, value_end)),
    };

    // Only the token right after the dictionary can open a stream.
    let mut next = Tokenizer::new(&buffer[value_end..]);
    if !next.next().is_some_and(|token| token.is_keyword("stream")) {
        return Ok((Object::Dictionary(header), value_end));
    }

    let keyword_end = value_end + next.position();
    let data_start = buffer.len() - strip_leading_eol(&buffer[keyword_end..]).len();
    let (data, resume) = stream_payload(buffer, data_start, &header);

    Ok((Object::Stream(Stream::from_parts(header, data.to_vec())), resume))
}

/// Takes exactly `Length` bytes when the header declares a direct length
/// followed by `endstream`. Otherwise the payload runs to the first
/// `endstream`, minus one EOL.
fn stream_payload<'b>(buffer: &'b [u8], start: usize, header: &Dictionary) -> (&'b [u8], usize) {
    let declared_end = header
        .get("Length")
        .and_then(|len| len.as_integer())
        .and_then(|len| usize::try_from(len).ok())
        .and_then(|len| start.checked_add(len))
        .filter(|&end| end <= buffer.len());

    if let Some(end) = declared_end {
        if let Some(resume) = endstream_at(buffer, end) {
            return (&buffer[start..end], resume);
        }
        tracing::debug!(offset = start, "stream Length does not reach endstream");
    }

    match STREAM_END
        .find_at(buffer, start)
        .or_else(|| ENDSTREAM_KEYWORD.find_at(buffer, start))
    {
        Some(m) => (strip_trailing_eol(&buffer[start..m.start()]), m.end()),
        None => (strip_trailing_eol(&buffer[start..]), buffer.len()),
    }
}

/// Offset just past `endstream` when it follows `from` after optional
/// whitespace.
fn endstream_at(buffer: &[u8], from: usize) -> Option<usize> {
    let rest = &buffer[from..];
    let skipped = rest.iter().take_while(|&&b| is_whitespace(b)).count();
    rest[skipped..]
        .starts_with(b"endstream")
        .then(|| from + skipped + b"endstream".len())
}

fn strip_leading_eol(data: &[u8]) -> &[u8] {
    if let Some(rest) = data.strip_prefix(b"\r\n") {
        rest
    } else if let Some(rest) = data.strip_prefix(b"\n") {
        rest
    } else if let Some(rest) = data.strip_prefix(b"\r") {
        rest
    } else {
        data
    }
}

fn strip_trailing_eol(data: &[u8]) -> &[u8] {
    if let Some(rest) = data.strip_suffix(b"\r\n") {
        rest
    } else if let Some(rest) = data.strip_suffix(b"\n") {
        rest
    } else if let Some(rest) = data.strip_suffix(b"\r") {
        rest
    } else {
        data
    }
}
