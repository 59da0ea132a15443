use crate::elements::escape_literal;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, ObjectTable, PdfString, StringFormat};
use crate::parser::lexer::{is_delimiter, is_whitespace};
use crate::parser::Trailer;
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output settings for [`PdfWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Version written in the `%PDF-` header line.
    pub pdf_version: String,
    /// Emit a second comment line with high-bit bytes after the header.
    pub binary_marker: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            pdf_version: "1.4".to_string(),
            binary_marker: false,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdf_version(mut self, version: impl Into<String>) -> Self {
        self.pdf_version = version.into();
        self
    }

    pub fn with_binary_marker(mut self, enabled: bool) -> Self {
        self.binary_marker = enabled;
        self
    }
}

/// Serializes an object table as a complete file with a fresh
/// cross-reference table. Never writes incremental updates.
pub struct PdfWriter<W: Write> {
    writer: W,
    config: WriterConfig,
    xref_positions: BTreeMap<u32, (u64, u16)>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self::with_config(writer, WriterConfig::default())
    }

    pub fn with_config(writer: W, config: WriterConfig) -> Self {
        Self {
            writer,
            config,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    /// Writes every object in ascending id order, then xref and trailer.
    /// Returns the number of bytes written.
    pub fn write_document(&mut self, objects: &ObjectTable, trailer: &Trailer) -> Result<u64> {
        self.write_header()?;

        for object in objects.iter() {
            self.write_object(object.id(), object.value())?;
        }

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(trailer, xref_position)?;

        self.writer.flush().map_err(PdfError::Persistence)?;
        Ok(self.current_position)
    }

    fn write_header(&mut self) -> Result<()> {
        let header = format!("%PDF-{}\n", self.config.pdf_version);
        self.write_bytes(header.as_bytes())?;
        if self.config.binary_marker {
            self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        }
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions
            .insert(id.number(), (self.current_position, id.generation()));

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        self.write_object_value(object)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.write_bytes(b"null")?,
            Object::Boolean(b) => self.write_bytes(if *b { b"true" } else { b"false" })?,
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes())?,
            Object::Real(f) => self.write_bytes(format_real(*f).as_bytes())?,
            Object::String(s) => self.write_string(s)?,
            Object::Name(n) => {
                self.write_bytes(b"/")?;
                self.write_bytes(&escape_name(n))?;
            }
            Object::Array(arr) => {
                self.write_bytes(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(obj)?;
                }
                self.write_bytes(b"]")?;
            }
            Object::Dictionary(dict) => self.write_dictionary(dict)?,
            Object::Stream(stream) => {
                // Length always reflects the payload actually written.
                let mut dict = stream.dictionary().clone();
                dict.set("Length", stream.data().len());
                self.write_dictionary(&dict)?;
                self.write_bytes(b"\nstream\n")?;
                self.write_bytes(stream.data())?;
                self.write_bytes(b"\nendstream")?;
            }
            Object::Reference(id) => {
                let ref_str = format!("{} {} R", id.number(), id.generation());
                self.write_bytes(ref_str.as_bytes())?;
            }
        }
        Ok(())
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.iter() {
            self.write_bytes(b"\n/")?;
            self.write_bytes(&escape_name(key))?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
        }
        self.write_bytes(b"\n>>")
    }

    fn write_string(&mut self, s: &PdfString) -> Result<()> {
        match s.format() {
            StringFormat::Literal => {
                self.write_bytes(b"(")?;
                self.write_bytes(&escape_literal(s.as_bytes()))?;
                self.write_bytes(b")")
            }
            StringFormat::Hex => {
                let hex: String = s.as_bytes().iter().map(|b| format!("{b:02X}")).collect();
                self.write_bytes(b"<")?;
                self.write_bytes(hex.as_bytes())?;
                self.write_bytes(b">")
            }
        }
    }

    fn write_xref(&mut self) -> Result<()> {
        self.write_bytes(b"xref\n")?;

        let max_obj_num = self.xref_positions.keys().next_back().copied().unwrap_or(0);

        // One subsection covering 0..=max
        self.write_bytes(format!("0 {}\n", max_obj_num + 1).as_bytes())?;

        // Head of the free list
        self.write_bytes(b"0000000000 65535 f \n")?;

        // Numbers with no object become free entries
        for obj_num in 1..=max_obj_num {
            let entry = match self.xref_positions.get(&obj_num) {
                Some((position, generation)) => format!("{position:010} {generation:05} n \n"),
                None => "0000000000 00000 f \n".to_string(),
            };
            self.write_bytes(entry.as_bytes())?;
        }

        Ok(())
    }

    fn write_trailer(&mut self, trailer: &Trailer, xref_position: u64) -> Result<()> {
        let max_obj_num = self.xref_positions.keys().next_back().copied().unwrap_or(0);
        let dict = trailer.to_dictionary(max_obj_num + 1);

        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(&dict)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).map_err(PdfError::Persistence)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

impl PdfWriter<BufWriter<std::fs::File>> {
    pub fn new(path: impl AsRef<Path>, config: WriterConfig) -> Result<Self> {
        let file = std::fs::File::create(path).map_err(PdfError::Persistence)?;
        Ok(Self::with_config(BufWriter::new(file), config))
    }
}

/// Reals with up to six decimals, trailing zeros trimmed.
fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let text = format!("{value:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Name bytes with `#xx` escapes for anything outside the regular set.
pub(crate) fn escape_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len());
    let mut buf = [0u8; 4];
    for c in name.chars() {
        let bytes: &[u8] = if (c as u32) <= 0xFF {
            buf[0] = c as u32 as u8;
            &buf[..1]
        } else {
            c.encode_utf8(&mut buf).as_bytes()
        };
        for &b in bytes {
            let regular = (0x21..=0x7E).contains(&b) && b != b'#' && !is_delimiter(b);
            if regular && !is_whitespace(b) {
                out.push(b);
            } else {
                out.extend_from_slice(format!("#{b:02X}").as_bytes());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{IndirectObject, Stream};
    use std::io::{self, ErrorKind};

    fn write(objects: &ObjectTable, trailer: &Trailer, config: WriterConfig) -> Vec<u8> {
        let mut buffer = Vec::new();
        PdfWriter::with_config(&mut buffer, config)
            .write_document(objects, trailer)
            .unwrap();
        buffer
    }

    fn value_bytes(object: &Object) -> String {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer)
            .write_object_value(object)
            .unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn table(entries: Vec<(u32, Object)>) -> ObjectTable {
        let mut objects = ObjectTable::new();
        for (n, value) in entries {
            objects.insert(IndirectObject::new(ObjectId::new(n, 0), value));
        }
        objects
    }

    #[test]
    fn test_pdf_writer_new_with_writer() {
        let writer = PdfWriter::new_with_writer(Vec::new());
        assert_eq!(writer.current_position, 0);
        assert!(writer.xref_positions.is_empty());
        assert_eq!(writer.config, WriterConfig::default());
    }

    #[test]
    fn test_write_header() {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer).write_header().unwrap();
        assert_eq!(buffer, b"%PDF-1.4\n");
    }

    #[test]
    fn test_write_header_with_marker() {
        let mut buffer = Vec::new();
        let config = WriterConfig::new()
            .with_pdf_version("1.7")
            .with_binary_marker(true);
        PdfWriter::with_config(&mut buffer, config).write_header().unwrap();

        assert!(buffer.starts_with(b"%PDF-1.7\n"));
        assert_eq!(buffer.len(), 15);
        assert_eq!(&buffer[9..], &[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(value_bytes(&Object::Null), "null");
        assert_eq!(value_bytes(&Object::Boolean(false)), "false");
        assert_eq!(value_bytes(&Object::Integer(-42)), "-42");
        assert_eq!(value_bytes(&Object::Real(612.0)), "612");
        assert_eq!(value_bytes(&Object::Real(0.1234567)), "0.123457");
        assert_eq!(value_bytes(&Object::Real(-0.0000001)), "0");
        assert_eq!(value_bytes(&Object::Real(f64::NAN)), "0");
        assert_eq!(value_bytes(&Object::Reference(ObjectId::new(3, 1))), "3 1 R");
    }

    #[test]
    fn test_strings_keep_their_form() {
        assert_eq!(
            value_bytes(&Object::String(PdfString::literal("a(b)\\"))),
            "(a\\(b\\)\\\\)"
        );
        assert_eq!(
            value_bytes(&Object::String(PdfString::hex(vec![0x0A, 0xFF]))),
            "<0AFF>"
        );
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(value_bytes(&Object::name("Type")), "/Type");
        assert_eq!(value_bytes(&Object::name("A B#(")), "/A#20B#23#28");
    }

    #[test]
    fn test_dictionary_and_array_layout() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("Page"));
        dict.set("MediaBox", vec![Object::Integer(0), Object::Integer(0), Object::Real(400.0), Object::Real(400.0)]);
        assert_eq!(
            value_bytes(&Object::Dictionary(dict)),
            "<<\n/Type /Page\n/MediaBox [0 0 400 400]\n>>"
        );
    }

    #[test]
    fn test_stream_length_is_corrected() {
        let mut dict = Dictionary::new();
        dict.set("Length", Object::Reference(ObjectId::new(9, 0)));
        let stream = Stream::from_parts(dict, b"BT ET".to_vec());
        assert_eq!(
            value_bytes(&Object::Stream(stream)),
            "<<\n/Length 5\n>>\nstream\nBT ET\nendstream"
        );
    }

    #[test]
    fn test_xref_offsets_and_gaps() {
        let objects = table(vec![(1, Object::Integer(1)), (3, Object::Integer(3))]);
        let trailer = Trailer::new(ObjectId::new(1, 0));
        let out = write(&objects, &trailer, WriterConfig::default());
        let text = String::from_utf8(out.clone()).unwrap();

        let first = text.find("1 0 obj").unwrap();
        let third = text.find("3 0 obj").unwrap();
        let xref = text.find("xref\n").unwrap();
        let expected = format!(
            "xref\n0 4\n0000000000 65535 f \n{first:010} 00000 n \n0000000000 00000 f \n{third:010} 00000 n \n"
        );
        assert_eq!(&text[xref..xref + expected.len()], expected);

        assert!(text.contains("trailer\n<<\n/Size 4\n/Root 1 0 R\n>>"));
        assert!(text.ends_with(&format!("startxref\n{xref}\n%%EOF\n")));
    }

    #[test]
    fn test_every_xref_record_is_20_bytes() {
        let objects = table((1..=5).map(|n| (n, Object::Integer(n as i64))).collect());
        let out = write(&objects, &Trailer::new(ObjectId::new(1, 0)), WriterConfig::default());
        let text = String::from_utf8(out).unwrap();
        let start = text.find("0 6\n").unwrap() + 4;
        let end = text.find("trailer").unwrap();
        let records = &text[start..end];
        assert_eq!(records.len(), 6 * 20);
    }

    #[test]
    fn test_returns_bytes_written() {
        let objects = table(vec![(1, Object::Null)]);
        let mut buffer = Vec::new();
        let written = PdfWriter::new_with_writer(&mut buffer)
            .write_document(&objects, &Trailer::new(ObjectId::new(1, 0)))
            .unwrap();
        assert_eq!(written as usize, buffer.len());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::PermissionDenied, "Simulated write error"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let objects = table(vec![(1, Object::Null)]);
        let result = PdfWriter::new_with_writer(FailingWriter)
            .write_document(&objects, &Trailer::new(ObjectId::new(1, 0)));
        assert!(matches!(result, Err(PdfError::Persistence(_))));
    }

    #[test]
    fn test_new_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let objects = table(vec![(1, Object::Null)]);
        let written = PdfWriter::new(&path, WriterConfig::default())
            .unwrap()
            .write_document(&objects, &Trailer::new(ObjectId::new(1, 0)))
            .unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }
}
