//! Flate (zlib) helpers for stream payloads.

use crate::error::{PdfError, Result};

/// Compress data using Flate/Zlib compression
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Format(format!("Flate encoding failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| PdfError::Format(format!("Flate encoding failed: {e}")))
}

/// Decompress data using Flate/Zlib decompression
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PdfError::Format(format!("corrupt Flate stream: {e}")))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress_roundtrip() {
        let original = b"BT /F1 12 Tf 1 0 0 1 72 700 Tm (Hello) Tj ET";

        let compressed = compress(original).unwrap();
        assert!(!compressed.is_empty());

        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_compress_empty() {
        let compressed = compress(b"").unwrap();
        assert!(!compressed.is_empty()); // zlib header even for no input

        assert_eq!(decompress(&compressed).unwrap(), b"");
    }

    #[test]
    fn test_decompress_garbage_is_format_error() {
        let err = decompress(b"definitely not zlib").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_rgb_pixels_roundtrip() {
        let pixels: Vec<u8> = (0..27u8).map(|i| i * 9).collect();
        assert_eq!(decompress(&compress(&pixels).unwrap()).unwrap(), pixels);
    }
}
