//! Hand-assembled PDF buffers for integration tests.
//!
//! The cross-reference section written here is deliberately minimal and its
//! offsets are wrong; the loader never reads it.

#![allow(dead_code)]

/// Builds `<< dict_entries /Length n >> stream ... endstream`.
pub fn stream_body(dict_entries: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< {dict_entries} /Length {} >>\nstream\n", data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Wraps numbered object bodies into a complete file with a trailer.
pub fn build_pdf(objects: &[(u32, Vec<u8>)], root: u32) -> Vec<u8> {
    let mut pdf = b"%PDF-1.4\n".to_vec();
    for (number, body) in objects {
        pdf.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }
    let size = objects.iter().map(|(n, _)| n + 1).max().unwrap_or(1);
    pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
    pdf.extend_from_slice(format!("trailer\n<< /Size {size} /Root {root} 0 R >>\n").as_bytes());
    pdf.extend_from_slice(b"startxref\n12345\n%%EOF\n");
    pdf
}

/// One 300x300 page: a text run in the first content object and an image
/// drawn twice after a single `cm` in the second. Resources and the XObject
/// table are both indirect.
pub fn two_stream_page() -> Vec<u8> {
    build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
            (
                3,
                b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 300] /Resources 4 0 R /Contents [5 0 R 6 0 R] >>"
                    .to_vec(),
            ),
            (4, b"<< /Font << /F1 7 0 R >> /XObject 8 0 R >>".to_vec()),
            (
                5,
                stream_body("", b"BT /F1 18 Tf 18 0 0 18 30 222 Tm (Baseline) Tj ET"),
            ),
            (
                6,
                stream_body("", b"q 80 0 0 80 10 20 cm /Im2 Do Q q /Im2 Do Q"),
            ),
            (7, b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec()),
            (8, b"<< /Im2 9 0 R >>".to_vec()),
            (
                9,
                stream_body(
                    "/Type /XObject /Subtype /Image /Width 2 /Height 2 /ColorSpace /DeviceRGB /BitsPerComponent 8",
                    &[200, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120],
                ),
            ),
        ],
        1,
    )
}
