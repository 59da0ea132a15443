//! Content stream interpretation through full document loads.

mod support;

use pdfassembler::{load_document, Element, Matrix};
use support::{build_pdf, stream_body};

fn single_page(content: &[u8]) -> Vec<u8> {
    build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
            (
                3,
                b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Contents 4 0 R /Resources << /XObject << /Im1 5 0 R >> >> >>"
                    .to_vec(),
            ),
            (4, stream_body("", content)),
            (
                5,
                stream_body(
                    "/Type /XObject /Subtype /Image /Width 4 /Height 3 /Filter /DCTDecode",
                    b"\xFF\xD8jpeg",
                ),
            ),
        ],
        1,
    )
}

fn elements(content: &[u8]) -> Vec<Element> {
    let doc = load_document(&single_page(content)).unwrap();
    doc.pages()[0].elements().to_vec()
}

#[test]
fn test_pending_transform_is_shared_by_consecutive_draws() {
    let elements = elements(b"q 90 0 0 90 0 110 cm /Im1 Do Q\nq /Im1 Do Q");
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].matrix(), elements[1].matrix());
    assert_eq!(
        elements[1].matrix(),
        &Matrix::scale_translate(90.0, 90.0, 0.0, 110.0)
    );
}

#[test]
fn test_draw_without_transform_uses_pixel_size() {
    let elements = elements(b"/Im1 Do");
    let image = elements[0].as_image().unwrap();
    assert_eq!((image.width(), image.height()), (4.0, 3.0));
    assert_eq!(image.presentation().mime_type, "image/jpeg");
}

#[test]
fn test_graphics_state_operators_do_not_reset_text_state() {
    let elements = elements(b"BT /F1 20 Tf 20 0 0 20 5 5 Tm ET q Q BT (a) Tj ET");
    let text = elements[0].as_text().unwrap();
    assert_eq!(text.font_size(), 20.0);
    assert_eq!(text.matrix(), &Matrix::new(20.0, 0.0, 0.0, 20.0, 5.0, 5.0));
}

#[test]
fn test_unsupported_operators_are_ignored() {
    let elements = elements(
        b"0.5 g 0 0 200 200 re f BT /F1 12 Tf 1 0 0 1 10 10 Tm [(kerned)] TJ (shown) Tj ET",
    );
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].as_text().unwrap().text(), "shown");
}

#[test]
fn test_escaped_strings_decode_as_latin1() {
    let elements = elements(b"BT (caf\\351 \\(x\\)) Tj <48 69> Tj ET");
    let texts: Vec<&str> = elements
        .iter()
        .filter_map(Element::as_text)
        .map(|t| t.text())
        .collect();
    assert_eq!(texts, vec!["café (x)", "Hi"]);
}

#[test]
fn test_brace_in_content_does_not_stall() {
    let elements = elements(b"{ } BT (after) Tj ET");
    assert_eq!(elements.len(), 1);
}

#[test]
fn test_ids_continue_across_pages() {
    let pdf = build_pdf(
        &[
            (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
            (2, b"<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>".to_vec()),
            (3, b"<< /Type /Page /Contents 5 0 R >>".to_vec()),
            (4, b"<< /Type /Page /Contents 5 0 R >>".to_vec()),
            (5, stream_body("", b"BT (x) Tj ET BT (y) Tj ET")),
        ],
        1,
    );
    let doc = load_document(&pdf).unwrap();
    let ids: Vec<&str> = doc
        .pages()
        .iter()
        .flat_map(|p| p.elements().iter().map(|e| e.id()))
        .collect();
    assert_eq!(ids, vec!["p0_el1", "p0_el2", "p1_el3", "p1_el4"]);
    assert_eq!(doc.pages()[1].width(), 612.0);
}
