//! Editable page elements reconstructed from content streams.
//!
//! Elements store their placement the way the content stream does, as a
//! bottom-left based affine matrix. Editing works in top-left coordinates,
//! converted through the owning page's height.

mod image;
mod text;

pub use self::image::{ImageData, ImageElement, ImageEncoding, ImagePresentation};
pub use self::text::TextElement;

use crate::edits::ElementEdit;
use crate::geometry::{Matrix, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Text(t) => t.id(),
            Element::Image(i) => i.id(),
        }
    }

    /// `"text"` or `"image"`, as used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Image(_) => "image",
        }
    }

    pub fn order(&self) -> usize {
        match self {
            Element::Text(t) => t.order,
            Element::Image(i) => i.order,
        }
    }

    pub fn set_order(&mut self, order: usize) {
        match self {
            Element::Text(t) => t.order = order,
            Element::Image(i) => i.order = order,
        }
    }

    pub fn matrix(&self) -> &Matrix {
        match self {
            Element::Text(t) => &t.matrix,
            Element::Image(i) => &i.matrix,
        }
    }

    fn matrix_mut(&mut self) -> &mut Matrix {
        match self {
            Element::Text(t) => &mut t.matrix,
            Element::Image(i) => &mut i.matrix,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Element::Text(t) => t.width(),
            Element::Image(i) => i.width(),
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Element::Text(t) => t.height(),
            Element::Image(i) => i.height(),
        }
    }

    /// Top-left corner in editing coordinates (origin at the page's top-left).
    pub fn top_left(&self, page_height: f64) -> Point {
        let m = self.matrix();
        Point::new(m.e(), page_height - (m.f() + self.height()))
    }

    pub fn set_top_left(&mut self, x: f64, y: f64, page_height: f64) {
        let f = page_height - y - self.height();
        self.matrix_mut().set_translation(x, f);
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Element::Text(t) => Some(t),
            Element::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageElement> {
        match self {
            Element::Image(i) => Some(i),
            Element::Text(_) => None,
        }
    }

    /// Content-stream operators that redraw this element, one chunk per line.
    pub fn to_operators(&self) -> Vec<u8> {
        let chunks = match self {
            Element::Text(t) => t.operator_chunks(),
            Element::Image(i) => i.operator_chunks(),
        };
        chunks.join(&b'\n')
    }

    /// Applies the fields present in `edit`. Sizes change before position so
    /// the requested top-left is kept for the new height.
    pub(crate) fn apply_edit(&mut self, edit: &ElementEdit, page_height: f64) {
        if let Some(order) = edit.order {
            self.set_order(order);
        }

        match self {
            Element::Text(t) => {
                if let Some(text) = &edit.text {
                    t.set_text(text.clone());
                }
                if let Some(size) = edit.font_size {
                    t.set_font_size(size);
                }
            }
            Element::Image(i) => {
                if let Some(width) = edit.width {
                    i.set_width(width);
                }
                if let Some(height) = edit.height {
                    i.set_height(height);
                }
            }
        }

        if let (Some(x), Some(y)) = (edit.x, edit.y) {
            self.set_top_left(x, y, page_height);
        }
    }
}

/// Formats a number for content streams: up to four decimals, trailing zeros
/// and point stripped, near-integers printed as integers.
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-6 {
        return format!("{}", rounded as i64);
    }
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn format_matrix(matrix: &Matrix) -> String {
    matrix
        .values()
        .iter()
        .map(|&v| format_number(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes bytes for a literal string body.
pub(crate) fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectId;

    fn text(size: f64, e: f64, f: f64) -> Element {
        Element::Text(TextElement::new(
            "p0_el1".to_string(),
            "Hello".to_string(),
            "F1".to_string(),
            size,
            Matrix::scale_translate(size, size, e, f),
            0,
        ))
    }

    fn image(w: f64, h: f64, e: f64, f: f64) -> Element {
        Element::Image(ImageElement::new(
            "p0_el2".to_string(),
            "Im1".to_string(),
            ObjectId::new(5, 0),
            Matrix::scale_translate(w, h, e, f),
            1,
            3,
            3,
            vec![],
            Some("FlateDecode".to_string()),
        ))
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.23456), "1.2346");
        assert_eq!(format_number(2.10), "2.1");
        assert_eq!(format_number(7.0000001), "7");
        assert_eq!(format_number(-0.00004), "0");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(b"a(b)\\c\r\n"), b"a\\(b\\)\\\\c\\r\\n".to_vec());
    }

    #[test]
    fn test_text_geometry() {
        let el = text(24.0, 50.0, 256.0);
        assert_eq!(el.height(), 24.0);
        assert!((el.width() - 72.0).abs() < 1e-9);
        let tl = el.top_left(400.0);
        assert_eq!(tl, Point::new(50.0, 120.0));
    }

    #[test]
    fn test_top_left_roundtrip_both_kinds() {
        for mut el in [text(18.0, 0.0, 0.0), image(90.0, 45.0, 0.0, 0.0)] {
            el.set_top_left(33.25, 71.5, 500.0);
            let tl = el.top_left(500.0);
            assert!((tl.x - 33.25).abs() < 1e-4);
            assert!((tl.y - 71.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_image_size_from_matrix() {
        let el = image(90.0, -45.0, 0.0, 0.0);
        assert_eq!(el.width(), 90.0);
        assert_eq!(el.height(), 45.0);
    }

    #[test]
    fn test_apply_edit_font_size_before_position() {
        let mut el = text(24.0, 50.0, 256.0);
        let edit = ElementEdit {
            x: Some(100.0),
            y: Some(140.0),
            font_size: Some(26.0),
            text: Some("Edited text".to_string()),
            ..ElementEdit::for_id("p0_el1")
        };
        el.apply_edit(&edit, 400.0);

        let t = el.as_text().unwrap();
        assert_eq!(t.text(), "Edited text");
        assert_eq!(t.font_size(), 26.0);
        assert_eq!(el.top_left(400.0), Point::new(100.0, 140.0));
        assert_eq!(el.matrix().f(), 400.0 - 140.0 - 26.0);
    }

    #[test]
    fn test_apply_edit_partial_position_only() {
        let mut el = text(24.0, 50.0, 256.0);
        let before = el.clone();
        let edit = ElementEdit {
            x: Some(10.0),
            y: Some(20.0),
            ..ElementEdit::for_id("p0_el1")
        };
        el.apply_edit(&edit, 400.0);

        let (a, b) = (el.as_text().unwrap(), before.as_text().unwrap());
        assert_eq!(a.text(), b.text());
        assert_eq!(a.font_size(), b.font_size());
        assert_eq!(el.order(), before.order());
        assert_eq!(el.top_left(400.0), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_apply_edit_image_size() {
        let mut el = image(90.0, 90.0, 0.0, 310.0);
        let edit = ElementEdit {
            width: Some(120.0),
            height: Some(60.0),
            x: Some(5.0),
            y: Some(5.0),
            ..ElementEdit::for_id("p0_el2")
        };
        el.apply_edit(&edit, 400.0);
        assert_eq!(el.width(), 120.0);
        assert_eq!(el.height(), 60.0);
        assert_eq!(el.top_left(400.0), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_text_operators() {
        let el = text(24.0, 50.0, 256.0);
        assert_eq!(
            String::from_utf8(el.to_operators()).unwrap(),
            "BT\n/F1 24 Tf\n24 0 0 24 50 256 Tm\n(Hello) Tj\nET"
        );
    }

    #[test]
    fn test_image_operators() {
        let el = image(90.0, 90.0, 0.0, 310.5);
        assert_eq!(
            String::from_utf8(el.to_operators()).unwrap(),
            "q\n90 0 0 90 0 310.5 cm\n/Im1 Do\nQ"
        );
    }
}
