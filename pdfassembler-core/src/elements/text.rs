use super::{escape_literal, format_matrix, format_number};
use crate::geometry::Matrix;
use crate::objects::encode_latin1;
use crate::writer::escape_name;

/// A single `Tj` run with the font and text matrix active when it was shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) font: String,
    pub(crate) font_size: f64,
    pub(crate) matrix: Matrix,
    pub(crate) order: usize,
}

impl TextElement {
    pub fn new(
        id: String,
        text: String,
        font: String,
        font_size: f64,
        matrix: Matrix,
        order: usize,
    ) -> Self {
        Self {
            id,
            text,
            font,
            font_size,
            matrix,
            order,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Font resource name, e.g. `F1`.
    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Sets the size used by `Tf` and the matrix scale together.
    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
        self.matrix.set_a(size);
        self.matrix.set_d(size);
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn height(&self) -> f64 {
        self.font_size.abs()
    }

    /// Approximate advance width at 0.6 em per character.
    pub fn width(&self) -> f64 {
        let chars = self.text.chars().count().max(1) as f64;
        (self.font_size * 0.6 * chars).max(self.font_size * 0.6)
    }

    pub(crate) fn operator_chunks(&self) -> Vec<Vec<u8>> {
        let mut show = b"(".to_vec();
        show.extend(escape_literal(&encode_latin1(&self.text)));
        show.extend_from_slice(b") Tj");

        let mut font = b"/".to_vec();
        font.extend(escape_name(&self.font));
        font.extend(format!(" {} Tf", format_number(self.font_size)).into_bytes());

        vec![
            b"BT".to_vec(),
            font,
            format!("{} Tm", format_matrix(&self.matrix)).into_bytes(),
            show,
            b"ET".to_vec(),
        ]
    }
}
