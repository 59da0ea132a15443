//! PDF Content Stream Interpreter
//!
//! Replays a page's content stream and rebuilds the text runs and image
//! placements it draws. Only a small operator set is understood:
//!
//! | Operator | Effect |
//! |----------|--------|
//! | `Tf` | set active font name and size |
//! | `Tm` | replace the text matrix |
//! | `Tj` | emit a text element |
//! | `cm` | replace the pending image transform |
//! | `Do` | emit an image element for an image XObject |
//! | `BT` `ET` `q` `Q` | clear operands only |
//!
//! There is no graphics state stack. The pending `cm` transform survives every
//! other operator, `Do` included, so consecutive `Do`s after one `cm` share the
//! same placement. Every other token, including unknown operators, just lands
//! on the operand stack.

use super::lexer::{Token, Tokenizer};
use super::ParseOptions;
use crate::elements::{Element, ImageElement, TextElement};
use crate::error::Result;
use crate::geometry::Matrix;
use crate::objects::{Dictionary, Object, ObjectTable};
use crate::resources::ElementIdCounter;

pub struct ContentInterpreter<'a> {
    objects: &'a ObjectTable,
    xobjects: Option<&'a Dictionary>,
    page_index: usize,
    ids: &'a mut ElementIdCounter,
    operands: Vec<Token>,
    font: (String, f64),
    text_matrix: Matrix,
    pending_transform: Option<Matrix>,
    elements: Vec<Element>,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(
        objects: &'a ObjectTable,
        xobjects: Option<&'a Dictionary>,
        page_index: usize,
        ids: &'a mut ElementIdCounter,
        options: &ParseOptions,
    ) -> Self {
        Self {
            objects,
            xobjects,
            page_index,
            ids,
            operands: Vec::new(),
            font: (options.default_font_name.clone(), options.default_font_size),
            text_matrix: Matrix::identity(),
            pending_transform: None,
            elements: Vec::new(),
        }
    }

    /// Interprets `content` and returns the elements in drawing order.
    pub fn run(mut self, content: &[u8]) -> Result<Vec<Element>> {
        for token in Tokenizer::new(content) {
            let handled = match &token {
                Token::Keyword(op) => self.apply_operator(op)?,
                _ => false,
            };
            if handled {
                self.operands.clear();
            } else {
                self.operands.push(token);
            }
        }

        tracing::debug!(
            page = self.page_index,
            elements = self.elements.len(),
            "interpreted content stream"
        );
        Ok(self.elements)
    }

    /// Returns false for keywords outside the understood set.
    fn apply_operator(&mut self, op: &str) -> Result<bool> {
        match op {
            "Tf" => self.set_font(),
            "Tm" => self.set_text_matrix(),
            "Tj" => self.show_text(),
            "cm" => self.set_transform(),
            "Do" => self.draw_xobject()?,
            "BT" | "ET" | "q" | "Q" => {}
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn last_numbers(&self, count: usize) -> Option<Vec<f64>> {
        let start = self.operands.len().checked_sub(count)?;
        self.operands[start..]
            .iter()
            .map(Token::as_number)
            .collect()
    }

    fn set_font(&mut self) {
        let [.., name, size] = self.operands.as_slice() else {
            return;
        };
        if let (Token::Name(name), Some(size)) = (name, size.as_number()) {
            self.font = (name.clone(), size);
        }
    }

    fn set_text_matrix(&mut self) {
        if let Some(m) = self.last_numbers(6).and_then(|v| Matrix::from_slice(&v)) {
            self.text_matrix = m;
        }
    }

    fn set_transform(&mut self) {
        if let Some(m) = self.last_numbers(6).and_then(|v| Matrix::from_slice(&v)) {
            self.pending_transform = Some(m);
        }
    }

    fn show_text(&mut self) {
        let bytes = match self.operands.last() {
            Some(Token::LiteralString(b)) | Some(Token::HexString(b)) => b,
            _ => return,
        };
        let text = crate::objects::decode_latin1(bytes);
        let order = self.elements.len();
        let id = self.ids.next_id(self.page_index);

        self.elements.push(Element::Text(TextElement::new(
            id,
            text,
            self.font.0.clone(),
            self.font.1,
            self.text_matrix,
            order,
        )));
    }

    fn draw_xobject(&mut self) -> Result<()> {
        let Some(Token::Name(name)) = self.operands.last() else {
            return Ok(());
        };
        let Some(reference) = self
            .xobjects
            .and_then(|x| x.get(name))
            .and_then(|obj| obj.as_reference())
        else {
            tracing::debug!(name = %name, "Do names no XObject reference, skipped");
            return Ok(());
        };

        let target = self.objects.get(reference)?;
        let Some(stream) = target.stream() else {
            return Ok(());
        };
        let dict = stream.dictionary();
        let pixel_width = dimension(dict.get("Width"));
        let pixel_height = dimension(dict.get("Height"));

        let matrix = self.pending_transform.unwrap_or_else(|| {
            Matrix::scale_translate(pixel_width as f64, pixel_height as f64, 0.0, 0.0)
        });
        let order = self.elements.len();
        let id = self.ids.next_id(self.page_index);

        self.elements.push(Element::Image(ImageElement::new(
            id,
            name.clone(),
            reference,
            matrix,
            order,
            pixel_width,
            pixel_height,
            stream.data().to_vec(),
            stream.filter().map(str::to_string),
        )));
        Ok(())
    }
}

fn dimension(value: Option<&Object>) -> u32 {
    value
        .and_then(|v| v.as_integer())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}
