use crate::compression;
use crate::edits::ElementEdit;
use crate::elements::{Element, ImageElement, TextElement};
use crate::error::Result;
use crate::geometry::Matrix;
use crate::objects::{Object, ObjectId, ObjectTable, Stream};
use crate::parser::{ContentInterpreter, ParseOptions};
use crate::resources::{lookup_resources, ElementIdCounter, ResourceAllocator};
use std::collections::HashSet;

/// A single page with the elements its content stream draws.
///
/// Geometry comes from `MediaBox` (`[2]` is the width, `[3]` the height).
/// Elements are kept sorted by `order`, which is always the dense sequence
/// `0..n`.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    object: ObjectId,
    width: f64,
    height: f64,
    contents: Vec<ObjectId>,
    elements: Vec<Element>,
}

impl Page {
    pub(crate) fn new(
        index: usize,
        object: ObjectId,
        width: f64,
        height: f64,
        contents: Vec<ObjectId>,
    ) -> Self {
        Self {
            index,
            object,
            width,
            height,
            contents,
            elements: Vec::new(),
        }
    }

    /// Reads geometry and content of the page object `object` and interprets
    /// its content stream.
    pub(crate) fn load(
        objects: &ObjectTable,
        object: ObjectId,
        index: usize,
        ids: &mut ElementIdCounter,
        options: &ParseOptions,
    ) -> Result<Self> {
        let dict = objects.dict(object)?;

        let (width, height) = match dict.get("MediaBox") {
            Some(media_box) => media_box_size(objects.resolve(media_box)?).unwrap_or_else(|| {
                tracing::warn!(page = index, "unusable MediaBox, using default size");
                options.default_page_size
            }),
            None => options.default_page_size,
        };

        let contents = match dict.get("Contents") {
            Some(Object::Reference(id)) => vec![*id],
            Some(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference()).collect(),
            _ => Vec::new(),
        };

        let mut page = Self::new(index, object, width, height, contents);
        let content = page.read_content(objects, options)?;
        if !content.is_empty() {
            let xobjects = lookup_resources(objects, object, "XObject")?;
            page.elements = ContentInterpreter::new(objects, xobjects, index, ids, options)
                .run(&content)?;
        }
        Ok(page)
    }

    /// Concatenates the decoded content objects with the configured separator.
    fn read_content(&self, objects: &ObjectTable, options: &ParseOptions) -> Result<Vec<u8>> {
        let mut parts = Vec::with_capacity(self.contents.len());
        for &id in &self.contents {
            let Some(stream) = objects.get(id)?.stream() else {
                tracing::warn!(page = self.index, object = id.number(), "content object is not a stream, skipped");
                continue;
            };
            match stream.filter() {
                None => parts.push(stream.data().to_vec()),
                Some("FlateDecode") => match compression::decompress(stream.data()) {
                    Ok(data) => parts.push(data),
                    Err(err) => {
                        tracing::warn!(page = self.index, object = id.number(), error = %err, "undecodable content stream, skipped");
                    }
                },
                Some(other) => {
                    tracing::warn!(page = self.index, object = id.number(), filter = other, "unsupported content filter, skipped");
                }
            }
        }
        Ok(parts.join(options.content_separator.as_slice()))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Reference to the page dictionary.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn contents(&self) -> &[ObjectId] {
        &self.contents
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Places a text run with its top-left corner at (`x`, `y`).
    pub(crate) fn add_text(
        &mut self,
        id: String,
        font: String,
        text: &str,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> &Element {
        let matrix = Matrix::scale_translate(font_size, font_size, x, self.height - y - font_size);
        let order = self.elements.len();
        self.push(Element::Text(TextElement::new(
            id,
            text.to_string(),
            font,
            font_size,
            matrix,
            order,
        )))
    }

    /// Places an image XObject scaled to `width` × `height`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_image(
        &mut self,
        id: String,
        name: String,
        xobject: ObjectId,
        stream: &Stream,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> &Element {
        let dict = stream.dictionary();
        let pixels = |key: &str| {
            dict.get(key)
                .and_then(|v| v.as_integer())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        let matrix = Matrix::scale_translate(width, height, x, self.height - y - height);
        let order = self.elements.len();
        self.push(Element::Image(ImageElement::new(
            id,
            name,
            xobject,
            matrix,
            order,
            pixels("Width"),
            pixels("Height"),
            stream.data().to_vec(),
            stream.filter().map(str::to_string),
        )))
    }

    fn push(&mut self, element: Element) -> &Element {
        self.elements.push(element);
        let last = self.elements.len() - 1;
        &self.elements[last]
    }

    /// Removes an element and closes the gap in the order sequence. Its
    /// resources stay bound to the page.
    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        let position = self.position(id)?;
        let removed = self.elements.remove(position);
        self.renumber();
        Some(removed)
    }

    /// Applies one page's edit entries in sequence. Entries for unknown ids
    /// or for an element of another kind are skipped.
    pub(crate) fn apply_edits(&mut self, edits: &[ElementEdit]) {
        for edit in edits {
            let Some(position) = self.position(&edit.id) else {
                tracing::debug!(page = self.index, id = %edit.id, "no such element, edit skipped");
                continue;
            };
            let element = &mut self.elements[position];
            if !edit.targets_kind(element.kind()) {
                tracing::debug!(
                    page = self.index,
                    id = %edit.id,
                    kind = element.kind(),
                    "edit type does not match element, skipped"
                );
                continue;
            }

            element.apply_edit(edit, self.height);
            if let Some(order) = edit.order {
                self.move_element(position, order);
            }
        }
    }

    fn move_element(&mut self, from: usize, to: usize) {
        let element = self.elements.remove(from);
        let to = to.min(self.elements.len());
        self.elements.insert(to, element);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (order, element) in self.elements.iter_mut().enumerate() {
            element.set_order(order);
        }
    }

    /// Operators redrawing every element in order, one per line.
    pub fn content_bytes(&self) -> Vec<u8> {
        self.elements
            .iter()
            .map(Element::to_operators)
            .collect::<Vec<_>>()
            .join(&b'\n')
    }

    /// Writes the regenerated content into the first content object (or a new
    /// one) and points `Contents` at it alone. Other content objects are left
    /// in the table unreferenced.
    ///
    /// `claimed` holds content objects already rewritten for other pages; a
    /// page whose first content object is among them gets a fresh object.
    pub(crate) fn rebuild_content(
        &mut self,
        objects: &mut ObjectTable,
        allocator: &mut ResourceAllocator,
        claimed: &mut HashSet<ObjectId>,
    ) -> Result<()> {
        let data = self.content_bytes();

        let reusable = self.contents.first().copied().filter(|id| !claimed.contains(id));
        let target = match reusable {
            Some(id) => {
                let slot = objects.get_mut(id)?.value_mut();
                let mut dict = slot.as_dict().cloned().unwrap_or_default();
                dict.remove("Filter");
                dict.remove("DecodeParms");
                *slot = Object::Stream(Stream::with_dictionary(dict, data));
                id
            }
            None => allocator.allocate(objects, Object::Stream(Stream::new(data))),
        };
        claimed.insert(target);

        objects.dict_mut(self.object)?.set("Contents", target);
        self.contents = vec![target];
        Ok(())
    }
}

fn media_box_size(media_box: &Object) -> Option<(f64, f64)> {
    let values = media_box.as_array()?;
    let width = values.get(2)?.as_real()?;
    let height = values.get(3)?.as_real()?;
    Some((width, height))
}
