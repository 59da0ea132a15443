use crate::edits::EditBatch;
use crate::elements::{Element, ImageData};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, IndirectObject, Object, ObjectId, ObjectTable, Stream};
use crate::page::Page;
use crate::parser::{ParseOptions, PdfReader, Trailer};
use crate::resources::{ElementIdCounter, ResourceAllocator};
use crate::summary::DocumentSummary;
use crate::writer::{PdfWriter, WriterConfig};
use std::collections::HashSet;
use std::path::Path;

/// An editable PDF document.
///
/// Owns the object table and the trailer it was read from, plus the pages
/// reconstructed from them. Every save regenerates page content from the
/// elements and writes a complete file with a fresh cross-reference table.
///
/// # Example
///
/// ```rust
/// use pdfassembler::{Document, ImageData};
///
/// let mut doc = Document::blank(400.0, 400.0);
/// doc.add_text(0, "Hello", 50.0, 120.0, 24.0)?;
/// let pixels = ImageData::raw_rgb(3, 3, vec![255; 27])?;
/// doc.add_image(0, "Im1", pixels, 0.0, 0.0, 90.0, 90.0)?;
///
/// let bytes = doc.to_bytes()?;
/// let reloaded = Document::load(&bytes)?;
/// assert_eq!(reloaded.pages()[0].elements().len(), 2);
/// # Ok::<(), pdfassembler::PdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    objects: ObjectTable,
    trailer: Trailer,
    pages: Vec<Page>,
    allocator: ResourceAllocator,
    element_ids: ElementIdCounter,
}

impl Document {
    /// Parses a complete file buffer.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        Self::load_with_options(bytes, &ParseOptions::default())
    }

    pub fn load_with_options(bytes: &[u8], options: &ParseOptions) -> Result<Self> {
        let (objects, trailer) = PdfReader::new(bytes).read()?;

        let mut element_ids = ElementIdCounter::new();
        let pages = page_references(&objects, trailer.root())?
            .into_iter()
            .enumerate()
            .map(|(index, page)| Page::load(&objects, page, index, &mut element_ids, options))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            bytes = bytes.len(),
            objects = objects.len(),
            pages = pages.len(),
            elements = element_ids.issued(),
            "loaded document"
        );

        Ok(Self {
            allocator: ResourceAllocator::new(&objects),
            objects,
            trailer,
            pages,
            element_ids,
        })
    }

    /// A one-page document: Catalog (1), Pages (2), empty content (3) and
    /// Page (4).
    pub fn blank(width: f64, height: f64) -> Self {
        let catalog_id = ObjectId::new(1, 0);
        let pages_id = ObjectId::new(2, 0);
        let content_id = ObjectId::new(3, 0);
        let page_id = ObjectId::new(4, 0);

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        catalog.set("Pages", pages_id);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::name("Pages"));
        pages.set("Count", 1);
        pages.set("Kids", vec![Object::Reference(page_id)]);

        let mut page = Dictionary::new();
        page.set("Type", Object::name("Page"));
        page.set("Parent", pages_id);
        page.set(
            "MediaBox",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
        );
        page.set("Contents", content_id);
        page.set("Resources", Dictionary::new());

        let mut objects = ObjectTable::new();
        for (id, value) in [
            (catalog_id, Object::Dictionary(catalog)),
            (pages_id, Object::Dictionary(pages)),
            (content_id, Object::Stream(Stream::new(Vec::new()))),
            (page_id, Object::Dictionary(page)),
        ] {
            objects.insert(IndirectObject::new(id, value));
        }

        Self {
            allocator: ResourceAllocator::new(&objects),
            objects,
            trailer: Trailer::new(catalog_id),
            pages: vec![Page::new(0, page_id, width, height, vec![content_id])],
            element_ids: ElementIdCounter::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Looks an element up by id across all pages.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.pages.iter().find_map(|p| p.element(id))
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.pages.iter_mut().find_map(|p| p.element_mut(id))
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let count = self.pages.len();
        self.pages.get_mut(index).ok_or_else(|| {
            PdfError::EditValidation(format!(
                "page index {index} out of range (document has {count} pages)"
            ))
        })
    }

    /// Adds a text run at top-left (`x`, `y`) and returns its element id.
    pub fn add_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> Result<String> {
        let page_id = self.page_mut(page)?.object();
        let font = self.allocator.bind_font(&mut self.objects, page_id)?;
        let id = self.element_ids.next_id(page);

        let page = self.page_mut(page)?;
        Ok(page.add_text(id, font, text, x, y, font_size).id().to_string())
    }

    /// Stores `image` as a new XObject, binds it under `name` (or a free
    /// variant of it) and places it at top-left (`x`, `y`).
    #[allow(clippy::too_many_arguments)]
    pub fn add_image(
        &mut self,
        page: usize,
        name: &str,
        image: ImageData,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<String> {
        let page_id = self.page_mut(page)?.object();
        let stream = image.into_stream()?;
        let (name, xobject) =
            self.allocator
                .add_image_object(&mut self.objects, page_id, name, stream)?;
        let id = self.element_ids.next_id(page);

        let stream = self
            .objects
            .get(xobject)?
            .stream()
            .ok_or_else(|| PdfError::Format(format!("object {xobject} is not a stream")))?;
        let page = self
            .pages
            .get_mut(page)
            .ok_or_else(|| PdfError::EditValidation(format!("page index {page} out of range")))?;
        Ok(page
            .add_image(id, name, xobject, stream, x, y, width, height)
            .id()
            .to_string())
    }

    /// Removes an element from whichever page holds it.
    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        self.pages.iter_mut().find_map(|p| p.remove_element(id))
    }

    /// Validates the whole batch, then applies it page by page.
    pub fn apply_edits(&mut self, batch: &EditBatch) -> Result<()> {
        batch.validate(self.pages.len())?;

        for page_edits in &batch.pages {
            self.page_mut(page_edits.page_index)?
                .apply_edits(&page_edits.elements);
        }

        tracing::debug!(
            pages = batch.pages.len(),
            entries = batch.pages.iter().map(|p| p.elements.len()).sum::<usize>(),
            "applied edit batch"
        );
        Ok(())
    }

    pub fn to_summary(&self) -> DocumentSummary {
        DocumentSummary::from_pages(&self.pages)
    }

    fn rebuild_content(&mut self) -> Result<()> {
        let mut claimed = HashSet::new();
        for page in &mut self.pages {
            page.rebuild_content(&mut self.objects, &mut self.allocator, &mut claimed)?;
        }
        Ok(())
    }

    /// Serializes the document into memory.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.to_bytes_with_config(WriterConfig::default())
    }

    pub fn to_bytes_with_config(&mut self, config: WriterConfig) -> Result<Vec<u8>> {
        self.rebuild_content()?;
        let mut buffer = Vec::new();
        PdfWriter::with_config(&mut buffer, config).write_document(&self.objects, &self.trailer)?;
        Ok(buffer)
    }

    /// Writes the document to `path` and returns the number of bytes written.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.save_with_config(path, WriterConfig::default())
    }

    pub fn save_with_config(&mut self, path: impl AsRef<Path>, config: WriterConfig) -> Result<usize> {
        let path = path.as_ref();
        self.rebuild_content()?;

        let written = PdfWriter::new(path, config)?.write_document(&self.objects, &self.trailer)?;

        tracing::info!(
            path = %path.display(),
            bytes = written,
            objects = self.objects.len(),
            pages = self.pages.len(),
            "saved document"
        );
        Ok(written as usize)
    }
}

/// Page objects listed in the root `Pages` node's `Kids`, in order. Only one
/// level is followed; non-reference kids and nested `Pages` nodes are skipped.
fn page_references(objects: &ObjectTable, root: ObjectId) -> Result<Vec<ObjectId>> {
    let pages_id = objects
        .dict(root)?
        .get("Pages")
        .and_then(|p| p.as_reference())
        .ok_or_else(|| PdfError::Format("catalog has no Pages reference".to_string()))?;

    let Some(kids) = objects.dict(pages_id)?.get("Kids") else {
        return Ok(Vec::new());
    };
    let Some(kids) = objects.resolve(kids)?.as_array() else {
        return Err(PdfError::Format("Kids is not an array".to_string()));
    };

    let mut pages = Vec::with_capacity(kids.len());
    for kid in kids {
        let Some(id) = kid.as_reference() else {
            continue;
        };
        if objects.dict(id)?.get_type() == Some("Pages") {
            tracing::warn!(object = id.number(), "nested page tree node skipped");
            continue;
        }
        pages.push(id);
    }
    Ok(pages)
}
