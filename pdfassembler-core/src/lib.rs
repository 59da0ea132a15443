//! # pdfassembler
//!
//! Loads a restricted subset of PDF, exposes the text runs and image
//! placements on each page as editable elements, and writes the result back
//! as a complete, internally consistent file.
//!
//! ## Features
//!
//! - **Parsing**: tokenizer, value parser and `obj ... endobj` extraction that
//!   tolerates stale cross-reference tables
//! - **Element model**: text and image elements reconstructed from content
//!   streams, edited in top-left page coordinates
//! - **Editing**: add text and images, apply JSON edit batches, remove elements
//! - **Serialization**: full rewrite with a fresh cross-reference table
//!
//! ## Quick Start
//!
//! ```rust
//! use pdfassembler::{apply_edits, load_document, to_summary, Document, EditBatch, Result};
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::blank(400.0, 400.0);
//! let id = doc.add_text(0, "Hello", 50.0, 120.0, 24.0)?;
//! let bytes = doc.to_bytes()?;
//!
//! let mut reloaded = load_document(&bytes)?;
//! let json = format!(
//!     r#"{{"pages":[{{"pageIndex":0,"elements":[{{"id":"{id}","x":100,"y":140,"text":"Edited"}}]}}]}}"#
//! );
//! apply_edits(&mut reloaded, &EditBatch::from_json(&json)?)?;
//!
//! let summary = to_summary(&reloaded);
//! assert_eq!(summary.pages[0].elements.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - tokens, values, object extraction and content interpretation
//! - [`objects`] - object model and the document's object table
//! - [`document`] / [`page`] - pages and the editing operations
//! - [`elements`] - text and image elements and their re-emission
//! - [`resources`] - object id issuance and per-page resource names
//! - [`writer`] - file serialization
//! - [`edits`] / [`summary`] - wire types for editing front ends

pub mod compression;
pub mod document;
pub mod edits;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod objects;
pub mod page;
pub mod parser;
pub mod resources;
pub mod summary;
pub mod writer;

pub use document::Document;
pub use edits::{EditBatch, ElementEdit, PageEdits};
pub use elements::{Element, ImageData, ImageElement, ImageEncoding, TextElement};
pub use error::{PdfError, Result};
pub use geometry::{Matrix, Point};
pub use objects::{Dictionary, Object, ObjectId, ObjectTable};
pub use page::Page;
pub use parser::{ParseError, ParseOptions};
pub use summary::{DocumentSummary, ElementSummary, PageSummary};
pub use writer::WriterConfig;

use std::path::Path;

/// Current version of pdfassembler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses a complete file buffer into an editable document.
pub fn load_document(bytes: &[u8]) -> Result<Document> {
    Document::load(bytes)
}

/// Snapshot of every page and element, ready for JSON.
pub fn to_summary(document: &Document) -> DocumentSummary {
    document.to_summary()
}

/// Validates `batch` in full, then applies it.
pub fn apply_edits(document: &mut Document, batch: &EditBatch) -> Result<()> {
    document.apply_edits(batch)
}

/// Rebuilds page content and writes the document to `destination`.
pub fn save_document(document: &mut Document, destination: impl AsRef<Path>) -> Result<usize> {
    document.save(destination)
}
