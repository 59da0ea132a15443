//! Edit batches sent by an editing front end.
//!
//! A batch lists, per page, updates keyed by element id. Every field of an
//! update is optional and applied independently. Batches are validated in
//! full before anything is mutated; ids that match no element are skipped.

use crate::error::{PdfError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditBatch {
    #[serde(default)]
    pub pages: Vec<PageEdits>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEdits {
    #[serde(rename = "pageIndex", alias = "page_index")]
    pub page_index: usize,
    #[serde(default)]
    pub elements: Vec<ElementEdit>,
}

/// Field updates for one element. `x` and `y` only take effect together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementEdit {
    pub id: String,
    /// Expected element kind, `"text"` or `"image"`. A mismatch skips the entry.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "fontSize",
        alias = "font_size",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

impl ElementEdit {
    /// An edit that changes nothing on element `id`.
    pub fn for_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: None,
            text: None,
            font_size: None,
            x: None,
            y: None,
            width: None,
            height: None,
            order: None,
        }
    }

    /// True when the entry is meant for an element of `kind`.
    pub fn targets_kind(&self, kind: &str) -> bool {
        self.kind.as_deref().map_or(true, |k| k == kind)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.x.is_some() != self.y.is_some() {
            return Err(format!("element {}: x and y must be given together", self.id));
        }

        let numbers = [
            ("x", self.x),
            ("y", self.y),
            ("fontSize", self.font_size),
            ("width", self.width),
            ("height", self.height),
        ];
        for (field, value) in numbers {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(format!("element {}: {field} is not a finite number", self.id));
                }
            }
        }

        let positive = [
            ("fontSize", self.font_size),
            ("width", self.width),
            ("height", self.height),
        ];
        for (field, value) in positive {
            if matches!(value, Some(v) if v <= 0.0) {
                return Err(format!("element {}: {field} must be positive", self.id));
            }
        }

        Ok(())
    }
}

impl EditBatch {
    /// Parses the JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PdfError::EditValidation(e.to_string()))
    }

    /// Checks the whole batch against a document with `page_count` pages.
    pub fn validate(&self, page_count: usize) -> Result<()> {
        for page in &self.pages {
            if page.page_index >= page_count {
                return Err(PdfError::EditValidation(format!(
                    "page index {} out of range (document has {page_count} pages)",
                    page.page_index
                )));
            }
            for edit in &page.elements {
                edit.validate().map_err(PdfError::EditValidation)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.elements.is_empty())
    }
}
