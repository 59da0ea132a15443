//! Serializable snapshot of a document for editing front ends.
//!
//! Coordinates are top-left based. Image elements carry their pixels as a
//! `data:` URL so a viewer needs no further round trip.

use crate::elements::Element;
use crate::page::Page;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    /// Sorted by `order`.
    pub elements: Vec<ElementSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementSummary {
    #[serde(rename_all = "camelCase")]
    Text {
        id: String,
        text: String,
        font: String,
        font_size: f64,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        order: usize,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        id: String,
        name: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        order: usize,
        src: String,
    },
}

impl ElementSummary {
    pub fn id(&self) -> &str {
        match self {
            ElementSummary::Text { id, .. } | ElementSummary::Image { id, .. } => id,
        }
    }

    pub fn from_element(element: &Element, page_height: f64) -> Self {
        let top_left = element.top_left(page_height);
        match element {
            Element::Text(t) => ElementSummary::Text {
                id: t.id().to_string(),
                text: t.text().to_string(),
                font: t.font().to_string(),
                font_size: t.font_size(),
                x: top_left.x,
                y: top_left.y,
                width: t.width(),
                height: t.height(),
                order: t.order(),
            },
            Element::Image(i) => ElementSummary::Image {
                id: i.id().to_string(),
                name: i.name().to_string(),
                x: top_left.x,
                y: top_left.y,
                width: i.width(),
                height: i.height(),
                order: i.order(),
                src: i.data_url(),
            },
        }
    }
}

impl PageSummary {
    pub fn from_page(page: &Page) -> Self {
        let mut elements: Vec<&Element> = page.elements().iter().collect();
        elements.sort_by_key(|e| e.order());

        Self {
            index: page.index(),
            width: page.width(),
            height: page.height(),
            elements: elements
                .into_iter()
                .map(|e| ElementSummary::from_element(e, page.height()))
                .collect(),
        }
    }
}

impl DocumentSummary {
    pub fn from_pages<'a>(pages: impl IntoIterator<Item = &'a Page>) -> Self {
        Self {
            pages: pages.into_iter().map(PageSummary::from_page).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }
}
