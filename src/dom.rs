//! Source snapshot – a rendered document captured as plain data.
//!
//! Every element and text run carries the bounding rectangle it was laid out
//! at and the computed style properties the walker needs, so conversion never
//! has to run layout itself. Snapshots are usually loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::css::StyleSheet;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// A captured document: its location, stylesheets and root element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    /// The document URL, recorded in the output's provenance comment.
    pub location: String,
    /// Stylesheets in document order.
    #[serde(default)]
    pub style_sheets: Vec<StyleSheet>,
    pub root: ElementNode,
}

/// A node in the snapshot tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DomNode {
    Element(ElementNode),
    Text(TextNode),
}

/// An element with its layout box and computed style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementNode {
    /// Lower-case tag name.
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Computed style properties, keyed by CSS property name.
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    /// Border box as returned by `getBoundingClientRect()`.
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<DomNode>,
}

/// A run of rendered text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    pub rect: Rect,
}

impl ElementNode {
    pub fn new(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            rect,
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_owned(), value.to_owned());
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// A computed style property, or `None` when it was not captured.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}

impl TextNode {
    pub fn new(text: &str, rect: Rect) -> Self {
        Self {
            text: text.to_owned(),
            rect,
        }
    }
}

impl From<ElementNode> for DomNode {
    fn from(element: ElementNode) -> Self {
        DomNode::Element(element)
    }
}

impl From<TextNode> for DomNode {
    fn from(text: TextNode) -> Self {
        DomNode::Text(text)
    }
}

impl SourceDocument {
    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
