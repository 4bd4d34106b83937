//! Conversion options – what callers may configure, and the fully resolved
//! form handed to the tree walker.

use serde::{Deserialize, Serialize};

use crate::dom::{ElementNode, Rect};

/// Caller-supplied options. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomToSvgOptions {
    /// Region of the document to capture, in document coordinates.
    /// Defaults to the converted element's bounding rectangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_area: Option<Rect>,
    /// Keep `<a href>` elements as SVG links (default: `true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_links: Option<bool>,
}

/// Options with every default applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub capture_area: Rect,
    pub keep_links: bool,
}

impl DomToSvgOptions {
    pub fn with_capture_area(mut self, area: Rect) -> Self {
        self.capture_area = Some(area);
        self
    }

    pub fn with_keep_links(mut self, keep: bool) -> Self {
        self.keep_links = Some(keep);
        self
    }

    /// Apply defaults relative to the element being converted.
    pub fn resolve(&self, element: &ElementNode) -> ResolvedOptions {
        ResolvedOptions {
            capture_area: self.capture_area.unwrap_or(element.rect),
            keep_links: self.keep_links != Some(false),
        }
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_element() {
        let element = ElementNode::new("div", Rect::new(1.0, 2.0, 3.0, 4.0));
        let resolved = DomToSvgOptions::default().resolve(&element);
        assert_eq!(resolved.capture_area, element.rect);
        assert!(resolved.keep_links);
    }

    #[test]
    fn parses_camel_case_json() {
        let opts = DomToSvgOptions::from_json(
            r#"{"captureArea": {"x": 10, "y": 20, "width": 300, "height": 150}, "keepLinks": false}"#,
        )
        .unwrap();
        assert_eq!(opts.capture_area, Some(Rect::new(10.0, 20.0, 300.0, 150.0)));
        assert_eq!(opts.keep_links, Some(false));
        let round = DomToSvgOptions::from_json(&opts.to_json()).unwrap();
        assert_eq!(round, opts);
    }
}
