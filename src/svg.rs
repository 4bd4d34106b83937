//! Output document – an arena-backed SVG tree addressed by [`NodeId`]
//! handles, serialised with `quick-xml`.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::SvgError;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Handle to a node of an [`SvgDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum SvgNodeKind {
    Element {
        name: String,
        /// Attributes in insertion order.
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    pub kind: SvgNodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A standalone SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    nodes: Vec<SvgNode>,
    root: NodeId,
}

impl Default for SvgDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgDocument {
    /// A document holding an empty `<svg>` root element.
    pub fn new() -> Self {
        Self {
            nodes: vec![SvgNode {
                kind: SvgNodeKind::Element {
                    name: "svg".to_owned(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SvgNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element name, or `None` for text and comments.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            SvgNodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(SvgNodeKind::Element {
            name: name.to_owned(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(SvgNodeKind::Text(text.to_owned()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(SvgNodeKind::Comment(text.to_owned()))
    }

    fn push(&mut self, kind: SvgNodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SvgNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.create_element(name);
        self.append(parent, id);
        id
    }

    /// Append text to `parent`, merging with a trailing text child.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let SvgNodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.append(parent, id);
    }

    /// Set an attribute, replacing an existing one in place.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let SvgNodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_owned(),
                None => attributes.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            SvgNodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Concatenated text content of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            SvgNodeKind::Text(text) => out.push_str(text),
            SvgNodeKind::Comment(_) => {}
            SvgNodeKind::Element { .. } => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        let text_id = self.create_text(text);
        self.append(id, text_id);
    }

    /// All elements named `name` under the root, in document order.
    pub fn elements_by_name(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.name(id) == Some(name) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Serialise as an XML string.
    pub fn to_xml_string(&self) -> Result<String, SvgError> {
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, self.root)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), SvgError> {
        let node = &self.nodes[id.0];
        match &node.kind {
            SvgNodeKind::Text(text) => write_event(
                writer,
                Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))),
            ),
            SvgNodeKind::Comment(text) => write_event(
                writer,
                Event::Comment(BytesText::from_escaped(Cow::Borrowed(text.as_str()))),
            ),
            SvgNodeKind::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.children.is_empty() {
                    return write_event(writer, Event::Empty(start));
                }
                write_event(writer, Event::Start(start))?;
                for child in &node.children {
                    self.write_node(writer, *child)?;
                }
                write_event(writer, Event::End(BytesEnd::new(name.as_str())))
            }
        }
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SvgError> {
    writer
        .write_event(event)
        .map_err(|e| SvgError::Write(e.to_string()))
}

/// Format a number like ECMAScript's `Number.prototype.toString`: shortest
/// round-trip digits, plain notation for exponents in `-7 < e < 21`,
/// `1e+21` style otherwise.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `-1.2345e-7`.
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // value = 0.DIGITS × 10^n
    let n = exponent + 1;

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if n - 1 < 0 { '-' } else { '+' });
        out.push_str(&(n - 1).abs().to_string());
    }
    out
}
