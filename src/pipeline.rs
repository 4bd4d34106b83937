//! Pipeline – assembles the output SVG: document shell, provenance comment,
//! resolved `@font-face` rules, structural walk, final viewport.

use std::collections::HashMap;

use crate::context::{ConversionContext, IdGenerator, StackingLayers};
use crate::dom::{ElementNode, SourceDocument};
use crate::error::ConvertError;
use crate::font_face::collect_font_faces;
use crate::options::DomToSvgOptions;
use crate::svg::{format_number, SvgDocument, SVG_NAMESPACE, XLINK_NAMESPACE};
use crate::walker::{BoxWalker, TreeWalker};

/// Convert a whole document, starting at its root element.
pub fn document_to_svg(
    document: &SourceDocument,
    options: Option<&DomToSvgOptions>,
) -> Result<SvgDocument, ConvertError> {
    element_to_svg(document, &document.root, options)
}

/// Convert `element`, an element of `document`, with the default walker.
pub fn element_to_svg(
    document: &SourceDocument,
    element: &ElementNode,
    options: Option<&DomToSvgOptions>,
) -> Result<SvgDocument, ConvertError> {
    element_to_svg_with(&BoxWalker, document, element, options)
}

/// Convert `element` using a custom [`TreeWalker`].
///
/// Stylesheet and `@font-face` problems are logged and never fail the
/// conversion; an error from the walker is returned as-is.
pub fn element_to_svg_with(
    walker: &dyn TreeWalker,
    document: &SourceDocument,
    element: &ElementNode,
    options: Option<&DomToSvgOptions>,
) -> Result<SvgDocument, ConvertError> {
    let mut svg_document = SvgDocument::new();
    let svg_root = svg_document.root();
    svg_document.set_attribute(svg_root, "xmlns", SVG_NAMESPACE);
    svg_document.set_attribute(svg_root, "xmlns:xlink", XLINK_NAMESPACE);
    let comment = svg_document.create_comment(&provenance_comment(&document.location));
    svg_document.append(svg_root, comment);

    let font_faces = collect_font_faces(&document.style_sheets);
    log::debug!("Copied {} @font-face rule(s)", font_faces.len());
    let style = svg_document.append_element(svg_root, "style");
    for rule in &font_faces {
        svg_document.append_text(style, rule);
        svg_document.append_text(style, "\n");
    }

    // Read once: the same rectangle frames the walk and the viewport.
    let options = options.cloned().unwrap_or_default().resolve(element);
    let bounds = options.capture_area;

    let stacking_layers = StackingLayers::create(&mut svg_document, svg_root);
    {
        let mut ctx = ConversionContext {
            svg_document: &mut svg_document,
            current_svg_parent: svg_root,
            stacking_layers,
            parent_stacking_layer: svg_root,
            ids: IdGenerator::new(),
            labels: HashMap::new(),
            ancestor_masks: Vec::new(),
            options,
        };
        walker.walk(element, &mut ctx)?;
    }

    svg_document.set_attribute(svg_root, "width", &format_number(bounds.width));
    svg_document.set_attribute(svg_root, "height", &format_number(bounds.height));
    let view_box = [bounds.x, bounds.y, bounds.width, bounds.height]
        .map(format_number)
        .join(" ");
    svg_document.set_attribute(svg_root, "viewBox", &view_box);

    Ok(svg_document)
}

/// `--` may not appear inside an XML comment, so it is percent-encoded.
fn provenance_comment(location: &str) -> String {
    format!(
        " Generated by dom-to-svg from {} ",
        location.replace("--", "%2D%2D")
    )
}
