//! Structural conversion of the snapshot tree into SVG.
//!
//! The assembler only knows the [`TreeWalker`] interface. [`BoxWalker`] is
//! the walker used by default: it paints each element's box (background and
//! border), its images and its text runs, placing every element in the
//! stacking layer its computed style calls for.

use crate::context::{AncestorMask, ConversionContext, StackingLayer, StackingLayers};
use crate::dom::{DomNode, ElementNode, Rect, TextNode};
use crate::error::WalkError;
use crate::style::{resolve_style, ComputedStyle, Display, Overflow};
use crate::svg::{format_number, NodeId};

/// Converts an element subtree into output nodes, mutating `ctx` in place.
pub trait TreeWalker {
    fn walk(&self, element: &ElementNode, ctx: &mut ConversionContext<'_>) -> Result<(), WalkError>;
}

/// The default walker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxWalker;

impl TreeWalker for BoxWalker {
    fn walk(&self, element: &ElementNode, ctx: &mut ConversionContext<'_>) -> Result<(), WalkError> {
        walk_element(element, ctx)
    }
}

/// Pick the layer of the enclosing stacking context an element paints in.
pub fn paint_layer(style: &ComputedStyle) -> StackingLayer {
    if style.is_stacking_context() || style.is_positioned() {
        return match style.z_index {
            Some(z) if z < 0 => StackingLayer::ChildStackingContextsWithNegativeStackLevels,
            Some(z) if z > 0 => StackingLayer::ChildStackingContextsWithPositiveStackLevels,
            _ => StackingLayer::ChildStackingContextsWithStackLevelZeroAndPositionedDescendantsWithStackLevelZero,
        };
    }
    if style.float {
        StackingLayer::NonPositionedFloats
    } else if style.is_inline_level() {
        StackingLayer::InFlowInlineLevelNonPositionedDescendants
    } else {
        StackingLayer::InFlowNonInlineNonPositionedDescendants
    }
}

fn check_rect(tag: &str, rect: &Rect) -> Result<(), WalkError> {
    let finite = [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if finite {
        Ok(())
    } else {
        Err(WalkError::new(tag, "bounding box is not finite"))
    }
}

fn set_rect(ctx: &mut ConversionContext<'_>, id: NodeId, rect: &Rect) {
    let doc = &mut *ctx.svg_document;
    doc.set_attribute(id, "x", &format_number(rect.x));
    doc.set_attribute(id, "y", &format_number(rect.y));
    doc.set_attribute(id, "width", &format_number(rect.width));
    doc.set_attribute(id, "height", &format_number(rect.height));
}

fn walk_element(element: &ElementNode, ctx: &mut ConversionContext<'_>) -> Result<(), WalkError> {
    check_rect(&element.tag, &element.rect)?;
    let style = resolve_style(element);
    if style.display == Display::None {
        return Ok(());
    }

    let parent = ctx.stacking_layers.get(paint_layer(&style));
    let link = match element.attr("href") {
        Some(href) if element.is("a") && ctx.options.keep_links => Some(href),
        _ => None,
    };
    let group = ctx
        .svg_document
        .append_element(parent, if link.is_some() { "a" } else { "g" });
    ctx.svg_document.set_attribute(group, "data-tag", &element.tag);
    if let Some(href) = link {
        ctx.svg_document.set_attribute(group, "href", href);
        ctx.svg_document.set_attribute(group, "xlink:href", href);
    }
    if let Some(mask) = ctx.ancestor_masks.last() {
        let clip = format!("url(#{})", mask.id);
        ctx.svg_document.set_attribute(group, "clip-path", &clip);
    }
    if style.opacity < 1.0 {
        ctx.svg_document
            .set_attribute(group, "opacity", &format_number(style.opacity));
    }
    apply_labels(element, group, ctx);

    let child_layers = if style.is_stacking_context() {
        Some(StackingLayers::create(&mut *ctx.svg_document, group))
    } else {
        None
    };
    let paint_parent = child_layers
        .as_ref()
        .map(|layers| layers.get(StackingLayer::RootBackgroundAndBorders))
        .unwrap_or(group);

    if !style.visibility_hidden {
        paint_box(element, &style, paint_parent, ctx);
        if element.is("img") {
            paint_image(element, paint_parent, ctx);
        }
    }

    let pushed_mask = style.overflow == Overflow::Clip && !element.rect.is_empty();
    if pushed_mask {
        let id = ctx.ids.next("clip-path");
        let clip_path = ctx.svg_document.append_element(paint_parent, "clipPath");
        ctx.svg_document.set_attribute(clip_path, "id", &id);
        if let Some(outer) = ctx.ancestor_masks.last() {
            let clip = format!("url(#{})", outer.id);
            ctx.svg_document.set_attribute(clip_path, "clip-path", &clip);
        }
        let clip_rect = ctx.svg_document.append_element(clip_path, "rect");
        set_rect(ctx, clip_rect, &element.rect);
        ctx.ancestor_masks.push(AncestorMask {
            id,
            rect: element.rect,
        });
    }

    let saved_parent = ctx.current_svg_parent;
    let saved_layers = ctx.stacking_layers.clone();
    let saved_stacking_parent = ctx.parent_stacking_layer;
    ctx.current_svg_parent = group;
    if let Some(layers) = child_layers {
        ctx.stacking_layers = layers;
        ctx.parent_stacking_layer = group;
    }

    let result = walk_children(element, &style, ctx);

    ctx.current_svg_parent = saved_parent;
    ctx.stacking_layers = saved_layers;
    ctx.parent_stacking_layer = saved_stacking_parent;
    if pushed_mask {
        ctx.ancestor_masks.pop();
    }
    result
}

fn walk_children(
    element: &ElementNode,
    style: &ComputedStyle,
    ctx: &mut ConversionContext<'_>,
) -> Result<(), WalkError> {
    for child in &element.children {
        match child {
            DomNode::Element(e) => walk_element(e, ctx)?,
            DomNode::Text(t) => {
                if !style.visibility_hidden {
                    walk_text(t, style, ctx);
                }
            }
        }
    }
    Ok(())
}

/// `<label for=x>` mints an id; the element with `id=x` is labelled by it.
fn apply_labels(element: &ElementNode, group: NodeId, ctx: &mut ConversionContext<'_>) {
    if element.is("label") {
        if let Some(target) = element.attr("for") {
            let id = ctx.ids.next("label");
            ctx.svg_document.set_attribute(group, "id", &id);
            ctx.labels.insert(target.to_owned(), id);
        }
    }
    if let Some(label) = element.id().and_then(|id| ctx.labels.get(id)) {
        let label = label.clone();
        ctx.svg_document
            .set_attribute(group, "aria-labelledby", &label);
    }
}

fn paint_box(
    element: &ElementNode,
    style: &ComputedStyle,
    parent: NodeId,
    ctx: &mut ConversionContext<'_>,
) {
    let rect = element.rect;
    if rect.is_empty() {
        return;
    }
    let radius = (style.border_radius > 0.0).then(|| format_number(style.border_radius));

    if let Some(background) = &style.background_color {
        let bg = ctx.svg_document.append_element(parent, "rect");
        set_rect(ctx, bg, &rect);
        ctx.svg_document.set_attribute(bg, "fill", background);
        if let Some(r) = &radius {
            ctx.svg_document.set_attribute(bg, "rx", r);
        }
    }

    if style.border_width > 0.0 {
        // Strokes are centred on the path, so inset by half the width.
        let half = style.border_width / 2.0;
        let inset = Rect::new(
            rect.x + half,
            rect.y + half,
            (rect.width - style.border_width).max(0.0),
            (rect.height - style.border_width).max(0.0),
        );
        let border = ctx.svg_document.append_element(parent, "rect");
        set_rect(ctx, border, &inset);
        let doc = &mut *ctx.svg_document;
        doc.set_attribute(border, "fill", "none");
        doc.set_attribute(border, "stroke", &style.border_color);
        doc.set_attribute(border, "stroke-width", &format_number(style.border_width));
        if let Some(r) = &radius {
            doc.set_attribute(border, "rx", r);
        }
    }
}

fn paint_image(element: &ElementNode, parent: NodeId, ctx: &mut ConversionContext<'_>) {
    let Some(src) = element.attr("src") else {
        return;
    };
    let image = ctx.svg_document.append_element(parent, "image");
    set_rect(ctx, image, &element.rect);
    let doc = &mut *ctx.svg_document;
    doc.set_attribute(image, "href", src);
    doc.set_attribute(image, "xlink:href", src);
    doc.set_attribute(image, "preserveAspectRatio", "none");
    if let Some(alt) = element.attr("alt") {
        doc.set_attribute(image, "aria-label", alt);
    }
}

fn walk_text(text: &TextNode, style: &ComputedStyle, ctx: &mut ConversionContext<'_>) {
    if text.text.trim().is_empty()
        || text.rect.is_empty()
        || !text.rect.intersects(&ctx.options.capture_area)
    {
        return;
    }
    let node = ctx
        .svg_document
        .append_element(ctx.current_svg_parent, "text");
    let doc = &mut *ctx.svg_document;
    doc.set_attribute(node, "x", &format_number(text.rect.x));
    doc.set_attribute(node, "y", &format_number(text.rect.y));
    doc.set_attribute(node, "textLength", &format_number(text.rect.width));
    doc.set_attribute(node, "lengthAdjust", "spacingAndGlyphs");
    doc.set_attribute(node, "dominant-baseline", "text-before-edge");
    doc.set_attribute(node, "xml:space", "preserve");
    if let Some(mask) = ctx.ancestor_masks.last() {
        doc.set_attribute(node, "clip-path", &format!("url(#{})", mask.id));
    }
    doc.set_attribute(node, "fill", &style.color);
    let font = [
        ("font-family", &style.font_family),
        ("font-size", &style.font_size),
        ("font-weight", &style.font_weight),
        ("font-style", &style.font_style),
    ];
    for (name, value) in font {
        if let Some(value) = value {
            doc.set_attribute(node, name, value);
        }
    }
    doc.append_text(node, &text.text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::IdGenerator;
    use crate::options::ResolvedOptions;
    use crate::svg::SvgDocument;
    use std::collections::HashMap;

    fn run(root: &ElementNode, keep_links: bool) -> Result<SvgDocument, WalkError> {
        let mut doc = SvgDocument::new();
        let svg = doc.root();
        let layers = StackingLayers::create(&mut doc, svg);
        let mut ctx = ConversionContext {
            svg_document: &mut doc,
            current_svg_parent: svg,
            stacking_layers: layers,
            parent_stacking_layer: svg,
            ids: IdGenerator::new(),
            labels: HashMap::new(),
            ancestor_masks: Vec::new(),
            options: ResolvedOptions {
                capture_area: root.rect,
                keep_links,
            },
        };
        BoxWalker.walk(root, &mut ctx)?;
        Ok(doc)
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn paints_background_and_text() {
        let root = ElementNode::new("div", rect(0.0, 0.0, 100.0, 40.0))
            .with_style("display", "block")
            .with_style("background-color", "rgb(255, 0, 0)")
            .with_style("color", "rgb(0, 0, 255)")
            .with_child(TextNode::new("Hello", rect(4.0, 4.0, 40.0, 16.0)).into());
        let doc = run(&root, true).unwrap();
        let rects = doc.elements_by_name("rect");
        assert_eq!(rects.len(), 1);
        assert_eq!(doc.attribute(rects[0], "fill"), Some("rgb(255, 0, 0)"));
        let texts = doc.elements_by_name("text");
        assert_eq!(texts.len(), 1);
        assert_eq!(doc.text_content(texts[0]), "Hello");
        assert_eq!(doc.attribute(texts[0], "fill"), Some("rgb(0, 0, 255)"));
    }

    #[test]
    fn display_none_is_skipped() {
        let root = ElementNode::new("div", rect(0.0, 0.0, 10.0, 10.0)).with_child(
            ElementNode::new("p", rect(0.0, 0.0, 10.0, 10.0))
                .with_style("display", "none")
                .with_child(TextNode::new("gone", rect(0.0, 0.0, 10.0, 10.0)).into())
                .into(),
        );
        let doc = run(&root, true).unwrap();
        assert!(doc.elements_by_name("text").is_empty());
    }

    #[test]
    fn overflow_clips_descendants() {
        let inner = ElementNode::new("div", rect(0.0, 0.0, 50.0, 50.0))
            .with_style("overflow", "hidden")
            .with_child(ElementNode::new("span", rect(0.0, 0.0, 80.0, 10.0)).into());
        let root = ElementNode::new("div", rect(0.0, 0.0, 100.0, 100.0))
            .with_style("overflow", "hidden")
            .with_child(inner.into());
        let doc = run(&root, true).unwrap();
        let clips = doc.elements_by_name("clipPath");
        assert_eq!(clips.len(), 2);
        assert_eq!(doc.attribute(clips[0], "id"), Some("clip-path1"));
        assert_eq!(doc.attribute(clips[1], "clip-path"), Some("url(#clip-path1)"));
        let span = doc
            .elements_by_name("g")
            .into_iter()
            .find(|g| doc.attribute(*g, "data-tag") == Some("span"))
            .unwrap();
        assert_eq!(doc.attribute(span, "clip-path"), Some("url(#clip-path2)"));
    }

    #[test]
    fn overflow_clips_own_text_runs() {
        let root = ElementNode::new("div", rect(0.0, 0.0, 50.0, 20.0))
            .with_style("overflow", "hidden")
            .with_child(TextNode::new("a very long line", rect(0.0, 0.0, 200.0, 16.0)).into());
        let doc = run(&root, true).unwrap();
        let texts = doc.elements_by_name("text");
        assert_eq!(texts.len(), 1);
        assert_eq!(doc.attribute(texts[0], "clip-path"), Some("url(#clip-path1)"));
    }

    #[test]
    fn unclipped_text_has_no_clip_path() {
        let root = ElementNode::new("div", rect(0.0, 0.0, 50.0, 20.0))
            .with_child(TextNode::new("short", rect(0.0, 0.0, 30.0, 16.0)).into());
        let doc = run(&root, true).unwrap();
        let texts = doc.elements_by_name("text");
        assert_eq!(doc.attribute(texts[0], "clip-path"), None);
    }

    #[test]
    fn links_follow_keep_links() {
        let root = ElementNode::new("a", rect(0.0, 0.0, 10.0, 10.0))
            .with_attribute("href", "https://example.com/");
        let kept = run(&root, true).unwrap();
        let a = kept.elements_by_name("a");
        assert_eq!(a.len(), 1);
        assert_eq!(kept.attribute(a[0], "xlink:href"), Some("https://example.com/"));
        let dropped = run(&root, false).unwrap();
        assert!(dropped.elements_by_name("a").is_empty());
    }

    #[test]
    fn labels_are_linked_to_their_target() {
        let root = ElementNode::new("form", rect(0.0, 0.0, 100.0, 20.0))
            .with_child(
                ElementNode::new("label", rect(0.0, 0.0, 40.0, 20.0))
                    .with_attribute("for", "name")
                    .into(),
            )
            .with_child(
                ElementNode::new("input", rect(40.0, 0.0, 60.0, 20.0))
                    .with_attribute("id", "name")
                    .into(),
            );
        let doc = run(&root, true).unwrap();
        let input = doc
            .elements_by_name("g")
            .into_iter()
            .find(|g| doc.attribute(*g, "data-tag") == Some("input"))
            .unwrap();
        assert_eq!(doc.attribute(input, "aria-labelledby"), Some("label1"));
    }

    #[test]
    fn negative_z_index_goes_to_its_layer() {
        let root = ElementNode::new("div", rect(0.0, 0.0, 10.0, 10.0)).with_child(
            ElementNode::new("div", rect(0.0, 0.0, 10.0, 10.0))
                .with_style("position", "absolute")
                .with_style("z-index", "-1")
                .into(),
        );
        let doc = run(&root, true).unwrap();
        let layer = doc
            .elements_by_name("g")
            .into_iter()
            .find(|g| {
                doc.attribute(*g, "data-stacking-layer")
                    == Some("childStackingContextsWithNegativeStackLevels")
            })
            .unwrap();
        assert_eq!(doc.children(layer).len(), 1);
    }

    #[test]
    fn non_finite_boxes_fail_the_walk() {
        let root = ElementNode::new("div", rect(0.0, f64::NAN, 10.0, 10.0));
        let err = run(&root, true).unwrap_err();
        assert_eq!(err.tag, "div");
    }
}
