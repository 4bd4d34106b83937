//! Integration tests for the dom-to-svg pipeline.
//!
//! These tests validate:
//! - The viewport attributes follow the capture area
//! - The provenance comment and style element come before the walk output
//! - `@font-face` rules are copied with absolute sources, and bad sheets or
//!   rules are skipped without failing the conversion
//! - Walker errors propagate to the caller

use dom_to_svg::context::ConversionContext;
use dom_to_svg::css::StyleSheet;
use dom_to_svg::dom::{ElementNode, Rect, TextNode};
use dom_to_svg::error::{ConvertError, WalkError};
use dom_to_svg::svg::SvgNodeKind;
use dom_to_svg::{
    document_to_svg, element_to_svg, element_to_svg_with, DomToSvgOptions, SourceDocument,
    SvgDocument, TreeWalker,
};

// =====================================================================
// Helpers
// =====================================================================

fn page(style_sheets: Vec<StyleSheet>) -> SourceDocument {
    let heading = ElementNode::new("h1", Rect::new(8.0, 8.0, 784.0, 37.0))
        .with_style("display", "block")
        .with_child(TextNode::new("Hello", Rect::new(8.0, 8.0, 60.0, 37.0)).into());
    SourceDocument {
        location: "https://example.com/docs/page.html".to_string(),
        style_sheets,
        root: ElementNode::new("html", Rect::new(0.0, 0.0, 800.0, 600.0))
            .with_style("display", "block")
            .with_child(heading.into()),
    }
}

fn style_text(svg: &SvgDocument) -> String {
    let styles = svg.elements_by_name("style");
    assert_eq!(styles.len(), 1, "exactly one style element");
    svg.text_content(styles[0])
}

fn comment_text(svg: &SvgDocument) -> String {
    match &svg.node(svg.children(svg.root())[0]).kind {
        SvgNodeKind::Comment(text) => text.clone(),
        other => panic!("Expected comment first, got {:?}", other),
    }
}

// =====================================================================
// Viewport
// =====================================================================

#[test]
fn capture_area_sets_the_viewport() {
    let options = DomToSvgOptions::default().with_capture_area(Rect::new(10.0, 20.0, 300.0, 150.0));
    let svg = document_to_svg(&page(Vec::new()), Some(&options)).unwrap();
    let root = svg.root();
    assert_eq!(svg.attribute(root, "width"), Some("300"));
    assert_eq!(svg.attribute(root, "height"), Some("150"));
    assert_eq!(svg.attribute(root, "viewBox"), Some("10 20 300 150"));

    let xml = svg.to_xml_string().unwrap();
    assert!(xml.contains(r#"width="300" height="150" viewBox="10 20 300 150""#));
}

#[test]
fn viewbox_agrees_with_width_and_height() {
    let options = DomToSvgOptions::default().with_capture_area(Rect::new(0.5, -4.0, 120.25, 80.0));
    let svg = document_to_svg(&page(Vec::new()), Some(&options)).unwrap();
    let root = svg.root();
    let view_box: Vec<&str> = svg.attribute(root, "viewBox").unwrap().split(' ').collect();
    assert_eq!(view_box, ["0.5", "-4", "120.25", "80"]);
    assert_eq!(svg.attribute(root, "width"), Some(view_box[2]));
    assert_eq!(svg.attribute(root, "height"), Some(view_box[3]));
}

#[test]
fn omitted_options_match_explicit_defaults() {
    let doc = page(Vec::new());
    let implicit = document_to_svg(&doc, None).unwrap().to_xml_string().unwrap();
    let explicit = DomToSvgOptions::default()
        .with_keep_links(true)
        .with_capture_area(doc.root.rect);
    let explicit = document_to_svg(&doc, Some(&explicit))
        .unwrap()
        .to_xml_string()
        .unwrap();
    assert_eq!(implicit, explicit);
}

#[test]
fn converting_a_subtree_uses_its_box() {
    let doc = page(Vec::new());
    let heading = match &doc.root.children[0] {
        dom_to_svg::dom::DomNode::Element(e) => e,
        other => panic!("Expected element, got {:?}", other),
    };
    let svg = element_to_svg(&doc, heading, None).unwrap();
    assert_eq!(svg.attribute(svg.root(), "viewBox"), Some("8 8 784 37"));
}

// =====================================================================
// Document shell
// =====================================================================

#[test]
fn comment_and_style_precede_walk_output() {
    let svg = document_to_svg(&page(Vec::new()), None).unwrap();
    let children = svg.children(svg.root());
    assert!(children.len() > 2);
    assert!(matches!(svg.node(children[0]).kind, SvgNodeKind::Comment(_)));
    assert_eq!(svg.name(children[1]), Some("style"));
    assert!(children[2..].iter().all(|c| svg.name(*c) == Some("g")));
    assert_eq!(style_text(&svg), "");
}

#[test]
fn comment_never_contains_double_dash() {
    let mut doc = page(Vec::new());
    doc.location = "https://example.com/a--b/---c".to_string();
    let svg = document_to_svg(&doc, None).unwrap();
    let comment = comment_text(&svg);
    assert!(!comment.contains("--"));
    assert!(comment.contains("https://example.com/a%2D%2Db/%2D%2D-c"));
}

#[test]
fn serialised_document_shape() {
    let svg = document_to_svg(&page(Vec::new()), None).unwrap();
    let xml = svg.to_xml_string().unwrap();
    assert!(xml.starts_with(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink""#
    ));
    assert!(xml.contains("<!-- Generated by dom-to-svg from https://example.com/docs/page.html -->"));
    assert!(xml.contains("<style/>"));
    assert!(xml.contains(">Hello</text>"));
    assert!(xml.ends_with("</svg>"));
}

// =====================================================================
// @font-face copying
// =====================================================================

#[test]
fn relative_font_sources_become_absolute() {
    let sheet = StyleSheet::new(
        Some("https://example.com/css/site.css"),
        "body { color: red }\n@font-face { font-family: A; src: url(\"../fonts/a.woff2\") format(\"woff2\"), local(A); }",
    );
    let svg = document_to_svg(&page(vec![sheet]), None).unwrap();
    assert_eq!(
        style_text(&svg),
        "@font-face { font-family: A; src: url(\"https://example.com/fonts/a.woff2\") format(\"woff2\"), local(A); }\n"
    );
}

#[test]
fn absolute_font_sources_are_unchanged() {
    let rule = "@font-face { font-family: B; src: url(\"https://cdn.example/b.woff\"); }";
    let sheet = StyleSheet::new(Some("https://example.com/site.css"), rule);
    let svg = document_to_svg(&page(vec![sheet]), None).unwrap();
    assert_eq!(style_text(&svg), format!("{rule}\n"));
}

#[test]
fn inaccessible_sheet_is_skipped() {
    let sheets = vec![
        StyleSheet::inaccessible(Some("https://other.example/x.css")),
        StyleSheet::new(
            Some("https://example.com/site.css"),
            "@font-face { src: url(c.woff); }",
        ),
    ];
    let svg = document_to_svg(&page(sheets), None).unwrap();
    assert_eq!(
        style_text(&svg),
        "@font-face { src: url(https://example.com/c.woff); }\n"
    );
}

#[test]
fn malformed_rule_does_not_fail_conversion() {
    let sheet = StyleSheet::new(
        Some("https://example.com/site.css"),
        "@font-face { src: url(b c.woff); }\n@font-face { src: url(d.woff); }",
    );
    let svg = document_to_svg(&page(vec![sheet]), None).unwrap();
    assert_eq!(
        style_text(&svg),
        "@font-face { src: url(https://example.com/d.woff); }\n"
    );
}

#[test]
fn sheets_without_location_contribute_nothing() {
    let sheet = StyleSheet::new(None, "@font-face { src: url(a.woff); }");
    let svg = document_to_svg(&page(vec![sheet]), None).unwrap();
    assert_eq!(style_text(&svg), "");
}

// =====================================================================
// Walker errors
// =====================================================================

struct FailingWalker;

impl TreeWalker for FailingWalker {
    fn walk(&self, element: &ElementNode, _ctx: &mut ConversionContext<'_>) -> Result<(), WalkError> {
        Err(WalkError::new(&element.tag, "refused"))
    }
}

#[test]
fn walker_errors_propagate() {
    let doc = page(Vec::new());
    let err = element_to_svg_with(&FailingWalker, &doc, &doc.root, None).unwrap_err();
    match err {
        ConvertError::Walk(e) => {
            assert_eq!(e.tag, "html");
            assert_eq!(e.message, "refused");
        }
    }
}

#[test]
fn default_walker_rejects_non_finite_boxes() {
    let mut doc = page(Vec::new());
    doc.root = doc
        .root
        .with_child(ElementNode::new("div", Rect::new(f64::NAN, 0.0, 10.0, 10.0)).into());
    assert!(matches!(
        document_to_svg(&doc, None),
        Err(ConvertError::Walk(_))
    ));
}
