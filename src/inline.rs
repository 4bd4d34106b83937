//! Resource inlining – replaces external image and font references in a
//! converted document with `data:` URIs so it no longer depends on the
//! network.
//!
//! Each failing resource is logged and its reference left untouched.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use url::Url;

use crate::css::{RuleBlock, RuleKind, StyleSheet, ValueAst, ValueNode};
use crate::error::InlineError;
use crate::fonts::font_mime_type;
use crate::svg::{NodeId, SvgDocument};

/// Bytes of a fetched resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    /// Content type reported by the source, if any.
    pub content_type: Option<String>,
}

/// Loads the bytes behind a URL.
pub trait ResourceFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedResource, InlineError>;
}

/// Serves `file:` URLs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ResourceFetcher for FileFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedResource, InlineError> {
        let fail = |message: String| InlineError::Fetch {
            url: url.to_string(),
            message,
        };
        if url.scheme() != "file" {
            return Err(fail(format!("unsupported scheme {:?}", url.scheme())));
        }
        let path = url
            .to_file_path()
            .map_err(|()| fail("not a local path".to_string()))?;
        let bytes = std::fs::read(&path).map_err(|e| fail(e.to_string()))?;
        Ok(FetchedResource {
            bytes,
            content_type: None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum ResourceKind {
    Image,
    Font,
}

/// Memoises fetches within one inlining pass.
struct Inliner<'f> {
    fetcher: &'f dyn ResourceFetcher,
    cache: HashMap<String, String>,
    inlined: usize,
}

impl Inliner<'_> {
    fn data_uri(&mut self, href: &str, kind: ResourceKind) -> Result<String, InlineError> {
        if let Some(cached) = self.cache.get(href) {
            return Ok(cached.clone());
        }
        let url = Url::parse(href).map_err(|e| InlineError::Url(href.to_owned(), e))?;
        let resource = self.fetcher.fetch(&url)?;
        let mime = match resource.content_type {
            Some(content_type) => content_type,
            None => sniff(&resource.bytes, kind)
                .ok_or_else(|| InlineError::UnknownType(href.to_owned()))?
                .to_owned(),
        };
        let uri = format!("data:{mime};base64,{}", BASE64_STD.encode(&resource.bytes));
        self.cache.insert(href.to_owned(), uri.clone());
        Ok(uri)
    }
}

fn sniff(bytes: &[u8], kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Image => image::guess_format(bytes).ok().map(|f| f.to_mime_type()),
        ResourceKind::Font => font_mime_type(bytes),
    }
}

fn is_inlined(href: &str) -> bool {
    href
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Inline every `<image>` source and every `@font-face` `url()` of
/// `<style>` elements. Returns the number of references replaced.
pub fn inline_resources(document: &mut SvgDocument, fetcher: &dyn ResourceFetcher) -> usize {
    let mut inliner = Inliner {
        fetcher,
        cache: HashMap::new(),
        inlined: 0,
    };
    for image in document.elements_by_name("image") {
        inline_image(document, image, &mut inliner);
    }
    for style in document.elements_by_name("style") {
        inline_style(document, style, &mut inliner);
    }
    inliner.inlined
}

fn inline_image(document: &mut SvgDocument, image: NodeId, inliner: &mut Inliner<'_>) {
    for attr in ["href", "xlink:href"] {
        let Some(href) = document.attribute(image, attr).map(str::to_owned) else {
            continue;
        };
        if is_inlined(&href) {
            continue;
        }
        match inliner.data_uri(&href, ResourceKind::Image) {
            Ok(uri) => {
                document.set_attribute(image, attr, &uri);
                inliner.inlined += 1;
            }
            Err(e) => log::warn!("Could not inline image: {e}"),
        }
    }
}

fn inline_style(document: &mut SvgDocument, style: NodeId, inliner: &mut Inliner<'_>) {
    let text = document.text_content(style);
    let rules = match StyleSheet::new(None, text).rules() {
        Ok(rules) => rules,
        Err(e) => {
            log::warn!("Could not read style element: {e}");
            return;
        }
    };
    if rules.is_empty() {
        return;
    }
    let mut out = String::new();
    for rule in rules {
        let css = if rule.kind == RuleKind::FontFace {
            match inline_font_face(&rule.css_text, inliner) {
                Ok(css) => css,
                Err(e) => {
                    log::warn!("Could not inline @font-face sources: {e}");
                    rule.css_text
                }
            }
        } else {
            rule.css_text
        };
        out.push_str(&css);
        out.push('\n');
    }
    document.set_text_content(style, &out);
}

fn inline_font_face(css_text: &str, inliner: &mut Inliner<'_>) -> Result<String, InlineError> {
    let mut block = RuleBlock::parse(css_text)?;
    let Some(src) = block.get("src") else {
        return Ok(css_text.to_owned());
    };
    let mut value = ValueAst::parse(src)?;
    value.walk_mut(|node| {
        let ValueNode::Function(function) = node else {
            return;
        };
        if !function.is_named("url") {
            return;
        }
        let Some(argument) = function.first_argument_mut() else {
            return;
        };
        let Some(href) = argument.value().map(str::to_owned) else {
            return;
        };
        if is_inlined(&href) {
            return;
        }
        match inliner.data_uri(&href, ResourceKind::Font) {
            Ok(uri) => {
                argument.set_value(uri);
                inliner.inlined += 1;
            }
            Err(e) => log::warn!("Could not inline font: {e}"),
        }
    });
    block.set_all("src", &value.to_css());
    Ok(block.to_css())
}
