//! # dom-to-svg – freeze a rendered DOM into a standalone SVG
//!
//! The input is a [`SourceDocument`]: a snapshot of a laid-out page (element
//! boxes, computed styles, text runs and style sheets). Conversion runs in
//! these stages:
//!
//! 1. **Shell** – `<svg>` root with namespaces and a provenance comment ([`pipeline`])
//! 2. **Fonts** – `@font-face` rules copied with absolute `src` URLs ([`font_face`], [`css`])
//! 3. **Walk** – the element tree painted into stacking layers ([`walker`], [`context`], [`style`])
//! 4. **Viewport** – `width`/`height`/`viewBox` from the capture area ([`options`])
//!
//! An optional pass, [`inline_resources`], embeds images and fonts as
//! `data:` URIs.

pub mod context;
pub mod css;
pub mod dom;
pub mod error;
pub mod font_face;
pub mod fonts;
pub mod inline;
pub mod options;
pub mod pipeline;
pub mod style;
pub mod svg;
pub mod walker;

// Re-exports for convenience
pub use dom::SourceDocument;
pub use error::ConvertError;
pub use inline::{inline_resources, FileFetcher, ResourceFetcher};
pub use options::DomToSvgOptions;
pub use pipeline::{document_to_svg, element_to_svg, element_to_svg_with};
pub use svg::SvgDocument;
pub use walker::{BoxWalker, TreeWalker};
