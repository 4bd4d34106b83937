//! Error types.
//!
//! Stylesheet and `@font-face` failures are recoverable: they are logged by
//! the collector and the offending sheet or rule contributes nothing. Walk
//! failures are not, and surface from the conversion entry points.

use thiserror::Error;

/// A stylesheet whose rule list cannot be enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleSheetError {
    /// Cross-origin or detached sheet: the rules are not readable.
    #[error("cannot access rules of stylesheet {}", href.as_deref().unwrap_or("<inline>"))]
    Inaccessible { href: Option<String> },
}

/// Failure while parsing a CSS value or declaration block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct CssSyntaxError {
    pub message: String,
    pub offset: usize,
}

impl CssSyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Failure resolving the sources of a single `@font-face` rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontFaceError {
    #[error("malformed src value: {0}")]
    Value(CssSyntaxError),

    #[error("malformed @font-face block: {0}")]
    Declaration(CssSyntaxError),

    #[error("stylesheet location {base:?} is not a valid base URL: {source}")]
    Base {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot resolve {href:?} against {base:?}: {source}")]
    Url {
        href: String,
        base: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure raised by a [`TreeWalker`](crate::walker::TreeWalker).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree walk failed at <{tag}>: {message}")]
pub struct WalkError {
    pub tag: String,
    pub message: String,
}

impl WalkError {
    pub fn new(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

/// Failure writing an [`SvgDocument`](crate::svg::SvgDocument) as XML.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("xml write error: {0}")]
    Write(String),

    #[error("serialised document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failure inlining one external resource.
#[derive(Debug, Error)]
pub enum InlineError {
    #[error("invalid resource url {0:?}: {1}")]
    Url(String, url::ParseError),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("unknown content type for {0}")]
    UnknownType(String),

    #[error(transparent)]
    Css(#[from] CssSyntaxError),
}

/// Errors surfaced by the conversion entry points.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Walk(#[from] WalkError),
}
