//! Stylesheets captured with a snapshot, and their top-level rule lists.

use cssparser::{ParseError, Parser, ParserInput, Token};
use serde::{Deserialize, Serialize};

use crate::error::StyleSheetError;

/// A stylesheet of the source document.
///
/// `css` is `None` when the sheet's rules could not be read at capture time
/// (a cross-origin or detached sheet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// Absolute location of the sheet; `None` for inline `<style>` elements.
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    FontFace,
    /// A qualified (selector) rule.
    Style,
    /// Any other at-rule, lower-cased name without the `@`.
    At(String),
}

/// One top-level rule with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub kind: RuleKind,
    pub css_text: String,
}

impl StyleSheet {
    pub fn new(href: Option<&str>, css: impl Into<String>) -> Self {
        Self {
            href: href.map(str::to_owned),
            css: Some(css.into()),
        }
    }

    /// A sheet whose rule list cannot be read.
    pub fn inaccessible(href: Option<&str>) -> Self {
        Self {
            href: href.map(str::to_owned),
            css: None,
        }
    }

    /// The sheet's top-level rules in source order.
    ///
    /// Rules nested in conditional groups (`@media`, `@supports`) are not
    /// listed, matching what the CSSOM exposes at the top level.
    pub fn rules(&self) -> Result<Vec<CssRule>, StyleSheetError> {
        let css = self.css.as_deref().ok_or_else(|| StyleSheetError::Inaccessible {
            href: self.href.clone(),
        })?;
        Ok(split_rules(css))
    }
}

fn split_rules(css: &str) -> Vec<CssRule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    let mut current: Option<(cssparser::SourcePosition, RuleKind)> = None;

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match (current.take(), token) {
            (None, Token::WhiteSpace(_) | Token::Comment(_) | Token::CDO | Token::CDC) => {}
            (None, Token::AtKeyword(name)) => {
                let kind = if name.eq_ignore_ascii_case("font-face") {
                    RuleKind::FontFace
                } else {
                    RuleKind::At(name.to_ascii_lowercase())
                };
                current = Some((start, kind));
            }
            (None, Token::CurlyBracketBlock) => {
                skip_block(&mut parser);
                rules.push(CssRule {
                    kind: RuleKind::Style,
                    css_text: parser.slice_from(start).to_owned(),
                });
            }
            (None, _) => current = Some((start, RuleKind::Style)),
            (Some((rule_start, kind)), Token::Semicolon) if kind != RuleKind::Style => {
                rules.push(CssRule {
                    kind,
                    css_text: parser.slice_from(rule_start).to_owned(),
                });
            }
            (Some((rule_start, kind)), Token::CurlyBracketBlock) => {
                skip_block(&mut parser);
                rules.push(CssRule {
                    kind,
                    css_text: parser.slice_from(rule_start).to_owned(),
                });
            }
            (pending, _) => current = pending,
        }
    }
    rules
}

fn skip_block(parser: &mut Parser<'_, '_>) {
    let _ = parser.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'_, ()>>(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_top_level_rules() {
        let sheet = StyleSheet::new(
            Some("https://example.com/a.css"),
            "@charset \"utf-8\";\n/* c */ body { color: red }\n@font-face { font-family: A; src: url(a.woff) }\n@media print { @font-face { src: url(p.woff) } }",
        );
        let rules = sheet.rules().unwrap();
        let kinds: Vec<_> = rules.iter().map(|r| r.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::At("charset".into()),
                RuleKind::Style,
                RuleKind::FontFace,
                RuleKind::At("media".into()),
            ]
        );
        assert_eq!(
            rules[2].css_text,
            "@font-face { font-family: A; src: url(a.woff) }"
        );
    }

    #[test]
    fn inaccessible_sheet_errors() {
        let sheet = StyleSheet::inaccessible(Some("https://cdn.example/x.css"));
        assert_eq!(
            sheet.rules(),
            Err(StyleSheetError::Inaccessible {
                href: Some("https://cdn.example/x.css".into())
            })
        );
    }

    #[test]
    fn deserializes_from_snapshot_json() {
        let sheet: StyleSheet = serde_json::from_str(r#"{"href": null, "css": "p{}"}"#).unwrap();
        assert_eq!(sheet.rules().unwrap().len(), 1);
        let blocked: StyleSheet = serde_json::from_str(r#"{"href": "https://x/y.css"}"#).unwrap();
        assert!(blocked.rules().is_err());
    }
}
