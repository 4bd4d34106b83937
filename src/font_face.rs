//! `@font-face` source resolution.
//!
//! Fonts referenced by a stylesheet are relative to that stylesheet, so once
//! the rules are copied into a detached SVG their `src` URLs must be made
//! absolute. Each rule is rewritten in two passes: the `src` value is parsed
//! and its `url()` arguments replaced, then the rule's declaration block is
//! parsed and its `src` declarations overwritten with the new value text.

use url::Url;

use crate::css::{CssRule, RuleBlock, RuleKind, StyleSheet, ValueAst, ValueNode};
use crate::error::FontFaceError;

/// Rewrite every `url()` in the `src` of one `@font-face` rule to an absolute
/// URL resolved against `base`.
///
/// Returns `Ok(None)` when the rule has no base location: its relative URLs
/// would be meaningless in the output, so it is left out entirely.
pub fn resolve_font_face_rule(
    css_text: &str,
    base: Option<&str>,
) -> Result<Option<String>, FontFaceError> {
    let Some(base) = base else {
        return Ok(None);
    };

    let mut block = RuleBlock::parse(css_text).map_err(FontFaceError::Declaration)?;
    let src_text = block.get("src").unwrap_or_default().to_owned();
    let mut value = ValueAst::parse(&src_text).map_err(FontFaceError::Value)?;

    let base_url = Url::parse(base).map_err(|source| FontFaceError::Base {
        base: base.to_owned(),
        source,
    })?;

    let mut failure: Option<FontFaceError> = None;
    value.walk_mut(|node| {
        if failure.is_some() {
            return;
        }
        let ValueNode::Function(function) = node else {
            return;
        };
        if !function.is_named("url") {
            return;
        }
        let Some(argument) = function.first_argument_mut() else {
            return;
        };
        // Only string and bare-word arguments carry a literal URL.
        let Some(href) = argument.value().map(str::to_owned) else {
            return;
        };
        match base_url.join(&href) {
            Ok(absolute) => {
                argument.set_value(absolute.into());
            }
            Err(source) => {
                failure = Some(FontFaceError::Url {
                    href,
                    base: base.to_owned(),
                    source,
                })
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    block.set_all("src", &value.to_css());
    Ok(Some(block.to_css()))
}

/// Collect the resolved `@font-face` rules of all `sheets`, in sheet order
/// then rule order.
///
/// A sheet whose rules cannot be read, or a rule that fails to resolve, is
/// logged and skipped; it never affects the other sheets or rules.
pub fn collect_font_faces(sheets: &[StyleSheet]) -> Vec<String> {
    let mut resolved = Vec::new();
    for sheet in sheets {
        let rules = match sheet.rules() {
            Ok(rules) => rules,
            Err(e) => {
                log::error!("Error resolving @font-face src URLs for stylesheet, skipping: {e}");
                continue;
            }
        };
        resolved.extend(resolve_sheet_rules(sheet, &rules));
    }
    resolved
}

fn resolve_sheet_rules(sheet: &StyleSheet, rules: &[CssRule]) -> Vec<String> {
    let href = sheet.href.as_deref();
    rules
        .iter()
        .filter(|rule| rule.kind == RuleKind::FontFace)
        .filter_map(|rule| match resolve_font_face_rule(&rule.css_text, href) {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                log::debug!("Skipping @font-face without a stylesheet location");
                None
            }
            Err(e) => {
                log::warn!(
                    "Skipping @font-face in stylesheet {}: {e}",
                    href.unwrap_or("<inline>")
                );
                None
            }
        })
        .collect()
}
