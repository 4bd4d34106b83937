//! Value AST codec – parses a single property value (e.g. the `src` of an
//! `@font-face` rule) into a tree of words, strings and function calls, and
//! serialises it back.
//!
//! Every node keeps the exact source text it was parsed from, so serialising
//! an untouched tree reproduces the input byte for byte. Assigning a new value
//! to a word or string drops that text and the node is re-quoted on output.

use std::fmt::Write as _;

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};

use crate::error::CssSyntaxError;

/// A parsed property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueAst {
    pub nodes: Vec<ValueNode>,
}

/// One node of a [`ValueAst`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    /// An identifier, or the body of an unquoted `url(...)`.
    Word { value: String, raw: Option<String> },
    /// A quoted string literal. `value` has its escapes decoded.
    String {
        value: String,
        quote: char,
        raw: Option<String>,
    },
    Function(FunctionNode),
    Space(String),
    /// Anything else (numbers, commas, comments, blocks), kept verbatim.
    Other(String),
}

/// A function call such as `url("a.woff")` or `format("woff2")`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: String,
    /// Source text up to and including the opening parenthesis.
    pub open: String,
    pub nodes: Vec<ValueNode>,
    /// The closing parenthesis, or empty when the input ended first.
    pub close: String,
}

impl ValueAst {
    /// Parse a property value.
    ///
    /// Bad strings (unescaped newline) and bad unquoted urls are rejected.
    pub fn parse(text: &str) -> Result<Self, CssSyntaxError> {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        let nodes = parse_nodes(&mut parser)?;
        Ok(Self { nodes })
    }

    /// Serialise back to CSS text.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, &mut out);
        out
    }

    /// Visit every node in document order, parents before children.
    pub fn walk_mut<F: FnMut(&mut ValueNode)>(&mut self, mut f: F) {
        walk_nodes(&mut self.nodes, &mut f);
    }

    /// Visit every node in document order, parents before children.
    pub fn walk<F: FnMut(&ValueNode)>(&self, mut f: F) {
        fn visit<F: FnMut(&ValueNode)>(nodes: &[ValueNode], f: &mut F) {
            for node in nodes {
                f(node);
                if let ValueNode::Function(function) = node {
                    visit(&function.nodes, f);
                }
            }
        }
        visit(&self.nodes, &mut f);
    }
}

impl ValueNode {
    /// The decoded value of a word or string.
    pub fn value(&self) -> Option<&str> {
        match self {
            ValueNode::Word { value, .. } | ValueNode::String { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Replace the value of a word or string. Returns `false` for other nodes.
    pub fn set_value(&mut self, new_value: String) -> bool {
        match self {
            ValueNode::Word { value, raw } | ValueNode::String { value, raw, .. } => {
                *value = new_value;
                *raw = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_space(&self) -> bool {
        matches!(self, ValueNode::Space(_))
    }
}

impl FunctionNode {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First argument, ignoring leading whitespace.
    pub fn first_argument_mut(&mut self) -> Option<&mut ValueNode> {
        self.nodes.iter_mut().find(|n| !n.is_space())
    }

    pub fn first_argument(&self) -> Option<&ValueNode> {
        self.nodes.iter().find(|n| !n.is_space())
    }
}

fn walk_nodes<F: FnMut(&mut ValueNode)>(nodes: &mut [ValueNode], f: &mut F) {
    for node in nodes.iter_mut() {
        f(node);
        if let ValueNode::Function(function) = node {
            walk_nodes(&mut function.nodes, f);
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_nodes<'i, 't>(parser: &mut Parser<'i, 't>) -> Result<Vec<ValueNode>, CssSyntaxError> {
    let mut nodes = Vec::new();
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let offset = start.byte_index();

        let node = match token {
            Token::WhiteSpace(ws) => ValueNode::Space(ws.to_string()),
            Token::Ident(ident) => ValueNode::Word {
                value: ident.to_string(),
                raw: Some(parser.slice_from(start).to_owned()),
            },
            Token::QuotedString(value) => {
                let raw = parser.slice_from(start);
                ValueNode::String {
                    value: value.to_string(),
                    quote: raw.chars().next().unwrap_or('"'),
                    raw: Some(raw.to_owned()),
                }
            }
            Token::UnquotedUrl(value) => unquoted_url(parser.slice_from(start), value.to_string()),
            Token::Function(name) => {
                let open = parser.slice_from(start).to_owned();
                let parsed = parser.parse_nested_block(|nested| {
                    let inner_start = nested.position();
                    let children = parse_nodes(nested).map_err(|e| nested.new_custom_error(e))?;
                    Ok::<_, ParseError<'i, CssSyntaxError>>((
                        children,
                        nested.slice_from(inner_start).len(),
                    ))
                });
                let (children, inner_len) = match parsed {
                    Ok(parsed) => parsed,
                    Err(ParseError {
                        kind: ParseErrorKind::Custom(err),
                        ..
                    }) => return Err(err),
                    Err(err) => {
                        return Err(CssSyntaxError::new(
                            format!("unreadable arguments to {name}(): {:?}", err.kind),
                            offset,
                        ))
                    }
                };
                let full = parser.slice_from(start);
                let close = full.get(open.len() + inner_len..).unwrap_or_default();
                ValueNode::Function(FunctionNode {
                    name: name.to_string(),
                    open,
                    nodes: children,
                    close: close.to_owned(),
                })
            }
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                // Consume the whole block so its text is kept as one node.
                let _ = parser.parse_nested_block(|nested| {
                    while nested.next_including_whitespace_and_comments().is_ok() {}
                    Ok::<_, ParseError<'i, ()>>(())
                });
                ValueNode::Other(parser.slice_from(start).to_owned())
            }
            Token::BadString(_) => {
                return Err(CssSyntaxError::new("unterminated string", offset));
            }
            Token::BadUrl(_) => {
                return Err(CssSyntaxError::new("malformed url()", offset));
            }
            _ => ValueNode::Other(parser.slice_from(start).to_owned()),
        };
        nodes.push(node);
    }
    Ok(nodes)
}

/// `url( foo.woff )` is a single token; split it into the same shape as a
/// `url()` function holding a word.
fn unquoted_url(raw: &str, value: String) -> ValueNode {
    let paren = raw.find('(').map(|i| i + 1).unwrap_or(raw.len());
    let (open, rest) = raw.split_at(paren);
    let (body, close) = match rest.strip_suffix(')') {
        Some(body) => (body, ")"),
        None => (rest, ""),
    };
    let is_css_space = |c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C');
    let trimmed_start = body.trim_start_matches(is_css_space);
    let leading = &body[..body.len() - trimmed_start.len()];
    let word = trimmed_start.trim_end_matches(is_css_space);
    let trailing = &trimmed_start[word.len()..];

    let mut nodes = Vec::with_capacity(3);
    if !leading.is_empty() {
        nodes.push(ValueNode::Space(leading.to_owned()));
    }
    nodes.push(ValueNode::Word {
        value,
        raw: Some(word.to_owned()),
    });
    if !trailing.is_empty() {
        nodes.push(ValueNode::Space(trailing.to_owned()));
    }
    ValueNode::Function(FunctionNode {
        name: open.trim_end_matches('(').to_owned(),
        open: open.to_owned(),
        nodes,
        close: close.to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

fn write_nodes(nodes: &[ValueNode], out: &mut String) {
    for node in nodes {
        match node {
            ValueNode::Word { raw: Some(raw), .. } | ValueNode::String { raw: Some(raw), .. } => {
                out.push_str(raw)
            }
            ValueNode::Word { value, raw: None } => {
                if needs_quotes(value) {
                    write_quoted(value, '"', out);
                } else {
                    out.push_str(value);
                }
            }
            ValueNode::String {
                value,
                quote,
                raw: None,
            } => write_quoted(value, *quote, out),
            ValueNode::Function(function) => {
                out.push_str(&function.open);
                write_nodes(&function.nodes, out);
                out.push_str(&function.close);
            }
            ValueNode::Space(text) | ValueNode::Other(text) => out.push_str(text),
        }
    }
}

/// Whether a rewritten bare word can no longer stand unquoted inside `url()`.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '(' | ')' | '\\')
        })
}

pub(crate) fn write_quoted(value: &str, quote: char, out: &mut String) {
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\0' => out.push('\u{FFFD}'),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_value_round_trips() {
        let src = r#"local("Inter"),  url('fonts/a.woff2' ) format("woff2"), URL( b.ttf ) /* x */"#;
        let ast = ValueAst::parse(src).unwrap();
        assert_eq!(ast.to_css(), src);
    }

    #[test]
    fn unterminated_function_round_trips() {
        let src = "url(\"a.woff\"";
        let ast = ValueAst::parse(src).unwrap();
        assert_eq!(ast.to_css(), src);
    }

    #[test]
    fn unquoted_url_becomes_function_with_word() {
        let ast = ValueAst::parse("url( a.woff )").unwrap();
        let ValueNode::Function(f) = &ast.nodes[0] else {
            panic!("expected function, got {:?}", ast.nodes[0]);
        };
        assert!(f.is_named("url"));
        assert_eq!(f.first_argument().and_then(ValueNode::value), Some("a.woff"));
    }

    #[test]
    fn string_escapes_are_decoded() {
        let ast = ValueAst::parse(r#"url("\66 ont\"s.woff")"#).unwrap();
        let mut values = Vec::new();
        ast.walk(|n| {
            if let ValueNode::String { value, .. } = n {
                values.push(value.clone());
            }
        });
        assert_eq!(values, vec!["font\"s.woff".to_string()]);
    }

    #[test]
    fn rewritten_nodes_are_requoted() {
        let mut ast = ValueAst::parse("url(a.woff), url('b.woff')").unwrap();
        ast.walk_mut(|n| {
            if let ValueNode::Function(f) = n {
                if let Some(arg) = f.first_argument_mut() {
                    let new = format!("x y/{}'", arg.value().unwrap_or_default());
                    arg.set_value(new);
                }
            }
        });
        assert_eq!(ast.to_css(), r#"url("x y/a.woff'"), url('x y/b.woff\'')"#);
    }

    #[test]
    fn nested_functions_are_walked() {
        let ast = ValueAst::parse("image-set(url(a.png) 1x, url(b.png) 2x)").unwrap();
        let mut urls = 0;
        ast.walk(|n| {
            if matches!(n, ValueNode::Function(f) if f.is_named("url")) {
                urls += 1;
            }
        });
        assert_eq!(urls, 2);
    }

    #[test]
    fn bad_string_is_an_error() {
        let err = ValueAst::parse("url(\"a\nb\")").unwrap_err();
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn bad_url_is_an_error() {
        assert!(ValueAst::parse("url(a b.woff)").is_err());
    }
}
