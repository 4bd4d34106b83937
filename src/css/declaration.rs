//! Declaration codec – parses a rule such as
//! `@font-face { font-family: X; src: url(a.woff) }` into its prelude and a
//! list of declarations, lets callers look up and overwrite values by
//! property name, and serialises it back.
//!
//! Whitespace, comments and anything that is not a declaration are carried
//! through untouched.

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::error::CssSyntaxError;

/// A parsed rule: prelude, declaration block, closing brace.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBlock {
    /// Everything up to and including `{`.
    pub prelude: String,
    pub items: Vec<DeclItem>,
    /// `}` plus any trailing whitespace.
    pub close: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclItem {
    Declaration(Declaration),
    /// Whitespace or comments between declarations, terminator included.
    Raw(String),
}

/// One `name: value` declaration with the text around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub before: String,
    /// Property name with escapes decoded.
    pub name: String,
    pub raw_name: String,
    /// From the end of the name through the colon and following whitespace.
    pub between: String,
    pub value: String,
    /// ` !important`, or empty.
    pub important: String,
    pub after: String,
    pub semicolon: bool,
}

fn is_css_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

impl RuleBlock {
    pub fn parse(text: &str) -> Result<Self, CssSyntaxError> {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);

        loop {
            let start = parser.position();
            let token = match parser.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => return Err(CssSyntaxError::new("expected '{'", text.len())),
            };
            match token {
                Token::CurlyBracketBlock => {
                    let prelude_end = parser.position().byte_index();
                    let mut chunks: Vec<(usize, usize, bool)> = Vec::new();
                    let mut bad: Option<CssSyntaxError> = None;
                    let mut content_end = text.len();
                    let _ = parser.parse_nested_block(|nested| {
                        let mut chunk_start = nested.position().byte_index();
                        loop {
                            let token_start = nested.position().byte_index();
                            let token = match nested.next_including_whitespace_and_comments() {
                                Ok(token) => token.clone(),
                                Err(_) => {
                                    chunks.push((chunk_start, token_start, false));
                                    content_end = token_start;
                                    break;
                                }
                            };
                            match token {
                                Token::Semicolon => {
                                    chunks.push((chunk_start, token_start, true));
                                    chunk_start = nested.position().byte_index();
                                }
                                Token::BadString(_) => {
                                    bad.get_or_insert(CssSyntaxError::new(
                                        "unterminated string",
                                        token_start,
                                    ));
                                }
                                Token::Function(_)
                                | Token::ParenthesisBlock
                                | Token::SquareBracketBlock
                                | Token::CurlyBracketBlock => {
                                    if let Some(at) = consume_block(nested) {
                                        bad.get_or_insert(CssSyntaxError::new(
                                            "unterminated string",
                                            at,
                                        ));
                                    }
                                }
                                _ => {}
                            }
                        }
                        Ok::<_, ParseError<'_, ()>>(())
                    });
                    if let Some(err) = bad {
                        return Err(err);
                    }
                    let block_end = parser.position().byte_index();
                    // A block left open at end of input is closed implicitly.
                    let close = if content_end < block_end {
                        let trailing = &text[block_end..];
                        if !trailing.chars().all(is_css_space) {
                            return Err(CssSyntaxError::new(
                                "unexpected content after '}'",
                                block_end,
                            ));
                        }
                        text[content_end..].to_owned()
                    } else {
                        log::debug!("@-rule block left open at end of input");
                        "}".to_owned()
                    };

                    let mut items = Vec::with_capacity(chunks.len());
                    for (from, to, semicolon) in chunks {
                        items.push(parse_item(&text[from..to], from, semicolon)?);
                    }
                    return Ok(Self {
                        prelude: text[..prelude_end].to_owned(),
                        items,
                        close,
                    });
                }
                Token::BadString(_) | Token::BadUrl(_) => {
                    return Err(CssSyntaxError::new(
                        "malformed rule prelude",
                        start.byte_index(),
                    ));
                }
                _ => {}
            }
        }
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            DeclItem::Declaration(decl) => Some(decl),
            DeclItem::Raw(_) => None,
        })
    }

    /// The value of the last declaration of `name`, as a cascade would pick it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations()
            .filter(|decl| decl.name.eq_ignore_ascii_case(name))
            .last()
            .map(|decl| decl.value.as_str())
    }

    /// Overwrite every declaration of `name`. Returns how many were changed.
    pub fn set_all(&mut self, name: &str, value: &str) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            if let DeclItem::Declaration(decl) = item {
                if decl.name.eq_ignore_ascii_case(name) {
                    decl.value = value.to_owned();
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn to_css(&self) -> String {
        let mut out = String::with_capacity(self.prelude.len() + self.close.len() + 64);
        out.push_str(&self.prelude);
        for item in &self.items {
            match item {
                DeclItem::Raw(raw) => out.push_str(raw),
                DeclItem::Declaration(decl) => {
                    out.push_str(&decl.before);
                    out.push_str(&decl.raw_name);
                    out.push_str(&decl.between);
                    out.push_str(&decl.value);
                    out.push_str(&decl.important);
                    out.push_str(&decl.after);
                    if decl.semicolon {
                        out.push(';');
                    }
                }
            }
        }
        out.push_str(&self.close);
        out
    }
}

/// Consume the contents of the block just opened. Returns the offset of the
/// first unterminated string inside it.
fn consume_block(parser: &mut Parser<'_, '_>) -> Option<usize> {
    let mut bad = None;
    let _ = parser.parse_nested_block(|nested| {
        loop {
            let at = nested.position().byte_index();
            let token = match nested.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };
            match token {
                Token::BadString(_) => {
                    bad.get_or_insert(at);
                }
                Token::Function(_)
                | Token::ParenthesisBlock
                | Token::SquareBracketBlock
                | Token::CurlyBracketBlock => {
                    if let Some(inner) = consume_block(nested) {
                        bad.get_or_insert(inner);
                    }
                }
                _ => {}
            }
        }
        Ok::<_, ParseError<'_, ()>>(())
    });
    bad
}

/// Split one `;`-delimited chunk of a block into a declaration.
fn parse_item(chunk: &str, offset: usize, semicolon: bool) -> Result<DeclItem, CssSyntaxError> {
    let mut input = ParserInput::new(chunk);
    let mut parser = Parser::new(&mut input);

    let (name, name_start) = loop {
        let start = parser.position();
        match parser.next_including_whitespace_and_comments() {
            Ok(Token::WhiteSpace(_)) | Ok(Token::Comment(_)) => {}
            Ok(Token::Ident(ident)) => break (ident.to_string(), start.byte_index()),
            Ok(_) => {
                return Err(CssSyntaxError::new(
                    "expected property name",
                    offset + start.byte_index(),
                ))
            }
            Err(_) => {
                let mut raw = chunk.to_owned();
                if semicolon {
                    raw.push(';');
                }
                return Ok(DeclItem::Raw(raw));
            }
        }
    };
    let name_end = parser.position().byte_index();

    loop {
        let at = parser.position().byte_index();
        match parser.next_including_whitespace_and_comments() {
            Ok(Token::WhiteSpace(_)) | Ok(Token::Comment(_)) => {}
            Ok(Token::Colon) => break,
            _ => {
                return Err(CssSyntaxError::new(
                    format!("expected ':' after {name}"),
                    offset + at,
                ))
            }
        }
    }
    let colon_end = parser.position().byte_index();

    let rest = &chunk[colon_end..];
    let value_start = colon_end + (rest.len() - rest.trim_start_matches(is_css_space).len());
    let value_end = value_start + chunk[value_start..].trim_end_matches(is_css_space).len();
    let (value, important) = split_important(&chunk[value_start..value_end]);

    Ok(DeclItem::Declaration(Declaration {
        before: chunk[..name_start].to_owned(),
        name,
        raw_name: chunk[name_start..name_end].to_owned(),
        between: chunk[name_end..value_start].to_owned(),
        value: value.to_owned(),
        important: important.to_owned(),
        after: chunk[value_end..].to_owned(),
        semicolon,
    }))
}

fn split_important(value: &str) -> (&str, &str) {
    let lower = value.to_ascii_lowercase();
    if let Some(head) = lower.strip_suffix("important") {
        if let Some(head) = head.trim_end_matches(is_css_space).strip_suffix('!') {
            let split = head.trim_end_matches(is_css_space).len();
            return value.split_at(split);
        }
    }
    (value, "")
}
