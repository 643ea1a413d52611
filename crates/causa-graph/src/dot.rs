//! Graphviz DOT reader.
//!
//! Reads the subset of DOT emitted by middleware graph exporters into a
//! [`StaticGraph`]:
//!
//! - `strict`, `graph` / `digraph` headers with an optional name
//! - nested `subgraph` clusters and anonymous `{ }` blocks, flattened
//! - node statements and edge chains (`a -> b -> c`), with optional ports
//! - quoted, bare, numeral, and simple HTML IDs
//! - attribute lists (`[k=v, k2="v 2"]`, repeated lists merged)
//! - `graph`/`node`/`edge` default-attribute statements and `k=v`
//!   graph attributes, which are skipped
//! - `//`, `/* */`, and `#` line comments
//!
//! Only the first graph in a file is read.

use crate::export::{Attributes, StaticEdge, StaticGraph, StaticVertex};
use causa_core::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
          (?P<comment>//[^\n]*|\#[^\n]*|/\*(?s:.*?)\*/)
        | (?P<quoted>"(?:[^"\\]|\\.)*")
        | (?P<html><[^<>]*>)
        | (?P<arrow>->|--)
        | (?P<punct>[\[\]{};,=:])
        | (?P<ident>-?[\w.]+)
        "#,
    )
    .ok()
});

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Id(String),
    Arrow,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Eq,
    Colon,
}

/// Parse DOT text into a [`StaticGraph`].
pub fn parse_dot(text: &str) -> Result<StaticGraph> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        graph: StaticGraph::new(),
    };
    parser.parse_graph()?;
    Ok(parser.graph)
}

// ============================================================================
// Tokenizer
// ============================================================================

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let re = TOKEN_RE
        .as_ref()
        .ok_or_else(|| Error::operation("DOT token pattern failed to compile"))?;
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        check_gap(text, last_end, whole.start())?;
        last_end = whole.end();

        if caps.name("comment").is_some() {
            continue;
        }
        if let Some(quoted) = caps.name("quoted") {
            tokens.push(Token::Id(unquote(quoted.as_str())));
        } else if let Some(html) = caps.name("html") {
            let s = html.as_str();
            tokens.push(Token::Id(s[1..s.len() - 1].to_string()));
        } else if caps.name("arrow").is_some() {
            tokens.push(Token::Arrow);
        } else if let Some(punct) = caps.name("punct") {
            tokens.push(match punct.as_str() {
                "[" => Token::LBracket,
                "]" => Token::RBracket,
                "{" => Token::LBrace,
                "}" => Token::RBrace,
                ";" => Token::Semi,
                "," => Token::Comma,
                "=" => Token::Eq,
                _ => Token::Colon,
            });
        } else if let Some(ident) = caps.name("ident") {
            tokens.push(Token::Id(ident.as_str().to_string()));
        }
    }
    check_gap(text, last_end, text.len())?;

    Ok(tokens)
}

/// Anything the token pattern skipped must be whitespace.
fn check_gap(text: &str, start: usize, end: usize) -> Result<()> {
    let gap = &text[start..end];
    match gap.char_indices().find(|(_, c)| !c.is_whitespace()) {
        None => Ok(()),
        Some((offset, c)) => {
            let line = text[..start + offset].matches('\n').count() + 1;
            let what = if c == '"' {
                "unterminated string".to_string()
            } else {
                format!("unexpected character '{c}'")
            };
            Err(Error::parse(format!("DOT line {line}: {what}")))
        }
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            // Line continuation
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    graph: StaticGraph,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next_token() {
            Some(ref t) if *t == expected => Ok(()),
            other => Err(Error::parse(format!(
                "DOT: expected {expected:?}, found {other:?}"
            ))),
        }
    }

    fn expect_id(&mut self) -> Result<String> {
        match self.next_token() {
            Some(Token::Id(id)) => Ok(id),
            other => Err(Error::parse(format!("DOT: expected an ID, found {other:?}"))),
        }
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn parse_graph(&mut self) -> Result<()> {
        let mut keyword = self.expect_id()?;
        if keyword.eq_ignore_ascii_case("strict") {
            keyword = self.expect_id()?;
        }
        if !keyword.eq_ignore_ascii_case("digraph") && !keyword.eq_ignore_ascii_case("graph") {
            return Err(Error::parse(format!(
                "DOT: expected 'graph' or 'digraph', found '{keyword}'"
            )));
        }
        if matches!(self.peek(), Some(Token::Id(_))) {
            self.pos += 1;
        }
        self.expect(Token::LBrace)?;
        self.parse_block()
    }

    /// Parse statements up to and including the closing brace.
    fn parse_block(&mut self) -> Result<()> {
        loop {
            let token = self
                .next_token()
                .ok_or_else(|| Error::parse("DOT: unterminated graph body"))?;

            match token {
                Token::RBrace => return Ok(()),
                Token::LBrace => self.parse_block()?,
                Token::Semi | Token::Comma => {}
                Token::Id(word) if word.eq_ignore_ascii_case("subgraph") => {
                    if matches!(self.peek(), Some(Token::Id(_))) {
                        self.pos += 1;
                    }
                    self.expect(Token::LBrace)?;
                    self.parse_block()?;
                }
                Token::Id(word)
                    if ["graph", "node", "edge"]
                        .iter()
                        .any(|k| word.eq_ignore_ascii_case(k))
                        && self.peek_is(&Token::LBracket) =>
                {
                    self.parse_attr_lists()?;
                }
                Token::Id(id) => self.parse_statement(id)?,
                other => {
                    return Err(Error::parse(format!("DOT: unexpected token {other:?}")));
                }
            }
        }
    }

    fn parse_statement(&mut self, first: String) -> Result<()> {
        if self.peek_is(&Token::Eq) {
            // Graph attribute `key = value`
            self.pos += 1;
            self.expect_id()?;
            return Ok(());
        }

        self.skip_port()?;
        let mut chain = vec![first];
        while self.peek_is(&Token::Arrow) {
            self.pos += 1;
            chain.push(self.expect_id()?);
            self.skip_port()?;
        }

        let attributes = self.parse_attr_lists()?;

        if chain.len() == 1 {
            let id = chain.pop().unwrap_or_default();
            self.graph.vertices.push(StaticVertex { id, attributes });
        } else {
            for pair in chain.windows(2) {
                self.graph.edges.push(StaticEdge {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                    attributes: attributes.clone(),
                });
            }
        }
        Ok(())
    }

    fn skip_port(&mut self) -> Result<()> {
        while self.peek_is(&Token::Colon) {
            self.pos += 1;
            self.expect_id()?;
        }
        Ok(())
    }

    /// Parse zero or more consecutive `[...]` lists into one map.
    fn parse_attr_lists(&mut self) -> Result<Attributes> {
        let mut attributes = Attributes::new();
        while self.peek_is(&Token::LBracket) {
            self.pos += 1;
            loop {
                match self.next_token() {
                    Some(Token::RBracket) => break,
                    Some(Token::Comma | Token::Semi) => {}
                    Some(Token::Id(key)) => {
                        let value = if self.peek_is(&Token::Eq) {
                            self.pos += 1;
                            self.expect_id()?
                        } else {
                            "true".to_string()
                        };
                        attributes.insert(key, value);
                    }
                    Some(other) => {
                        return Err(Error::parse(format!(
                            "DOT: unexpected {other:?} in attribute list"
                        )));
                    }
                    None => return Err(Error::parse("DOT: unterminated attribute list")),
                }
            }
        }
        Ok(attributes)
    }
}

// ============================================================================
// Tests
// ============================================================================
