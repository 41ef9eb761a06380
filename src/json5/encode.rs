//! JSON5 and strict JSON encoders.
//!
//! The fresh encoder writes one member per line with a trailing comma after
//! each, `// ` help lines above members and bare identifier keys. In JSON
//! mode every key is quoted, the last comma of a container is left out, help
//! lines are dropped and non-finite numbers are rejected.
//!
//! [`replay_json`] converts a parsed JSON5 document to JSON while keeping
//! its layout: comments are removed, JSON5-only literals are rewritten and
//! trailing commas are dropped.

use crate::error::{Error, Result};
use crate::json5::lex::is_identifier_char;
use crate::number::Number;
use crate::options::Options;
use crate::ser::{Entry, Item};
use crate::syntax::{Document, Literal, NodeId, NodeKind, Token, TokenKind};

pub(crate) fn encode(root: &Item, options: &Options, json: bool) -> Result<String> {
    let mut enc = Encoder {
        out: String::new(),
        options,
        json,
    };
    enc.value(root, 0)?;
    enc.nl();
    Ok(enc.out)
}

struct Encoder<'a> {
    out: String,
    options: &'a Options,
    json: bool,
}

impl Encoder<'_> {
    fn nl(&mut self) {
        self.out.push_str(self.options.line_break.as_str());
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent);
        }
    }

    /// Writes the separator after a member and ends its line.
    fn end_member(&mut self, last: bool) {
        if !(self.json && last) {
            self.out.push(',');
        }
        self.nl();
    }

    fn value(&mut self, item: &Item, depth: usize) -> Result<()> {
        match item {
            Item::Null => self.out.push_str("null"),
            Item::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Item::Number(n) => self.out.push_str(&number_text(n, self.json)?),
            Item::String(s) => self.out.push_str(&quote(s, '"')),
            Item::Datetime(dt) => self.out.push_str(&quote(&dt.to_string(), '"')),
            Item::List(items) if items.is_empty() => self.out.push_str("[]"),
            Item::List(items) => {
                self.out.push('[');
                self.nl();
                for (i, item) in items.iter().enumerate() {
                    self.indent(depth + 1);
                    self.value(item, depth + 1)?;
                    self.end_member(i + 1 == items.len());
                }
                self.indent(depth);
                self.out.push(']');
            }
            Item::Table(entries) => {
                let entries: Vec<&Entry> = entries.iter().filter(|e| e.value != Item::Null).collect();
                if entries.is_empty() {
                    self.out.push_str("{}");
                    return Ok(());
                }
                self.out.push('{');
                self.nl();
                for (i, entry) in entries.iter().enumerate() {
                    if !self.json {
                        for line in &entry.help {
                            self.indent(depth + 1);
                            self.out.push_str("// ");
                            self.out.push_str(line);
                            self.nl();
                        }
                    }
                    self.indent(depth + 1);
                    self.out.push_str(&key_text(&entry.key, self.json));
                    self.out.push_str(": ");
                    self.value(&entry.value, depth + 1)?;
                    self.end_member(i + 1 == entries.len());
                }
                self.indent(depth);
                self.out.push('}');
            }
        }
        Ok(())
    }
}

fn number_text(n: &Number, json: bool) -> Result<String> {
    match n {
        Number::NaN if json => Err(Error::unsupported_type("NaN is not representable in JSON")),
        Number::Infinity | Number::NegativeInfinity if json => {
            Err(Error::unsupported_type("infinity is not representable in JSON"))
        }
        Number::NaN => Ok("NaN".to_string()),
        Number::Infinity => Ok("+Infinity".to_string()),
        Number::NegativeInfinity => Ok("-Infinity".to_string()),
        n => Ok(n.to_string()),
    }
}

fn is_reserved(key: &str) -> bool {
    matches!(key, "true" | "false" | "null" | "Infinity" | "NaN")
}

fn key_text(key: &str, json: bool) -> String {
    let bare = !json
        && !key.is_empty()
        && !is_reserved(key)
        && key
            .chars()
            .enumerate()
            .all(|(i, c)| c != '\\' && is_identifier_char(c, i == 0));
    if bare {
        key.to_string()
    } else {
        quote(key, '"')
    }
}

fn quote(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Returns the token kind, text and value of a scalar written in place of
/// an existing one.
pub(crate) fn scalar_token(value: &Literal, json: bool) -> Result<(TokenKind, String, Literal)> {
    match value {
        Literal::String(s) => Ok((TokenKind::String, quote(s, '"'), value.clone())),
        Literal::Number(n) => Ok((TokenKind::Number, number_text(n, json)?, value.clone())),
        Literal::Bool(b) => Ok((TokenKind::Bool, b.to_string(), value.clone())),
        Literal::DateTime(dt) => {
            let text = dt.to_string();
            Ok((TokenKind::String, quote(&text, '"'), Literal::String(text)))
        }
        Literal::KeyPath(path) => Err(Error::unsupported_type(&format!(
            "key path {} is not a JSON5 value",
            path
        ))),
    }
}

/// Writes a parsed document as JSON, keeping its whitespace.
pub(crate) fn replay_json(doc: &Document) -> Result<String> {
    let mut out = String::new();
    write_json(doc, doc.root(), false, &mut out)?;
    Ok(out)
}

fn write_json(doc: &Document, id: NodeId, last: bool, out: &mut String) -> Result<()> {
    let node = doc.node(id);
    for token in &node.tokens {
        write_json_token(token, false, out)?;
    }
    let container = matches!(node.kind, NodeKind::Map | NodeKind::List);
    let mut children = doc.children(id).peekable();
    while let Some(child) = children.next() {
        let child_last = if container {
            children.peek().is_none()
        } else {
            last
        };
        write_json(doc, child, child_last, out)?;
    }
    for token in &node.suffix {
        write_json_token(token, last, out)?;
    }
    Ok(())
}

fn write_json_token(token: &Token, last: bool, out: &mut String) -> Result<()> {
    match token.kind {
        TokenKind::Comment | TokenKind::InlineComment | TokenKind::Plus => {}
        TokenKind::Comma if last => {}
        TokenKind::String | TokenKind::Identifier => {
            out.push_str(&quote(token.as_str().unwrap_or_default(), '"'));
        }
        // Signs are separate tokens, so the value is never negative here.
        TokenKind::Number => match &token.value {
            Some(Literal::Number(n)) => out.push_str(&number_text(n, true)?),
            _ => out.push_str(&token.raw),
        },
        _ => out.push_str(&token.raw),
    }
    Ok(())
}
