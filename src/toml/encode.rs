//! Fresh TOML encoder.
//!
//! Renders an [`Item`] tree as a new document. Within each table, plain
//! values come first and sub-tables follow as `[header]` sections (arrays of
//! tables as repeated `[[header]]` sections), each section indented one level
//! deeper than its parent. The top-level table and its direct sub-tables
//! share the same indentation.

use crate::error::{Error, Result};
use crate::number::Number;
use crate::options::Options;
use crate::ser::{Entry, Item};
use crate::syntax::{Literal, TokenKind};
use crate::toml::lex::is_identifier_char;

pub(crate) fn encode(root: &Item, options: &Options) -> Result<String> {
    let Item::Table(entries) = root else {
        return Err(Error::unsupported_type(&format!(
            "cannot marshal single value of type {}: document must contain tables",
            root.kind_name()
        )));
    };
    let mut enc = Encoder {
        out: String::new(),
        options,
        wrote: false,
    };
    enc.table(entries, &mut Vec::new(), -1)?;
    Ok(enc.out)
}

/// Whether an item is written as `key = value` rather than as a section.
fn is_value(item: &Item) -> bool {
    match item {
        Item::Table(_) => false,
        Item::List(items) => {
            items.is_empty() || items.iter().any(|i| is_value(i) || matches!(i, Item::List(_)))
        }
        _ => true,
    }
}

struct Encoder<'a> {
    out: String,
    options: &'a Options,
    /// Something was written since the document start.
    wrote: bool,
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

    fn help(&mut self, help: &[String], depth: usize) {
        for line in help {
            self.indent(depth);
            self.out.push_str("# ");
            self.out.push_str(line);
            self.nl();
        }
    }

    fn key_path(&mut self, path: &[String]) {
        for (i, key) in path.iter().enumerate() {
            if i > 0 {
                self.out.push('.');
            }
            self.out.push_str(&key_text(key));
        }
    }

    fn table(&mut self, entries: &[Entry], path: &mut Vec<String>, curdepth: isize) -> Result<()> {
        let mut entries: Vec<&Entry> = entries.iter().filter(|e| e.value != Item::Null).collect();
        entries.sort_by_key(|e| !is_value(&e.value));

        let depth0 = curdepth.max(0) as usize;
        let depth1 = (curdepth + 1) as usize;

        for entry in entries {
            path.push(entry.key.clone());
            match &entry.value {
                value if is_value(value) => {
                    self.help(&entry.help, depth0);
                    self.indent(depth0);
                    self.out.push_str(&key_text(&entry.key));
                    self.out.push_str(" = ");
                    self.value(value, path, depth0, 0, true)?;
                    self.nl();
                    self.wrote = true;
                }
                Item::Table(sub) => {
                    if self.wrote {
                        self.nl();
                    }
                    self.help(&entry.help, depth1);
                    self.indent(depth1);
                    self.out.push('[');
                    self.key_path(path);
                    self.out.push(']');
                    self.nl();
                    self.wrote = true;
                    self.table(sub, path, curdepth + 1)?;
                }
                Item::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let Item::Table(sub) = item else {
                            return Err(Error::unsupported_type(&format!(
                                "cannot mix tables and {} values in array {}",
                                item.kind_name(),
                                path_text(path)
                            )));
                        };
                        if self.wrote {
                            self.nl();
                        }
                        if i == 0 {
                            self.help(&entry.help, depth1);
                        }
                        self.indent(depth1);
                        self.out.push_str("[[");
                        self.key_path(path);
                        self.out.push_str("]]");
                        self.nl();
                        self.wrote = true;
                        self.table(sub, path, curdepth + 1)?;
                    }
                }
                _ => {}
            }
            path.pop();
        }
        Ok(())
    }

    /// Writes a value. `top` values sit directly on a `key = ` line, where
    /// lists are spread one element per line; inside inline tables
    /// everything stays on one line.
    /// `path` names the value in errors; list elements add `[i]` segments.
    fn value(
        &mut self,
        item: &Item,
        path: &mut Vec<String>,
        depth: usize,
        listdepth: usize,
        top: bool,
    ) -> Result<()> {
        match item {
            Item::Null => {
                return Err(Error::unsupported_type(&format!(
                    "cannot marshal null value in TOML at {}",
                    path_text(path)
                )));
            }
            Item::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Item::Number(n) => self.out.push_str(&number_text(n)),
            Item::String(s) => self.out.push_str(&quote(s)),
            Item::Datetime(dt) => self.out.push_str(&dt.to_string()),
            Item::List(items) if items.is_empty() => self.out.push_str("[]"),
            Item::List(items) if top => {
                self.out.push('[');
                self.nl();
                for (i, item) in items.iter().enumerate() {
                    self.indent(depth + listdepth + 1);
                    path.push(format!("[{}]", i));
                    self.value(item, path, depth, listdepth + 1, true)?;
                    path.pop();
                    self.out.push(',');
                    self.nl();
                }
                self.indent(depth + listdepth);
                self.out.push(']');
            }
            Item::List(items) => {
                self.out.push_str("[ ");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    path.push(format!("[{}]", i));
                    self.value(item, path, depth, listdepth, false)?;
                    path.pop();
                }
                self.out.push_str(" ]");
            }
            Item::Table(entries) => {
                let entries: Vec<&Entry> = entries.iter().filter(|e| e.value != Item::Null).collect();
                if entries.is_empty() {
                    self.out.push_str("{ }");
                    return Ok(());
                }
                self.out.push_str("{ ");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(&key_text(&entry.key));
                    self.out.push_str(" = ");
                    path.push(entry.key.clone());
                    self.value(&entry.value, path, depth, listdepth, false)?;
                    path.pop();
                }
                self.out.push_str(" }");
            }
        }
        Ok(())
    }
}

/// Writes a key path for messages, such as `servers[1].tags`.
fn path_text(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if !out.is_empty() && !segment.starts_with('[') {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}

fn number_text(n: &Number) -> String {
    match n {
        Number::Infinity => "+inf".to_string(),
        Number::NegativeInfinity => "-inf".to_string(),
        Number::NaN => "nan".to_string(),
        n => n.to_string(),
    }
}

fn key_text(key: &str) -> String {
    if !key.is_empty() && key.chars().all(is_identifier_char) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Writes `s` as a basic string.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => {
                if (c as u32) > 0xffff {
                    out.push_str(&format!("\\U{:08x}", c as u32));
                } else {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Returns the token kind, text and value of a scalar written in place of
/// an existing one.
pub(crate) fn scalar_token(value: &Literal) -> Result<(TokenKind, String, Literal)> {
    let (kind, raw) = match value {
        Literal::String(s) => (TokenKind::String, quote(s)),
        Literal::Number(n) => (TokenKind::Number, number_text(n)),
        Literal::Bool(b) => (TokenKind::Bool, b.to_string()),
        Literal::DateTime(dt) => (TokenKind::DateTime, dt.to_string()),
        Literal::KeyPath(path) => {
            return Err(Error::unsupported_type(&format!(
                "key path {} is not a TOML value",
                path
            )))
        }
    };
    Ok((kind, raw, value.clone()))
}
