//! TOML parser.
//!
//! The parser makes a single forward pass over the document's top-level
//! lines. Each line is either `key = value` or a `[table]` / `[[array]]`
//! header; headers open a new map node that receives the assignments that
//! follow.
//!
//! Redefinitions are caught with two registries of key paths: `known` holds
//! everything defined before the current table header, `local` what the
//! current table defined so far. `local` is merged into `known` at each
//! header, so that `a.b = 1` under `[x]` only conflicts with a later `[x.a]`.

use crate::error::{Error, Result};
use crate::path::{KeyPath, Segment};
use crate::syntax::{Cursor, Document, Format, Lexer, Literal, Node, NodeId, NodeKind, Token, TokenKind};
use std::collections::HashMap;

const SPACE: &[TokenKind] = &[TokenKind::Whitespace];
const LINE_TRIVIA: &[TokenKind] = &[TokenKind::Whitespace, TokenKind::Comment];
const TRIVIA: &[TokenKind] = &[TokenKind::Whitespace, TokenKind::Newline, TokenKind::Comment];

/// A registry entry: a key, table or array of tables, and where it was
/// defined.
#[derive(Clone, Debug, Default)]
struct Table {
    at: Cursor,
    /// Index of the last element of an array of tables.
    idx: usize,
    array: bool,
    /// Defined by an assignment, so closed to headers.
    inline: bool,
    explicit: bool,
    kind: &'static str,
}

impl Table {
    fn duplicate(&self, at: Cursor, path: &KeyPath) -> Error {
        Error::duplicate_key(at, self.kind, path.to_string(), self.at)
    }
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a, ()>,
    /// Second half of a split `[[` or `]]` token.
    pushed: Option<Token>,
    doc: Document,
}

/// Splits a double bracket into two single ones.
fn split_bracket(token: Token, kind: TokenKind, raw: &str) -> (Token, Token) {
    let first = Token {
        kind,
        raw: raw.to_string(),
        value: None,
        start: token.start,
        end: token.start,
    };
    let second = Token {
        start: token.end,
        ..first.clone()
    };
    (first, second)
}

impl<'a> Parser<'a> {
    pub(crate) fn new(lexer: Lexer<'a, ()>) -> Self {
        Parser {
            lexer,
            pushed: None,
            doc: Document::new(Format::Toml),
        }
    }

    /// Returns the next token that is not one of `skip`, collecting the
    /// skipped ones into `trivia`.
    fn next(&mut self, trivia: &mut Vec<Token>, skip: &[TokenKind]) -> Result<Token> {
        loop {
            let token = match self.pushed.take() {
                Some(token) => token,
                None => self.lexer.next()?,
            };
            if skip.contains(&token.kind) {
                trivia.push(token);
                continue;
            }
            return Ok(token);
        }
    }

    fn link(&mut self, parent: NodeId, tail: &mut Option<NodeId>, child: NodeId) {
        match tail {
            Some(last) => self.doc.node_mut(*last).sibling = Some(child),
            None => self.doc.node_mut(parent).child = Some(child),
        }
        *tail = Some(child);
    }

    pub(crate) fn parse(mut self) -> Result<Document> {
        let root = self.doc.push(Node::new(NodeKind::Map));
        let document = self.doc.root();
        self.doc.node_mut(document).child = Some(root);

        let mut known: HashMap<KeyPath, Table> = HashMap::new();
        let mut local: HashMap<KeyPath, Table> = HashMap::new();
        let mut current = KeyPath::new();
        let mut table = root;
        let mut root_tail = None;
        let mut tail = None;

        loop {
            let mut key = Node::new(NodeKind::KeyPath);
            let mut token = self.next(&mut key.tokens, TRIVIA)?;
            let delim = match token.kind {
                TokenKind::Eof => {
                    self.doc.node_mut(root).suffix = key.tokens;
                    break;
                }
                TokenKind::LSquare | TokenKind::DoubleLSquare => {
                    let delim = if token.is(TokenKind::LSquare) {
                        TokenKind::RSquare
                    } else {
                        TokenKind::DoubleRSquare
                    };
                    key.tokens.push(token);
                    token = self.next(&mut key.tokens, SPACE)?;
                    delim
                }
                _ => TokenKind::Equal,
            };

            let start = token.start;
            let path = self.key(token, &mut key, delim)?;
            key.position = start;
            let Some((last, prefix)) = path.segments().split_last() else {
                return Err(Error::syntax_at(start, "empty key"));
            };

            // Where the rest of the line goes.
            let line_end: NodeId;
            let trailing_owner: NodeId;

            if delim == TokenKind::Equal {
                let mut full = current.clone();
                for segment in prefix {
                    full.push(segment.clone());
                    let closed = known
                        .get(&full)
                        .filter(|t| t.explicit || t.inline)
                        .or_else(|| local.get(&full).filter(|t| t.inline));
                    if let Some(tbl) = closed {
                        return Err(tbl.duplicate(start, &full));
                    }
                    let tbl = local.entry(full.clone()).or_default();
                    tbl.at = start;
                    tbl.explicit = true;
                    tbl.kind = "key";
                }
                full.push(last.clone());
                let defined = known
                    .get(&full)
                    .filter(|t| t.explicit)
                    .or_else(|| local.get(&full).filter(|t| t.explicit));
                if let Some(tbl) = defined {
                    return Err(tbl.duplicate(start, &full));
                }
                let tbl = local.entry(full).or_default();
                tbl.at = start;
                tbl.explicit = true;
                tbl.inline = true;
                tbl.kind = "key";

                let mut value_tokens = Vec::new();
                let token = self.next(&mut value_tokens, SPACE)?;
                let value = self.value(token, value_tokens)?;
                key.value = Some(Literal::KeyPath(path));
                key.child = Some(value);
                let key = self.doc.push(key);
                self.link(table, &mut tail, key);
                line_end = key;
                trailing_owner = value;
            } else {
                known.extend(local.drain());

                let mut full = KeyPath::new();
                for segment in prefix {
                    full.push(segment.clone());
                    let tbl = known.entry(full.clone()).or_insert_with(|| Table {
                        at: start,
                        kind: "table",
                        ..Table::default()
                    });
                    if tbl.inline {
                        return Err(tbl.duplicate(start, &full));
                    }
                    if tbl.array {
                        let idx = tbl.idx;
                        full.push(Segment::Index(idx));
                    }
                }
                full.push(last.clone());

                let registry_key = full.clone();
                let existing = known.get(&registry_key);
                let mut tbl = existing.cloned().unwrap_or_default();
                if delim == TokenKind::RSquare {
                    if tbl.explicit {
                        return Err(tbl.duplicate(start, &full));
                    }
                    tbl.kind = "table";
                } else {
                    if existing.is_some() && !tbl.array {
                        return Err(tbl.duplicate(start, &full));
                    }
                    if tbl.explicit {
                        tbl.idx += 1;
                    } else {
                        tbl.array = true;
                        tbl.kind = "array";
                    }
                    full.push(Segment::Index(tbl.idx));
                }
                tbl.at = start;
                tbl.explicit = true;
                known.insert(registry_key, tbl);

                let mut map = Node::new(NodeKind::Map);
                map.position = start;
                let map = self.doc.push(map);
                key.value = Some(Literal::KeyPath(full.clone()));
                key.child = Some(map);
                let key = self.doc.push(key);
                self.link(root, &mut root_tail, key);

                current = full;
                table = map;
                tail = None;
                line_end = map;
                trailing_owner = map;
            }

            let mut trailing = Vec::new();
            let token = self.next(&mut trailing, LINE_TRIVIA)?;
            let owner = self.doc.node_mut(trailing_owner);
            if trailing_owner == line_end {
                owner.tokens.append(&mut trailing);
            } else {
                owner.suffix.append(&mut trailing);
            }
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    let node = self.doc.node_mut(line_end);
                    if delim == TokenKind::Equal {
                        node.suffix.push(token);
                    } else {
                        node.tokens.push(token);
                    }
                }
                _ => return Err(token.unexpected(&[TokenKind::Newline, TokenKind::Eof])),
            }
        }

        tracing::debug!(nodes = self.doc.len(), "parsed TOML document");
        Ok(self.doc)
    }

    /// Reads a dotted key starting at `token`, up to and including `delim`,
    /// into `key.tokens`.
    fn key(&mut self, mut token: Token, key: &mut Node, delim: TokenKind) -> Result<KeyPath> {
        let mut path = KeyPath::new();
        loop {
            match token.kind {
                TokenKind::Identifier | TokenKind::String => {
                    if token.raw.contains(|c| c == '\r' || c == '\n') {
                        return Err(Error::syntax_at(token.start, "keys cannot be multiline strings"));
                    }
                    path.push_key(token.as_str().unwrap_or_default());
                }
                // `true`, `1234`, `1.2` or `2024-01-01` are keys too in this
                // position.
                TokenKind::Number | TokenKind::Bool | TokenKind::DateTime => {
                    // A date token swallows one trailing space.
                    for part in token.raw.trim_end().split('.') {
                        path.push_key(part);
                    }
                }
                _ => return Err(token.unexpected(&[TokenKind::Identifier, TokenKind::String])),
            }
            key.tokens.push(token);
            token = self.next(&mut key.tokens, SPACE)?;
            if token.is(delim) {
                break;
            }
            if !token.is(TokenKind::Dot) {
                return Err(token.unexpected(&[TokenKind::Dot, delim]));
            }
            key.tokens.push(token);
            token = self.next(&mut key.tokens, SPACE)?;
        }
        key.tokens.push(token);
        Ok(path)
    }

    /// Parses the value starting at `token`. `tokens` is the trivia that
    /// precedes it.
    fn value(&mut self, token: Token, tokens: Vec<Token>) -> Result<NodeId> {
        let mut node = Node::new(NodeKind::Nil);
        node.tokens = tokens;
        node.position = token.start;
        node.kind = match token.kind {
            TokenKind::LBrace => return self.inline_table(token, node),
            TokenKind::LSquare => return self.list(token, node),
            // `a = [[1, 2]]`
            TokenKind::DoubleLSquare => {
                let (open, rest) = split_bracket(token, TokenKind::LSquare, "[");
                self.pushed = Some(rest);
                return self.list(open, node);
            }
            TokenKind::String => NodeKind::String,
            TokenKind::Number => NodeKind::Number,
            TokenKind::Bool => NodeKind::Bool,
            TokenKind::DateTime => NodeKind::DateTime,
            _ => return Err(token.unexpected(&[])),
        };
        node.value = token.value.clone();
        node.tokens.push(token);
        Ok(self.doc.push(node))
    }

    fn next_in_list(&mut self, trivia: &mut Vec<Token>) -> Result<Token> {
        let token = self.next(trivia, TRIVIA)?;
        if token.is(TokenKind::DoubleRSquare) {
            let (close, rest) = split_bracket(token, TokenKind::RSquare, "]");
            self.pushed = Some(rest);
            return Ok(close);
        }
        Ok(token)
    }

    fn list(&mut self, open: Token, mut node: Node) -> Result<NodeId> {
        node.kind = NodeKind::List;
        node.tokens.push(open);
        let list = self.doc.push(node);
        let mut tail = None;

        let mut pending = Vec::new();
        let mut token = self.next_in_list(&mut pending)?;
        while !token.is(TokenKind::RSquare) {
            let elem = self.value(token, std::mem::take(&mut pending))?;
            self.link(list, &mut tail, elem);

            let mut trailing = Vec::new();
            token = self.next_in_list(&mut trailing)?;
            match token.kind {
                TokenKind::Comma => {
                    trailing.push(token);
                    self.doc.node_mut(elem).suffix.append(&mut trailing);
                    token = self.next_in_list(&mut pending)?;
                }
                TokenKind::RSquare => pending = trailing,
                _ => return Err(token.unexpected(&[TokenKind::Comma, TokenKind::RSquare])),
            }
        }

        let node = self.doc.node_mut(list);
        node.suffix = pending;
        node.suffix.push(token);
        Ok(list)
    }

    fn inline_table(&mut self, open: Token, mut node: Node) -> Result<NodeId> {
        node.kind = NodeKind::Map;
        node.tokens.push(open);
        let map = self.doc.push(node);
        let mut tail = None;
        // Every key path defined so far, and whether it is an implicit table
        // opened by a dotted key.
        let mut seen: HashMap<KeyPath, (Cursor, bool)> = HashMap::new();

        let mut key = Node::new(NodeKind::KeyPath);
        let mut token = self.next(&mut key.tokens, SPACE)?;
        let mut pending = Vec::new();
        if token.is(TokenKind::RBrace) {
            pending = std::mem::take(&mut key.tokens);
        }
        while !token.is(TokenKind::RBrace) {
            let start = token.start;
            let path = self.key(token, &mut key, TokenKind::Equal)?;
            let segments = path.segments();
            for n in 1..segments.len() {
                let prefix: KeyPath = segments[..n].iter().cloned().collect();
                match seen.get(&prefix) {
                    Some(&(orig, false)) => {
                        return Err(Error::duplicate_key(start, "key", prefix.to_string(), orig));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(prefix, (start, true));
                    }
                }
            }
            if let Some(&(orig, _)) = seen.get(&path) {
                return Err(Error::duplicate_key(start, "key", path.to_string(), orig));
            }
            seen.insert(path.clone(), (start, false));

            let mut value_tokens = Vec::new();
            let token_value = self.next(&mut value_tokens, SPACE)?;
            let value = self.value(token_value, value_tokens)?;
            key.position = start;
            key.value = Some(Literal::KeyPath(path));
            key.child = Some(value);
            let id = self.doc.push(std::mem::replace(&mut key, Node::new(NodeKind::KeyPath)));
            self.link(map, &mut tail, id);

            let mut trailing = Vec::new();
            token = self.next(&mut trailing, SPACE)?;
            match token.kind {
                TokenKind::Comma => {
                    trailing.push(token);
                    self.doc.node_mut(value).suffix.append(&mut trailing);
                    token = self.next(&mut key.tokens, SPACE)?;
                    if token.is(TokenKind::RBrace) {
                        return Err(token.unexpected(&[TokenKind::Identifier, TokenKind::String]));
                    }
                }
                TokenKind::RBrace => pending = trailing,
                _ => return Err(token.unexpected(&[TokenKind::Comma, TokenKind::RBrace])),
            }
        }

        let node = self.doc.node_mut(map);
        node.suffix = pending;
        node.suffix.push(token);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml::lex::lexer_from_str;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(lexer_from_str(input)).parse()
    }

    fn key_paths(doc: &Document, id: NodeId) -> Vec<String> {
        doc.children(id)
            .map(|key| match &doc.node(key).value {
                Some(Literal::KeyPath(path)) => path.to_string(),
                other => format!("{:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_replay_is_byte_exact() {
        let inputs = [
            "",
            "\n\n# only a comment",
            "a = 1\nb.c = 'x' # note\n",
            "# head\n[server] # main\n  host = \"h\"\n\n[[servers]]\nip = [ 1, 2, ] \n",
            "list = [\n  1, # one\n  [2, 3],\n]\n",
            "t = { a = 1, b = { c = [] } }\n",
            "nested = [[1], [2]]\n",
            "x = \"\"\"\nmulti\nline\"\"\"\r\ny = 2",
        ];
        for input in inputs {
            let doc = parse(input).unwrap();
            assert_eq!(doc.to_string(), input);
        }
    }

    #[test]
    fn test_headers_carry_full_paths() {
        let doc = parse("[[a]]\n[[a]]\n[a.b]\n[[a.c]]\n").unwrap();
        let root = doc.value().unwrap();
        assert_eq!(key_paths(&doc, root), vec!["a[0]", "a[1]", "a[1].b", "a[1].c[0]"]);
    }

    #[test]
    fn test_assignments_are_relative() {
        let doc = parse("[x]\ny.z = 1\n").unwrap();
        let root = doc.value().unwrap();
        let header = doc.children(root).next().unwrap();
        let table = doc.node(header).child.unwrap();
        assert_eq!(key_paths(&doc, table), vec!["y.z"]);
    }

    #[test]
    fn test_duplicates() {
        let cases = [
            ("a = 1\na = 2", "key a is already defined at line 1, column 1"),
            ("[a]\n[a]", "table a is already defined at line 1, column 2"),
            ("a.b = 1\n[a]", "key a is already defined"),
            ("a = {}\n[a.b]", "key a is already defined"),
            ("[a]\n[[a]]", "table a is already defined"),
            ("t = { x = 1, x = 2 }", "key x is already defined at line 1, column 7"),
            ("t = { a.b = 1, a = 2 }", "key a is already defined at line 1, column 7"),
            ("t = { a = 1, a.b = 2 }", "key a is already defined at line 1, column 7"),
            ("t = { a.b = 1, a.b.c = 2 }", "key a.b is already defined at line 1, column 7"),
            ("[x]\ny = 1\ny.z = 2", "key x.y is already defined"),
        ];
        for (input, expected) in cases {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, Error::DuplicateKey { .. }),
                "{}: {:?}",
                input,
                err
            );
            assert!(err.to_string().contains(expected), "{}: {}", input, err);
        }
    }

    #[test]
    fn test_valid_redefinitions() {
        parse("[a.b]\n[a]\n").unwrap();
        parse("[[a]]\n[a.b]\n[[a]]\n[a.b]\n").unwrap();
        parse("a.b = 1\na.c = 2\n").unwrap();
        parse("t = { a.b = 1, a.c = 2, d = 3 }\n").unwrap();
    }

    #[test]
    fn test_grammar_errors() {
        let err = parse("a = 1 b = 2").unwrap_err();
        assert!(err.to_string().ends_with("expected token <newline> or <eof>"), "{}", err);
        let err = parse("t = { a = 1, }").unwrap_err();
        assert!(err.to_string().contains("on token \"}\""), "{}", err);
        let err = parse("l = [1 2]").unwrap_err();
        assert!(err.to_string().ends_with("expected token ',' or ']'"), "{}", err);
        let err = parse("\"\"\"multi\nline\"\"\" = 1").unwrap_err();
        assert!(err.to_string().contains("keys cannot be multiline strings"), "{}", err);
        let err = parse("a b = 1").unwrap_err();
        assert!(err.to_string().ends_with("expected token '.' or '='"), "{}", err);
    }

    #[test]
    fn test_number_keys_split_on_dots() {
        let doc = parse("3.14 = \"pi\"\ntrue = 1\n").unwrap();
        let root = doc.value().unwrap();
        assert_eq!(key_paths(&doc, root), vec!["3.14", "true"]);
        let first = doc.children(root).next().unwrap();
        match &doc.node(first).value {
            Some(Literal::KeyPath(path)) => assert_eq!(path.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_date_keys_drop_trailing_space() {
        let input = "1979-05-27 = 1\n[x]\n2024-01-01.b = 2\n";
        let doc = parse(input).unwrap();
        assert_eq!(doc.to_string(), input);
        let root = doc.value().unwrap();
        let first = doc.children(root).next().unwrap();
        assert_eq!(
            doc.node(first).value,
            Some(Literal::KeyPath(KeyPath::from(vec![Segment::Key("1979-05-27".into())])))
        );
        let value: crate::Value = crate::toml::from_str(input).unwrap();
        assert!(value.get("1979-05-27").is_some());
        assert!(value.get("x").and_then(|x| x.get("2024-01-01")).is_some());
    }
}
