//! JSON5 parser.
//!
//! Trivia is owned by the element that follows it: a member's leading
//! comments live in its key node, and whatever precedes a closing bracket
//! lives in the container's suffix along with the bracket.

use crate::error::Result;
use crate::json5::lex::State;
use crate::syntax::{Document, Format, Lexer, Literal, Node, NodeId, NodeKind, Token, TokenKind};

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a, State>,
    doc: Document,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(lexer: Lexer<'a, State>) -> Self {
        Parser {
            lexer,
            doc: Document::new(Format::Json5),
        }
    }

    /// Returns the next significant token, collecting trivia into `trivia`.
    fn next(&mut self, trivia: &mut Vec<Token>) -> Result<Token> {
        loop {
            let token = self.lexer.next()?;
            if !token.kind.is_trivia() {
                return Ok(token);
            }
            trivia.push(token);
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
        let mut leading = Vec::new();
        let token = self.next(&mut leading)?;
        let value = self.value(token, leading)?;
        let root = self.doc.root();
        self.doc.node_mut(root).child = Some(value);

        let mut trailing = Vec::new();
        let token = self.next(&mut trailing)?;
        if !token.is(TokenKind::Eof) {
            return Err(token.unexpected(&[TokenKind::Eof]));
        }
        self.doc.node_mut(value).suffix.append(&mut trailing);

        tracing::debug!(nodes = self.doc.len(), "parsed JSON5 document");
        Ok(self.doc)
    }

    fn value(&mut self, token: Token, tokens: Vec<Token>) -> Result<NodeId> {
        let mut node = Node::new(NodeKind::Nil);
        node.tokens = tokens;
        node.position = token.start;
        node.kind = match token.kind {
            TokenKind::LBrace => return self.object(token, node),
            TokenKind::LSquare => return self.list(token, node),
            TokenKind::String => NodeKind::String,
            TokenKind::Number => NodeKind::Number,
            TokenKind::Bool => NodeKind::Bool,
            TokenKind::Nil => NodeKind::Nil,
            TokenKind::Plus | TokenKind::Minus => {
                let negate = token.is(TokenKind::Minus);
                node.tokens.push(token);
                // The sign must be attached to its number.
                let number = self.lexer.next()?;
                let value = match &number.value {
                    Some(Literal::Number(n)) if number.is(TokenKind::Number) => n.clone(),
                    _ => return Err(number.unexpected(&[TokenKind::Number])),
                };
                node.value = Some(Literal::Number(if negate { -value } else { value }));
                node.kind = NodeKind::Number;
                node.tokens.push(number);
                return Ok(self.doc.push(node));
            }
            _ => return Err(token.unexpected(&[])),
        };
        node.value = token.value.clone();
        node.tokens.push(token);
        Ok(self.doc.push(node))
    }

    fn object(&mut self, open: Token, mut node: Node) -> Result<NodeId> {
        node.kind = NodeKind::Map;
        node.tokens.push(open);
        let map = self.doc.push(node);
        let mut tail = None;

        let mut pending = Vec::new();
        let mut token = self.next(&mut pending)?;
        while !token.is(TokenKind::RBrace) {
            let mut key = Node::new(NodeKind::String);
            key.tokens = std::mem::take(&mut pending);
            match token.kind {
                TokenKind::Identifier | TokenKind::String => key.value = token.value.clone(),
                _ => return Err(token.unexpected(&[TokenKind::String, TokenKind::Identifier])),
            }
            key.position = token.start;
            key.tokens.push(token);

            let colon = self.next(&mut key.tokens)?;
            if !colon.is(TokenKind::Colon) {
                return Err(colon.unexpected(&[TokenKind::Colon]));
            }
            key.tokens.push(colon);

            let mut leading = Vec::new();
            let token_value = self.next(&mut leading)?;
            let value = self.value(token_value, leading)?;
            key.child = Some(value);
            let key = self.doc.push(key);
            self.link(map, &mut tail, key);

            let mut trailing = Vec::new();
            token = self.next(&mut trailing)?;
            match token.kind {
                TokenKind::Comma => {
                    trailing.push(token);
                    self.doc.node_mut(value).suffix.append(&mut trailing);
                    token = self.next(&mut pending)?;
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

    fn list(&mut self, open: Token, mut node: Node) -> Result<NodeId> {
        node.kind = NodeKind::List;
        node.tokens.push(open);
        let list = self.doc.push(node);
        let mut tail = None;

        let mut pending = Vec::new();
        let mut token = self.next(&mut pending)?;
        while !token.is(TokenKind::RSquare) {
            let elem = self.value(token, std::mem::take(&mut pending))?;
            self.link(list, &mut tail, elem);

            let mut trailing = Vec::new();
            token = self.next(&mut trailing)?;
            match token.kind {
                TokenKind::Comma => {
                    trailing.push(token);
                    self.doc.node_mut(elem).suffix.append(&mut trailing);
                    token = self.next(&mut pending)?;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json5::lex::lexer_from_str;
    use crate::number::Number;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(lexer_from_str(input)).parse()
    }

    #[test]
    fn test_replay_is_byte_exact() {
        let inputs = [
            "{}",
            "  // lead\n{\n  // help\n  a: 1, // inline\n  'b': [1, [2,], ],\n} \n",
            "[\r\n\t-Infinity,\u{2028}+.5, 0x1F, null /* c */]",
            "'just a string'",
            "{ nested: { deep: { x: true } } }",
        ];
        for input in inputs {
            let doc = parse(input).unwrap();
            assert_eq!(doc.to_string(), input);
        }
    }

    #[test]
    fn test_members_own_leading_comments() {
        let doc = parse("{\n  // port to bind\n  port: 80,\n}").unwrap();
        let map = doc.value().unwrap();
        let key = doc.children(map).next().unwrap();
        let comments: Vec<&str> = doc.node(key).comments().collect();
        assert_eq!(comments, vec!["port to bind"]);
        assert_eq!(doc.node(key).value, Some(Literal::String("port".into())));
        assert_eq!(doc.node(key).position.line, 3);
    }

    #[test]
    fn test_signed_numbers() {
        let doc = parse("[-1, +2, -3, -Infinity]").unwrap();
        let list = doc.value().unwrap();
        let values: Vec<Option<Literal>> = doc.children(list).map(|id| doc.node(id).value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Some(Literal::Number(Number::from(-1))),
                Some(Literal::Number(Number::from(2))),
                Some(Literal::Number(Number::from(-3))),
                Some(Literal::Number(Number::NegativeInfinity)),
            ]
        );
    }

    #[test]
    fn test_grammar_errors() {
        let cases = [
            ("{a 1}", "expected token ':'"),
            ("{a: 1 b: 2}", "expected token ',' or '}'"),
            ("[1 2]", "expected token ',' or ']'"),
            ("{1: 2}", "expected token <string> or <identifier>"),
            ("1 2", "expected token <eof>"),
            ("-true", "expected token <number>"),
            ("[- 3]", "expected token <number>"),
            ("[-/* x */3]", "expected token <number>"),
            ("", "on token <eof>: unexpected token"),
            ("[1,,]", "on token \",\""),
        ];
        for (input, expected) in cases {
            let err = parse(input).unwrap_err();
            assert!(err.to_string().contains(expected), "{}: {}", input, err);
        }
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let doc = parse("{a: 1, a: 2}").unwrap();
        assert_eq!(doc.children(doc.value().unwrap()).count(), 2);
    }
}
