//! The format-preserving document tree.
//!
//! A [`Document`] is an arena of [`Node`]s linked as a first-child /
//! next-sibling tree and addressed by [`NodeId`]. Every node keeps the tokens
//! that make it up: `tokens` holds everything up to and including the node's
//! defining token(s), `suffix` everything after its children up to the next
//! structural delimiter. Writing `tokens`, then the children, then `suffix`,
//! recursively, reproduces the parsed text byte for byte; this is what
//! [`Document`]'s `Display` implementation does.
//!
//! ```rust
//! use serde_boa::toml;
//!
//! let text = "# server settings\n[server]\nport = 8080 # default\n";
//! let doc = toml::parse(text).unwrap();
//! assert_eq!(doc.to_string(), text);
//! ```

use crate::error::{Error, Result};
use crate::path::{Segment, Tree};
use crate::syntax::{Cursor, Literal, Token, TokenKind};
use std::fmt;

/// The text format a document was read from or will be written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Toml,
    Json5,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Toml => f.write_str("TOML"),
            Format::Json5 => f.write_str("JSON5"),
        }
    }
}

/// Handle of a node inside its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// The kind of a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Map,
    List,
    KeyPath,
    String,
    Number,
    Bool,
    Nil,
    DateTime,
}

impl NodeKind {
    /// Returns `true` for leaf values.
    #[inline]
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            NodeKind::String | NodeKind::Number | NodeKind::Bool | NodeKind::Nil | NodeKind::DateTime
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Document => "document",
            NodeKind::Map => "map",
            NodeKind::List => "list",
            NodeKind::KeyPath => "key path",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Bool => "bool",
            NodeKind::Nil => "nil",
            NodeKind::DateTime => "datetime",
        };
        f.write_str(s)
    }
}

/// A document element and the tokens it was made of.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: Option<Literal>,
    /// Start of the node, ignoring leading whitespace and comments.
    pub position: Cursor,
    pub child: Option<NodeId>,
    pub sibling: Option<NodeId>,
    pub tokens: Vec<Token>,
    pub suffix: Vec<Token>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            value: None,
            position: Cursor::default(),
            child: None,
            sibling: None,
            tokens: Vec::new(),
            suffix: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value(kind: NodeKind, value: Literal) -> Self {
        Node {
            value: Some(value),
            ..Node::new(kind)
        }
    }

    /// Returns the help lines attached to a key node: the text of the
    /// comment tokens it holds.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.kind.is_comment())
            .filter_map(Token::as_str)
    }
}

/// An arena-allocated document tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    format: Format,
    nodes: Vec<Node>,
}

impl Document {
    /// Creates a document holding only its root node.
    #[must_use]
    pub fn new(format: Format) -> Self {
        Document {
            format,
            nodes: vec![Node::new(NodeKind::Document)],
        }
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The document node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The top-level value: the root table for TOML, the root value for
    /// JSON5.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<NodeId> {
        self.nodes[0].child
    }

    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes, including the document node.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes[0].child.is_none()
    }

    /// Adds a detached node to the arena.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Iterates over the children of `id`, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).child,
        }
    }

    /// Appends `child` at the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match self.children(parent).last() {
            Some(last) => self.node_mut(last).sibling = Some(child),
            None => self.node_mut(parent).child = Some(child),
        }
    }

    /// Finds the value node at `path`, following dotted keys, table headers
    /// and array-of-tables entries. Numeric segments index lists.
    ///
    /// ```rust
    /// use serde_boa::toml;
    ///
    /// let doc = toml::parse("[[servers]]\nip = \"10.0.0.1\"\n[[servers]]\nip = \"10.0.0.2\"\n").unwrap();
    /// let id = doc.find(&["servers", "1", "ip"]).unwrap();
    /// assert_eq!(doc.node(id).tokens.last().unwrap().raw, "\"10.0.0.2\"");
    /// ```
    #[must_use]
    pub fn find(&self, path: &[&str]) -> Option<NodeId> {
        let tree = Tree::build(self).ok()?;
        let segments: Vec<Segment> = path.iter().map(|s| Segment::Key(s.to_string())).collect();
        match tree.get(&segments)? {
            Tree::Leaf { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Replaces the value of a scalar node and regenerates its defining token,
    /// leaving every other byte of the document untouched.
    ///
    /// ```rust
    /// use serde_boa::{toml, Literal, Number};
    ///
    /// let mut doc = toml::parse("port = 80 # http\n").unwrap();
    /// let id = doc.find(&["port"]).unwrap();
    /// doc.set_scalar(id, Literal::Number(Number::from(8080))).unwrap();
    /// assert_eq!(doc.to_string(), "port = 8080 # http\n");
    /// ```
    ///
    /// # Errors
    ///
    /// Fails if the node is not a scalar, or if the format can not represent
    /// the value.
    pub fn set_scalar(&mut self, id: NodeId, value: Literal) -> Result<()> {
        let node = self.node(id);
        if !node.kind.is_scalar() {
            return Err(Error::unexpected_node(
                node.position.line,
                node.position.column,
                &node.kind.to_string(),
                &["string", "number", "bool", "datetime"],
            ));
        }
        let (kind, raw, value) = match self.format {
            Format::Toml => crate::toml::encode::scalar_token(&value)?,
            Format::Json5 => crate::json5::encode::scalar_token(&value, false)?,
        };
        let node = self.node_mut(id);
        let at = node
            .tokens
            .iter()
            .position(|t| !t.kind.is_trivia())
            .unwrap_or(node.tokens.len());
        node.tokens.truncate(at);
        node.tokens.push(Token {
            kind,
            raw,
            value: Some(value.clone()),
            start: node.position,
            end: node.position,
        });
        node.kind = match kind {
            TokenKind::String => NodeKind::String,
            TokenKind::Bool => NodeKind::Bool,
            TokenKind::DateTime => NodeKind::DateTime,
            _ => NodeKind::Number,
        };
        node.value = Some(value);
        Ok(())
    }

    fn write_node(&self, id: NodeId, out: &mut dyn fmt::Write) -> fmt::Result {
        let node = self.node(id);
        for token in &node.tokens {
            out.write_str(&token.raw)?;
        }
        for child in self.children(id) {
            self.write_node(child, out)?;
        }
        for token in &node.suffix {
            out.write_str(&token.raw)?;
        }
        Ok(())
    }

    /// Writes the text of the subtree rooted at `id`, tokens verbatim.
    pub fn write_subtree(&self, id: NodeId, out: &mut dyn fmt::Write) -> fmt::Result {
        self.write_node(id, out)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root(), f)
    }
}

/// Iterator over a node's children.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.node(id).sibling;
        Some(id)
    }
}
