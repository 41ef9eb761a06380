//! Key paths and deep assignment.
//!
//! A [`KeyPath`] is the value of a TOML dotted key or table header: a list of
//! string keys, plus synthetic indices for array-of-tables entries.
//!
//! [`Tree`] resolves a document into nested tables and arrays by applying
//! every key path with Set-by-path semantics: missing intermediate tables and
//! arrays are created on the way (arrays grow by appending), and tables
//! defined in several steps (`[a.b]` before `[a]`) are merged. Assigning
//! through an existing scalar is an error.

use crate::error::{Error, Result};
use crate::syntax::{Cursor, Document, Format, Literal, NodeId, NodeKind};
use indexmap::IndexMap;
use std::fmt;

/// One step of a [`KeyPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// An ordered sequence of path segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    #[must_use]
    pub fn new() -> Self {
        KeyPath(Vec::new())
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(Segment::Key(key.into()));
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns this path followed by `other`.
    #[must_use]
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        KeyPath(self.0.iter().chain(other.0.iter()).cloned().collect())
    }
}

impl From<Vec<Segment>> for KeyPath {
    fn from(segments: Vec<Segment>) -> Self {
        KeyPath(segments)
    }
}

impl FromIterator<Segment> for KeyPath {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        KeyPath(iter.into_iter().collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A document value resolved into nested containers.
#[derive(Clone, Debug, PartialEq)]
pub enum Tree {
    /// A scalar, or a node standing for itself. `layer` indexes the
    /// document it came from when several documents are overlaid.
    Leaf { layer: usize, id: NodeId },
    Table {
        entries: IndexMap<String, Tree>,
        position: Cursor,
    },
    Array {
        items: Vec<Tree>,
        position: Cursor,
    },
}

impl Tree {
    /// Resolves the top-level value of `doc`. An empty document is an empty
    /// table.
    ///
    /// # Errors
    ///
    /// Fails when a key path assigns through a scalar.
    pub fn build(doc: &Document) -> Result<Tree> {
        Tree::build_layer(doc, 0)
    }

    /// Like [`Tree::build`], tagging every leaf with `layer`.
    ///
    /// # Errors
    ///
    /// Fails when a key path assigns through a scalar.
    pub fn build_layer(doc: &Document, layer: usize) -> Result<Tree> {
        match doc.value() {
            Some(id) => Tree::expand(doc, layer, id),
            None => Ok(Tree::Table {
                entries: IndexMap::new(),
                position: Cursor::default(),
            }),
        }
    }

    fn expand(doc: &Document, layer: usize, id: NodeId) -> Result<Tree> {
        let node = doc.node(id);
        match node.kind {
            NodeKind::Map => {
                let mut table = Tree::Table {
                    entries: IndexMap::new(),
                    position: node.position,
                };
                for key in doc.children(id) {
                    let key_node = doc.node(key);
                    let path = match &key_node.value {
                        Some(Literal::KeyPath(path)) => path.clone(),
                        Some(Literal::String(s)) => KeyPath(vec![Segment::Key(s.clone())]),
                        _ => continue,
                    };
                    let Some(value) = key_node.child else {
                        continue;
                    };
                    table.set(doc, layer, path.segments(), value, key_node.position)?;
                }
                Ok(table)
            }
            NodeKind::List => Ok(Tree::Array {
                items: doc
                    .children(id)
                    .map(|item| Tree::expand(doc, layer, item))
                    .collect::<Result<_>>()?,
                position: node.position,
            }),
            _ => Ok(Tree::Leaf { layer, id }),
        }
    }

    /// Assigns the value node `value` at `path`, relative to `self`.
    fn set(
        &mut self,
        doc: &Document,
        layer: usize,
        path: &[Segment],
        value: NodeId,
        at: Cursor,
    ) -> Result<()> {
        let Some((last, prefix)) = path.split_last() else {
            return Ok(());
        };
        let mut cur = self;
        for (i, segment) in prefix.iter().enumerate() {
            let next = path.get(i + 1);
            cur = cur.descend(doc, segment, next, at)?;
        }
        let tree = Tree::expand(doc, layer, value)?;
        let replace = doc.format() == Format::Json5;
        match (cur, last) {
            (Tree::Table { entries, .. }, Segment::Key(key)) => {
                if !replace {
                    if let Some(existing) = entries.get_mut(key) {
                        return existing.merge(doc, key, tree, at);
                    }
                }
                entries.insert(key.clone(), tree);
                Ok(())
            }
            (Tree::Array { items, .. }, Segment::Index(i)) => {
                while items.len() < *i {
                    items.push(Tree::empty_table(at));
                }
                if *i == items.len() {
                    items.push(tree);
                    Ok(())
                } else {
                    items[*i].merge(doc, &i.to_string(), tree, at)
                }
            }
            (other, segment) => Err(other.collision(doc, segment, at)),
        }
    }

    /// Steps into `segment`, creating the container if it does not exist.
    /// `next` tells which kind of container to create.
    fn descend<'t>(
        &'t mut self,
        doc: &Document,
        segment: &Segment,
        next: Option<&Segment>,
        at: Cursor,
    ) -> Result<&'t mut Tree> {
        let fresh = || match next {
            Some(Segment::Index(_)) => Tree::Array {
                items: Vec::new(),
                position: at,
            },
            _ => Tree::empty_table(at),
        };
        let kind = self.kind_name(doc);
        match (self, segment) {
            (Tree::Table { entries, .. }, Segment::Key(key)) => {
                let child = entries.entry(key.clone()).or_insert_with(fresh);
                if matches!(child, Tree::Leaf { .. }) {
                    return Err(child.collision(doc, segment, at));
                }
                Ok(child)
            }
            (Tree::Array { items, .. }, Segment::Index(i)) => {
                while items.len() <= *i {
                    items.push(fresh());
                }
                Ok(&mut items[*i])
            }
            _ => Err(Error::syntax_at(
                at,
                format!("cannot assign {} through {}", segment, kind),
            )),
        }
    }

    pub(crate) fn empty_table(at: Cursor) -> Tree {
        Tree::Table {
            entries: IndexMap::new(),
            position: at,
        }
    }

    /// Merges the table `other` into the table `self`. Anything else meeting
    /// an existing value is a redefinition of `key`.
    fn merge(&mut self, doc: &Document, key: &str, other: Tree, at: Cursor) -> Result<()> {
        let orig = self.position(doc);
        match (self, other) {
            (Tree::Table { entries, .. }, Tree::Table { entries: more, .. }) => {
                for (key, tree) in more {
                    match entries.get_mut(&key) {
                        Some(existing) => existing.merge(doc, &key, tree, at)?,
                        None => {
                            entries.insert(key, tree);
                        }
                    }
                }
                Ok(())
            }
            _ => Err(Error::duplicate_key(at, "key", key.to_string(), orig)),
        }
    }

    /// Lays `other` over `self`: tables are combined key by key, and any
    /// other value of `other` replaces what `self` holds at that place.
    pub fn overlay(&mut self, other: Tree) {
        match (self, other) {
            (Tree::Table { entries, .. }, Tree::Table { entries: more, .. }) => {
                for (key, tree) in more {
                    match entries.get_mut(&key) {
                        Some(existing) => existing.overlay(tree),
                        None => {
                            entries.insert(key, tree);
                        }
                    }
                }
            }
            (this, other) => *this = other,
        }
    }

    fn collision(&self, doc: &Document, segment: &Segment, at: Cursor) -> Error {
        Error::syntax_at(
            at,
            format!("cannot assign {} through {}", segment, self.kind_name(doc)),
        )
    }

    /// Human-readable kind, as used in type mismatch errors.
    #[must_use]
    pub fn kind_name(&self, doc: &Document) -> String {
        match self {
            Tree::Leaf { id, .. } => doc.node(*id).kind.to_string(),
            Tree::Table { .. } => "map".to_string(),
            Tree::Array { .. } => "list".to_string(),
        }
    }

    /// Where the value starts in the document.
    #[must_use]
    pub fn position(&self, doc: &Document) -> Cursor {
        match self {
            Tree::Leaf { id, .. } => doc.node(*id).position,
            Tree::Table { position, .. } | Tree::Array { position, .. } => *position,
        }
    }

    /// Looks up a descendant. Key segments that parse as integers index
    /// arrays.
    #[must_use]
    pub fn get(&self, path: &[Segment]) -> Option<&Tree> {
        let mut cur = self;
        for segment in path {
            cur = match (cur, segment) {
                (Tree::Table { entries, .. }, Segment::Key(key)) => entries.get(key)?,
                (Tree::Array { items, .. }, Segment::Index(i)) => items.get(*i)?,
                (Tree::Array { items, .. }, Segment::Key(key)) => {
                    items.get(key.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(tree: &Tree) -> Vec<&str> {
        match tree {
            Tree::Table { entries, .. } => entries.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_display() {
        let path: KeyPath = vec![
            Segment::Key("servers".into()),
            Segment::Index(2),
            Segment::Key("ip".into()),
        ]
        .into();
        assert_eq!(path.to_string(), "servers[2].ip");
    }

    #[test]
    fn test_dotted_keys_create_tables() {
        let doc = crate::toml::parse("a.b.c = 1\na.d = 2\n").unwrap();
        let tree = Tree::build(&doc).unwrap();
        assert_eq!(keys(&tree), vec!["a"]);
        let a = tree.get(&[Segment::Key("a".into())]).unwrap();
        assert_eq!(keys(a), vec!["b", "d"]);
    }

    #[test]
    fn test_array_of_tables_appends() {
        let doc = crate::toml::parse("[[a]]\nx = 1\n[[a]]\nx = 2\n[a.sub]\ny = 3\n").unwrap();
        let tree = Tree::build(&doc).unwrap();
        match tree.get(&[Segment::Key("a".into())]).unwrap() {
            Tree::Array { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(keys(&items[1]), vec!["x", "sub"]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_tables_defined_out_of_order_merge() {
        let doc = crate::toml::parse("[a.b]\nx = 1\n[a]\ny = 2\n").unwrap();
        let tree = Tree::build(&doc).unwrap();
        let a = tree.get(&[Segment::Key("a".into())]).unwrap();
        assert_eq!(keys(a), vec!["b", "y"]);
    }

    #[test]
    fn test_table_meeting_scalar_is_a_redefinition() {
        use crate::number::Number;
        use crate::syntax::Node;

        let mut doc = Document::new(Format::Toml);
        let root = doc.push(Node::new(NodeKind::Map));
        doc.node_mut(doc.root()).child = Some(root);
        for (path, n) in [(vec!["a", "b"], 1), (vec!["a"], 2)] {
            let value = doc.push(Node::with_value(
                NodeKind::Number,
                Literal::Number(Number::from(n)),
            ));
            let path: KeyPath = path.into_iter().map(|k| Segment::Key(k.into())).collect();
            let mut key = Node::with_value(NodeKind::KeyPath, Literal::KeyPath(path));
            key.child = Some(value);
            let key = doc.push(key);
            doc.append_child(root, key);
        }
        let err = Tree::build(&doc).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }), "{:?}", err);
        assert!(err.to_string().contains("key a is already defined"), "{}", err);
    }

    #[test]
    fn test_overlay_later_layer_wins_at_leaves() {
        let base = crate::toml::parse("a = 1\nlist = [1, 2]\n[t]\nx = 1\ny = 2\n").unwrap();
        let top = crate::toml::parse("list = [3]\n[t]\ny = 20\nz = 30\n").unwrap();
        let mut tree = Tree::build_layer(&base, 0).unwrap();
        tree.overlay(Tree::build_layer(&top, 1).unwrap());

        assert_eq!(keys(&tree), vec!["a", "list", "t"]);
        let t = tree.get(&[Segment::Key("t".into())]).unwrap();
        assert_eq!(keys(t), vec!["x", "y", "z"]);
        match t.get(&[Segment::Key("y".into())]).unwrap() {
            Tree::Leaf { layer, .. } => assert_eq!(*layer, 1),
            other => panic!("expected leaf, got {:?}", other),
        }
        match tree.get(&[Segment::Key("list".into())]).unwrap() {
            Tree::Array { items, .. } => assert_eq!(items.len(), 1),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_json5_duplicate_keys_last_wins() {
        let doc = crate::json5::parse("{a: {x: 1}, a: {y: 2}}").unwrap();
        let tree = Tree::build(&doc).unwrap();
        let a = tree.get(&[Segment::Key("a".into())]).unwrap();
        assert_eq!(keys(a), vec!["y"]);
    }
}
