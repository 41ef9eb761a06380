//! Binding documents onto Rust types.
//!
//! The [`from_documents`] entry point resolves parsed [`Document`]s into a
//! single [`Tree`] and drives serde's `Deserialize` implementations over it.
//!
//! ## Overview
//!
//! - **Records**: struct fields are matched against document keys through
//!   the naming convention, or the name of the field's [`Field`] descriptor.
//!   Unknown keys are skipped.
//! - **Scalars**: the node kind is checked against the destination type, and
//!   integers are narrowed with an overflow check. `Number`, `BigInt` and
//!   `Decimal` destinations receive the exact value.
//! - **Environment overlay**: variables override scalars and lists of
//!   scalars, and can populate fields that the document leaves out.
//! - **Layers**: several documents can be bound at once; a later document
//!   wins over an earlier one value by value.
//! - **Errors**: every failure is wrapped once with the destination path,
//!   such as `.servers[2].ip`, and the position of the offending value.
//!
//! [`Field`]: crate::Field

use crate::datetime::DATETIME_TOKEN;
use crate::env::{join, sanitize, EnvDeserializer};
use crate::error::{Error, Result};
use crate::naming::NamingConvention;
use crate::number::{parse_integer, Decimal, Number, NUMBER_TOKEN};
use crate::options::Options;
use crate::path::Tree;
use crate::syntax::{Cursor, Document, Literal, Node, NodeId};
use num_bigint::BigInt;
use serde::de::value::{MapDeserializer, StrDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, Visitor};
use serde::forward_to_deserialize_any;
use std::cell::RefCell;
use std::collections::HashSet;

/// Binds `docs` onto `T`, naming record fields with `naming`. Values of a
/// later document replace those of earlier ones; tables are combined.
pub(crate) fn from_documents<T: DeserializeOwned>(
    docs: &[&Document],
    options: &Options,
    naming: NamingConvention,
) -> Result<T> {
    let mut tree = Tree::empty_table(Cursor::default());
    for (layer, doc) in docs.iter().enumerate() {
        let next = Tree::build_layer(doc, layer)?;
        if layer == 0 {
            tree = next;
        } else {
            tree.overlay(next);
        }
    }
    let binder = Binder {
        docs,
        options,
        skipped: RefCell::new(HashSet::new()),
        retry: RefCell::new(None),
    };
    tracing::debug!(layers = docs.len(), naming = naming.name(), "binding documents");
    loop {
        let root = ValueDeserializer {
            binder: &binder,
            tree: Some(&tree),
            path: String::new(),
            naming,
            env_name: options
                .automatic_env
                .then(|| sanitize(&options.env_prefix)),
            env_value: None,
            prefix_only: false,
            at: binder.position(&tree),
        };
        let err = match T::deserialize(&root) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let retry = binder.retry.borrow_mut().take();
        match retry {
            Some(path) if binder.skipped.borrow_mut().insert(path.clone()) => {
                tracing::debug!(path = %path, "field only shares a prefix with environment variables, binding again without it");
            }
            _ => return Err(err),
        }
    }
}

struct Binder<'a> {
    docs: &'a [&'a Document],
    options: &'a Options,
    /// Fields left out of the binding: they were bound only because some
    /// variable starts with their name, but they take a scalar.
    skipped: RefCell<HashSet<String>>,
    /// The path of such a field, once the binding ran into it.
    retry: RefCell<Option<String>>,
}

impl<'a> Binder<'a> {
    fn node(&self, layer: usize, id: NodeId) -> Option<&'a Node> {
        self.docs.get(layer).copied().map(|doc| doc.node(id))
    }

    fn position(&self, tree: &Tree) -> Cursor {
        match tree {
            Tree::Leaf { layer, id } => self
                .node(*layer, *id)
                .map_or_else(Cursor::default, |n| n.position),
            Tree::Table { position, .. } | Tree::Array { position, .. } => *position,
        }
    }

    fn kind_name(&self, tree: &Tree) -> String {
        match tree {
            Tree::Leaf { layer, id } => self
                .node(*layer, *id)
                .map_or_else(|| "nothing".to_string(), |n| n.kind.to_string()),
            Tree::Table { .. } => "map".to_string(),
            Tree::Array { .. } => "list".to_string(),
        }
    }

    /// Returns the first candidate variable that is set, with its value.
    fn lookup(&self, candidates: Vec<String>) -> Option<(String, String)> {
        candidates.into_iter().find_map(|name| {
            let value = self.options.environment.lookup(&name)?;
            Some((name, value))
        })
    }
}

/// Deserializes one value of the resolved tree, or an environment variable
/// standing in for it.
struct ValueDeserializer<'a> {
    binder: &'a Binder<'a>,
    /// `None` when the document has no value here.
    tree: Option<&'a Tree>,
    path: String,
    naming: NamingConvention,
    /// Variable name of this value, and prefix of its fields' names.
    env_name: Option<String>,
    /// Overlay value, which wins over the document.
    env_value: Option<String>,
    /// Absent from the document, and bound only because variables share
    /// `env_name` as a prefix.
    prefix_only: bool,
    at: Cursor,
}

impl<'a> ValueDeserializer<'a> {
    fn target(&self) -> String {
        if self.path.is_empty() || self.path.starts_with('[') {
            format!(".{}", self.path)
        } else {
            self.path.clone()
        }
    }

    fn wrap(&self, err: Error) -> Error {
        err.load(self.at, &self.target())
    }

    fn child(&self, tree: Option<&'a Tree>, path: String) -> ValueDeserializer<'a> {
        ValueDeserializer {
            binder: self.binder,
            tree,
            path,
            naming: self.naming,
            env_name: None,
            env_value: None,
            prefix_only: false,
            at: tree.map_or(self.at, |t| self.binder.position(t)),
        }
    }

    fn env(&self) -> Option<EnvDeserializer> {
        let value = self.env_value.clone()?;
        Some(EnvDeserializer::new(
            self.env_name.clone().unwrap_or_default(),
            value,
        ))
    }

    fn literal(&self) -> Option<&'a Literal> {
        match self.tree {
            Some(Tree::Leaf { layer, id }) => self.binder.node(*layer, *id)?.value.as_ref(),
            _ => None,
        }
    }

    fn is_nil(&self) -> bool {
        matches!(self.tree, Some(Tree::Leaf { .. })) && self.literal().is_none()
    }

    fn kind(&self) -> String {
        match self.tree {
            Some(tree) => self.binder.kind_name(tree),
            None => "nothing".to_string(),
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        if self.prefix_only {
            self.binder.retry.replace(Some(self.path.clone()));
        }
        Error::type_mismatch(&self.kind(), expected)
    }

    fn number(&self, expected: &str) -> Result<&'a Number> {
        match self.literal() {
            Some(Literal::Number(n)) => Ok(n),
            _ => Err(self.mismatch(expected)),
        }
    }

    fn integer<T: TryFrom<BigInt>>(&self, target: &str) -> Result<T> {
        let n = self.number("integer")?;
        match n.as_bigint() {
            Some(i) if n.is_integer() => T::try_from(i).map_err(|_| Error::overflow(n, target)),
            _ => Err(Error::type_mismatch("float", "integer")),
        }
    }

    fn float(&self) -> Result<f64> {
        Ok(self.number("float")?.as_f64())
    }

    fn text(&self, expected: &str) -> Result<String> {
        match self.literal() {
            Some(Literal::String(s)) => Ok(s.clone()),
            Some(Literal::DateTime(dt)) => Ok(dt.to_string()),
            _ => Err(self.mismatch(expected)),
        }
    }

    fn any<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_any(env, visitor);
        }
        match self.tree {
            None => visitor.visit_unit(),
            Some(Tree::Table { .. }) => self.map(visitor),
            Some(Tree::Array { .. }) => self.seq(visitor),
            Some(Tree::Leaf { .. }) => match self.literal() {
                None => visitor.visit_unit(),
                Some(Literal::Bool(b)) => visitor.visit_bool(*b),
                Some(Literal::String(s)) => visitor.visit_string(s.clone()),
                Some(Literal::DateTime(dt)) => token(visitor, DATETIME_TOKEN, dt.to_string()),
                Some(Literal::Number(n)) => number(visitor, n),
                Some(Literal::KeyPath(path)) => Err(Error::unsupported_type(&format!(
                    "key path {} is not a value",
                    path
                ))),
            },
        }
    }

    fn bool<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_bool(env, visitor);
        }
        match self.literal() {
            Some(Literal::Bool(b)) => visitor.visit_bool(*b),
            _ => Err(self.mismatch("bool")),
        }
    }

    fn f32<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_f32(env, visitor);
        }
        let f = self.float()?;
        if f.is_finite() && (f as f32).is_infinite() {
            return Err(Error::overflow(f, "f32"));
        }
        visitor.visit_f32(f as f32)
    }

    fn f64<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_f64(env, visitor);
        }
        visitor.visit_f64(self.float()?)
    }

    fn char<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_char(env, visitor);
        }
        let text = self.text("character")?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::type_mismatch("string", "character")),
        }
    }

    fn string<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_string(env, visitor);
        }
        visitor.visit_string(self.text("string")?)
    }

    fn bytes<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_byte_buf(env, visitor);
        }
        match self.tree {
            Some(Tree::Array { .. }) => self.seq(visitor),
            _ => visitor.visit_byte_buf(self.text("string")?.into_bytes()),
        }
    }

    fn option<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if self.env_value.is_none() && !self.prefix_only && (self.tree.is_none() || self.is_nil()) {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn unit<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if self.tree.is_none() || self.is_nil() {
            visitor.visit_unit()
        } else {
            Err(self.mismatch("nil"))
        }
    }

    fn seq<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_seq(env, visitor);
        }
        let items: &[Tree] = match self.tree {
            Some(Tree::Array { items, .. }) => items,
            None if !self.prefix_only => &[],
            _ => return Err(self.mismatch("list")),
        };
        let elements = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.child(Some(item), format!("{}[{}]", self.path, i)))
            .collect::<Vec<_>>();
        let mut access = Elements {
            items: elements.into_iter(),
        };
        let value = visitor.visit_seq(&mut access)?;
        match access.items.len() {
            0 => Ok(value),
            _ => Err(de::Error::invalid_length(items.len(), &"fewer elements")),
        }
    }

    fn map<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        let entries = match self.tree {
            Some(Tree::Table { entries, .. }) => Some(entries),
            None => None,
            _ => return Err(self.mismatch("map")),
        };
        let mut pairs = Vec::new();
        for (key, tree) in entries.into_iter().flatten() {
            let mut child = self.child(Some(tree), format!("{}.{}", self.path, key));
            if let Some(prefix) = &self.env_name {
                let candidates = vec![
                    join(prefix, &NamingConvention::ScreamingSnakeCase.format(key)),
                    join(prefix, &sanitize(key)),
                    join(prefix, key),
                ];
                child.env_name = candidates.first().cloned();
                if let Some((name, value)) = self.binder.lookup(candidates) {
                    tracing::debug!(variable = %name, path = %child.target(), "environment overrides document value");
                    child.env_name = Some(name);
                    child.env_value = Some(value);
                }
            }
            pairs.push((key.clone(), child));
        }
        visitor.visit_map(Entries {
            entries: pairs.into_iter(),
            value: None,
        })
    }

    fn record<'de, V: Visitor<'de>>(
        &self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let entries = match self.tree {
            Some(Tree::Table { entries, .. }) => Some(entries),
            None => None,
            _ => return Err(self.mismatch("map")),
        };
        let options = self.binder.options;
        let mut matched = Vec::new();
        let mut bound = Vec::new();
        for &field in fields {
            let descriptor = options.field(name, field);
            if descriptor.ignore {
                continue;
            }
            let naming = descriptor.naming.unwrap_or(self.naming);
            if descriptor.inline {
                let mut inner = self.child(self.tree, self.path.clone());
                inner.naming = naming;
                inner.env_name = self.env_name.clone();
                bound.push((field, inner));
                continue;
            }

            let key = descriptor
                .name
                .clone()
                .unwrap_or_else(|| self.naming.format(field));
            let found = entries.and_then(|entries| {
                entries
                    .get_key_value(key.as_str())
                    .or_else(|| entries.get_key_value(field))
            });
            let (key, tree) = match found {
                Some((key, tree)) => {
                    matched.push(key.as_str());
                    (key.clone(), Some(tree))
                }
                None => (key, None),
            };

            let mut child = self.child(tree, format!("{}.{}", self.path, key));
            child.naming = naming;
            let candidates = match (&descriptor.env, &self.env_name) {
                (Some(explicit), _) => vec![explicit.clone()],
                (None, Some(prefix)) => {
                    let mut names = vec![join(
                        prefix,
                        &NamingConvention::ScreamingSnakeCase.format(field),
                    )];
                    let sanitized = join(prefix, &sanitize(&key));
                    if !names.contains(&sanitized) {
                        names.push(sanitized);
                    }
                    names
                }
                (None, None) => Vec::new(),
            };
            child.env_name = candidates.first().cloned();
            if let Some((variable, value)) = self.binder.lookup(candidates) {
                tracing::debug!(variable = %variable, path = %child.target(), "environment overrides document value");
                child.env_name = Some(variable);
                child.env_value = Some(value);
            }

            if child.tree.is_some() || child.env_value.is_some() {
                bound.push((field, child));
                continue;
            }
            let nested_env = child.env_name.as_ref().map_or(false, |prefix| {
                options.environment.has_prefix(&format!("{}_", prefix)) == Some(true)
            });
            if nested_env && !self.binder.skipped.borrow().contains(&child.path) {
                child.prefix_only = true;
                bound.push((field, child));
            }
        }

        if let Some(entries) = entries {
            for key in entries.keys().filter(|key| !matched.contains(&key.as_str())) {
                tracing::trace!(record = name, key = %key, path = %self.target(), "skipping unknown key");
            }
        }

        visitor.visit_map(Record {
            fields: bound.into_iter(),
            value: None,
        })
    }

    fn variant<'de, V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Some(env) = self.env() {
            return de::Deserializer::deserialize_enum(env, "", &[], visitor);
        }
        match self.tree {
            Some(Tree::Leaf { .. }) => {
                let name = self.text("string")?;
                visitor.visit_enum(StringDeserializer::<Error>::new(name))
            }
            Some(Tree::Table { entries, .. }) if entries.len() == 1 => {
                let Some((key, tree)) = entries.iter().next() else {
                    return Err(self.mismatch("enum"));
                };
                visitor.visit_enum(Variant {
                    name: key.clone(),
                    value: self.child(Some(tree), format!("{}.{}", self.path, key)),
                })
            }
            _ => Err(self.mismatch("enum")),
        }
    }
}

fn token<'de, V: Visitor<'de>>(visitor: V, key: &'static str, text: String) -> Result<V::Value> {
    let mut map = MapDeserializer::<_, Error>::new(std::iter::once((key, text)));
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

/// Visits a number as the narrowest primitive that holds it exactly.
fn number<'de, V: Visitor<'de>>(visitor: V, n: &Number) -> Result<V::Value> {
    match n {
        Number::Integer(i) => {
            if let Ok(v) = i64::try_from(i) {
                visitor.visit_i64(v)
            } else if let Ok(v) = u64::try_from(i) {
                visitor.visit_u64(v)
            } else {
                token(visitor, NUMBER_TOKEN, i.to_string())
            }
        }
        Number::Float(d) => {
            let f = d.to_f64();
            if Decimal::from_f64(f).as_ref() == Some(d) {
                visitor.visit_f64(f)
            } else {
                token(visitor, NUMBER_TOKEN, d.to_string())
            }
        }
        special => visitor.visit_f64(special.as_f64()),
    }
}

macro_rules! located {
    ($($method:ident => $inner:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                self.$inner(visitor).map_err(|e| self.wrap(e))
            }
        )*
    };
}

macro_rules! integer {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                let result = match self.env() {
                    Some(env) => de::Deserializer::$method(env, visitor),
                    None => self
                        .integer::<$ty>(stringify!($ty))
                        .and_then(|v| visitor.$visit(v)),
                };
                result.map_err(|e| self.wrap(e))
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for &ValueDeserializer<'a> {
    type Error = Error;

    located! {
        deserialize_any => any,
        deserialize_bool => bool,
        deserialize_f32 => f32,
        deserialize_f64 => f64,
        deserialize_char => char,
        deserialize_str => string,
        deserialize_string => string,
        deserialize_bytes => bytes,
        deserialize_byte_buf => bytes,
        deserialize_option => option,
        deserialize_unit => unit,
        deserialize_seq => seq,
        deserialize_map => map,
        deserialize_identifier => string,
    }

    integer! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.unit(visitor).map_err(|e| self.wrap(e))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.seq(visitor).map_err(|e| self.wrap(e))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.seq(visitor).map_err(|e| self.wrap(e))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.record(name, fields, visitor).map_err(|e| self.wrap(e))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.variant(visitor).map_err(|e| self.wrap(e))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

struct Elements<'a> {
    items: std::vec::IntoIter<ValueDeserializer<'a>>,
}

impl<'de> de::SeqAccess<'de> for Elements<'_> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(item) => seed.deserialize(&item).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Record fields, keyed by their Rust identifiers.
struct Record<'a> {
    fields: std::vec::IntoIter<(&'static str, ValueDeserializer<'a>)>,
    value: Option<ValueDeserializer<'a>>,
}

impl<'de> de::MapAccess<'de> for Record<'_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some((field, value)) => {
                self.value = Some(value);
                seed.deserialize(StrDeserializer::<Error>::new(field)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(&value),
            None => Err(Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Entries of a table bound onto a map.
struct Entries<'a> {
    entries: std::vec::IntoIter<(String, ValueDeserializer<'a>)>,
    value: Option<ValueDeserializer<'a>>,
}

impl<'de> de::MapAccess<'de> for Entries<'_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, value)) => {
                let key = seed
                    .deserialize(KeyDeserializer(key))
                    .map_err(|e| value.wrap(e))?;
                self.value = Some(value);
                Ok(Some(key))
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(&value),
            None => Err(Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct Variant<'a> {
    name: String,
    value: ValueDeserializer<'a>,
}

impl<'de, 'a> de::EnumAccess<'de> for Variant<'a> {
    type Error = Error;
    type Variant = ValueDeserializer<'a>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(StringDeserializer::<Error>::new(self.name))?;
        Ok((variant, self.value))
    }
}

impl<'de> de::VariantAccess<'de> for ValueDeserializer<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        de::Deserializer::deserialize_unit(&self, de::IgnoredAny).map(|_| ())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(&self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_tuple(&self, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(&self, "", fields, visitor)
    }
}

/// Deserializes a table key. Integer and bool map keys are parsed from the
/// key text.
struct KeyDeserializer(String);

impl KeyDeserializer {
    fn integer<T: TryFrom<BigInt>>(&self, target: &str) -> Result<T> {
        let n = parse_integer(&self.0)
            .ok_or_else(|| Error::type_mismatch(&format!("key {:?}", self.0), "integer"))?;
        T::try_from(n).map_err(|_| Error::overflow(&self.0, target))
    }
}

macro_rules! key_integer {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.integer::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.0)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.0.as_str() {
            "true" => visitor.visit_bool(true),
            "false" => visitor.visit_bool(false),
            _ => Err(Error::type_mismatch(&format!("key {:?}", self.0), "bool")),
        }
    }

    key_integer! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(StringDeserializer::<Error>::new(self.0))
    }

    forward_to_deserialize_any! {
        f32 f64 char str string bytes byte_buf option unit unit_struct seq
        tuple tuple_struct map struct identifier ignored_any
    }
}
