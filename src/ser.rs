//! Serialization into an intermediate document tree.
//!
//! This module provides the serde [`Serializer`](ser::Serializer) shared by the
//! fresh TOML and JSON5 encoders. Rust values are first turned into an
//! [`Item`] tree, which is then rendered by the format's encoder:
//!
//! - record fields are renamed with the active [`NamingConvention`], unless
//!   their [`Field`](crate::Field) descriptor gives a verbatim name
//! - descriptors can also attach help lines, ignore a field, inline a nested
//!   record or switch the naming convention of a nested record
//! - map keys go through the key stringifier of the [`Options`], falling back
//!   to their natural text, and are sorted
//! - exact numbers and datetimes keep their type through the private marker
//!   structs of [`Number`] and [`Datetime`]
//!
//! ## Usage
//!
//! Most users go through the format modules or [`to_value`]:
//!
//! ```rust
//! use serde::Serialize;
//! use serde_boa::{to_value, Value};
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(value.get("y").and_then(Value::as_i64), Some(2));
//! ```

use crate::datetime::{Datetime, DATETIME_STRUCT};
use crate::error::{Error, Result};
use crate::map::Map;
use crate::naming::NamingConvention;
use crate::number::{Number, NUMBER_STRUCT};
use crate::options::Options;
use crate::value::Value;
use serde::{ser, Serialize};

/// A value about to be rendered by a fresh encoder.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Item {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Datetime(Datetime),
    List(Vec<Item>),
    Table(Vec<Entry>),
}

/// One key of a table, with the help lines written above it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Entry {
    pub key: String,
    pub help: Vec<String>,
    pub value: Item,
}

impl Entry {
    fn new(key: impl Into<String>, value: Item) -> Self {
        Entry {
            key: key.into(),
            help: Vec::new(),
            value,
        }
    }
}

impl Item {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Item::Null => "null",
            Item::Bool(_) => "bool",
            Item::Number(_) => "number",
            Item::String(_) => "string",
            Item::Datetime(_) => "datetime",
            Item::List(_) => "list",
            Item::Table(_) => "map",
        }
    }

    fn into_value(self) -> Value {
        match self {
            Item::Null => Value::Null,
            Item::Bool(b) => Value::Bool(b),
            Item::Number(n) => Value::Number(n),
            Item::String(s) => Value::String(s),
            Item::Datetime(dt) => Value::Datetime(dt),
            Item::List(items) => Value::Array(items.into_iter().map(Item::into_value).collect()),
            Item::Table(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|entry| (entry.key, entry.value.into_value()))
                    .collect::<Map>(),
            ),
        }
    }
}

/// Converts any serializable value into a [`Value`].
///
/// Field names are kept as serde reports them and map entries keep their
/// iteration order.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
/// use serde_boa::{to_value, Value};
///
/// let map = BTreeMap::from([("b", 2), ("a", 1)]);
/// let value = to_value(&map).unwrap();
/// let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
/// assert_eq!(keys, ["a", "b"]);
/// ```
///
/// # Errors
///
/// Fails on map keys that are not scalars.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let options = Options::default();
    let ser = ItemSerializer {
        options: &options,
        naming: None,
        sorted: false,
    };
    value.serialize(ser).map(Item::into_value)
}

/// Serializes `value` for a fresh encoder: record fields are renamed with
/// `naming` and map keys are sorted.
pub(crate) fn to_item<T: Serialize + ?Sized>(
    value: &T,
    options: &Options,
    naming: NamingConvention,
) -> Result<Item> {
    value.serialize(ItemSerializer {
        options,
        naming: Some(naming),
        sorted: true,
    })
}

/// Builds [`Item`] trees out of serde data.
#[derive(Clone, Copy)]
pub(crate) struct ItemSerializer<'a> {
    options: &'a Options,
    naming: Option<NamingConvention>,
    sorted: bool,
}

impl<'a> ItemSerializer<'a> {
    fn key(&self, field: &str) -> String {
        match self.naming {
            Some(naming) => naming.format(field),
            None => field.to_string(),
        }
    }

    fn map_key(&self, key: &Value) -> Result<String> {
        if let Some(text) = self.options.stringify_key(key) {
            return Ok(text);
        }
        match key {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Datetime(dt) => Ok(dt.to_string()),
            other => Err(Error::unsupported_type(&format!(
                "map key must be a scalar, found {}",
                other.kind()
            ))),
        }
    }
}

impl<'a> ser::Serializer for ItemSerializer<'a> {
    type Ok = Item;
    type Error = Error;

    type SerializeSeq = SerializeList<'a>;
    type SerializeTuple = SerializeList<'a>;
    type SerializeTupleStruct = SerializeList<'a>;
    type SerializeTupleVariant = SerializeList<'a>;
    type SerializeMap = SerializeTable<'a>;
    type SerializeStruct = SerializeRecord<'a>;
    type SerializeStructVariant = SerializeRecord<'a>;

    fn serialize_bool(self, v: bool) -> Result<Item> {
        Ok(Item::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Item> {
        Ok(Item::Number(Number::from(v)))
    }

    fn serialize_char(self, v: char) -> Result<Item> {
        Ok(Item::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Item> {
        Ok(Item::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Item> {
        Ok(Item::List(
            v.iter().map(|&b| Item::Number(Number::from(b))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Item> {
        Ok(Item::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Item>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Item> {
        Ok(Item::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Item> {
        Ok(Item::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Item> {
        Ok(Item::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Item>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Item>
    where
        T: ?Sized + Serialize,
    {
        Ok(Item::Table(vec![Entry::new(variant, value.serialize(self)?)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeList<'a>> {
        Ok(SerializeList::new(self, None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeList<'a>> {
        Ok(SerializeList::new(self, None, len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeList<'a>> {
        Ok(SerializeList::new(self, None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeList<'a>> {
        Ok(SerializeList::new(self, Some(variant), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeTable<'a>> {
        Ok(SerializeTable {
            ser: self,
            entries: Vec::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeRecord<'a>> {
        let kind = match name {
            NUMBER_STRUCT => RecordKind::Number,
            DATETIME_STRUCT => RecordKind::Datetime,
            _ => RecordKind::Record,
        };
        Ok(SerializeRecord {
            ser: self,
            kind,
            name,
            variant: None,
            entries: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord<'a>> {
        Ok(SerializeRecord {
            ser: self,
            kind: RecordKind::Record,
            name,
            variant: Some(variant),
            entries: Vec::with_capacity(len),
        })
    }
}

pub(crate) struct SerializeList<'a> {
    ser: ItemSerializer<'a>,
    variant: Option<&'static str>,
    items: Vec<Item>,
}

impl<'a> SerializeList<'a> {
    fn new(ser: ItemSerializer<'a>, variant: Option<&'static str>, len: usize) -> Self {
        SerializeList {
            ser,
            variant,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn finish(self) -> Item {
        let list = Item::List(self.items);
        match self.variant {
            Some(variant) => Item::Table(vec![Entry::new(variant, list)]),
            None => list,
        }
    }
}

impl ser::SerializeSeq for SerializeList<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Item> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeList<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Item> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeList<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Item> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeList<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Item> {
        Ok(self.finish())
    }
}

pub(crate) struct SerializeTable<'a> {
    ser: ItemSerializer<'a>,
    entries: Vec<Entry>,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeTable<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(self.ser)?.into_value();
        self.next_key = Some(self.ser.map_key(&key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entries.push(Entry::new(key, value.serialize(self.ser)?));
        Ok(())
    }

    fn end(mut self) -> Result<Item> {
        if self.ser.sorted {
            self.entries.sort_by(|a, b| a.key.cmp(&b.key));
        }
        Ok(Item::Table(self.entries))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum RecordKind {
    Record,
    Number,
    Datetime,
}

pub(crate) struct SerializeRecord<'a> {
    ser: ItemSerializer<'a>,
    kind: RecordKind,
    name: &'static str,
    variant: Option<&'static str>,
    entries: Vec<Entry>,
}

impl SerializeRecord<'_> {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        if self.kind != RecordKind::Record {
            self.entries.push(Entry::new(key, value.serialize(self.ser)?));
            return Ok(());
        }
        let field = self.ser.options.field(self.name, key);
        if field.ignore {
            return Ok(());
        }
        let child = ItemSerializer {
            naming: field.naming.or(self.ser.naming),
            ..self.ser
        };
        let item = value.serialize(child)?;
        if field.inline {
            return match item {
                Item::Table(entries) => {
                    self.entries.extend(entries);
                    Ok(())
                }
                Item::Null => Ok(()),
                other => Err(Error::unsupported_type(&format!(
                    "cannot inline field {} of {}: found {}",
                    key,
                    self.name,
                    other.kind_name()
                ))),
            };
        }
        let key = field.name.unwrap_or_else(|| self.ser.key(key));
        self.entries.push(Entry {
            key,
            help: field.help,
            value: item,
        });
        Ok(())
    }

    fn token(self) -> Result<String> {
        match self.entries.into_iter().next().map(|entry| entry.value) {
            Some(Item::String(text)) => Ok(text),
            _ => Err(Error::custom("malformed private number or datetime")),
        }
    }

    fn finish(self) -> Result<Item> {
        match self.kind {
            RecordKind::Number => {
                let text = self.token()?;
                Number::parse(&text)
                    .map(Item::Number)
                    .ok_or_else(|| Error::custom(format!("invalid number {:?}", text)))
            }
            RecordKind::Datetime => {
                let text = self.token()?;
                text.parse::<Datetime>().map(Item::Datetime)
            }
            RecordKind::Record => {
                let table = Item::Table(self.entries);
                Ok(match self.variant {
                    Some(variant) => Item::Table(vec![Entry::new(variant, table)]),
                    None => table,
                })
            }
        }
    }
}

impl ser::SerializeStruct for SerializeRecord<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Item> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for SerializeRecord<'_> {
    type Ok = Item;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Item> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Field, Fields};
    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Database {
        max_conns: u32,
    }

    #[derive(Serialize)]
    struct Config {
        server_name: String,
        secret: String,
        database: Database,
        extra: Database,
    }

    fn keys(item: &Item) -> Vec<&str> {
        match item {
            Item::Table(entries) => entries.iter().map(|e| e.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn config() -> Config {
        Config {
            server_name: "db".into(),
            secret: "hunter2".into(),
            database: Database { max_conns: 8 },
            extra: Database { max_conns: 2 },
        }
    }

    #[test]
    fn test_field_descriptors() {
        let options = Options::new().with_fields(
            Fields::new()
                .field("Config", "secret", Field::new().ignored())
                .field("Config", "server_name", Field::new().with_name("NAME").with_help("shown"))
                .field("Config", "database", Field::new().with_naming(NamingConvention::PascalCase))
                .field("Config", "extra", Field::new().inlined()),
        );
        let item = to_item(&config(), &options, NamingConvention::KebabCase).unwrap();
        assert_eq!(keys(&item), vec!["NAME", "database", "max-conns"]);
        let Item::Table(entries) = &item else {
            panic!("expected a table");
        };
        assert_eq!(entries[0].help, vec!["shown"]);
        assert_eq!(keys(&entries[1].value), vec!["MaxConns"]);
    }

    #[test]
    fn test_map_keys_sorted_for_encoding_only() {
        let map: HashMap<i32, bool> = [(3, true), (1, false), (2, true)].into_iter().collect();
        let item = to_item(&map, &Options::new(), NamingConvention::SnakeCase).unwrap();
        assert_eq!(keys(&item), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_non_scalar_map_key() {
        let map: HashMap<Vec<u8>, u8> = [(vec![1], 1)].into_iter().collect();
        let err = to_value(&map).unwrap_err();
        assert!(err.to_string().contains("map key must be a scalar"));
    }

    #[test]
    fn test_private_structs_become_scalars() {
        let big = Number::parse("123456789012345678901234567890").unwrap();
        assert_eq!(to_value(&big).unwrap(), Value::Number(big.clone()));
        let dt: Datetime = "1979-05-27T07:32:00Z".parse().unwrap();
        assert_eq!(to_value(&dt).unwrap(), Value::Datetime(dt));
    }

    #[derive(Serialize)]
    enum Shape {
        Circle { radius: f64 },
        Point,
    }

    #[test]
    fn test_enum_variants() {
        let value = to_value(&vec![Shape::Circle { radius: 1.5 }, Shape::Point]).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(
            items[0].get("Circle").and_then(|c| c.get("radius")).and_then(Value::as_f64),
            Some(1.5)
        );
        assert_eq!(items[1].as_str(), Some("Point"));
    }
}
