//! Environment variable sources and the string deserializer used by the
//! environment overlay.

use crate::error::{Error, Result};
use crate::number::parse_integer;
use serde::de::value::SeqDeserializer;
use serde::de::{self, IntoDeserializer, Visitor};
use std::fmt;
use std::sync::Arc;

type LookupFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where environment variables are read from.
///
/// # Examples
///
/// ```rust
/// use serde_boa::Environment;
///
/// let env = Environment::from_list(&["APP_PORT=8080", "APP_HOSTS=a:b"]);
/// assert_eq!(env.lookup("APP_PORT").as_deref(), Some("8080"));
/// assert_eq!(env.has_prefix("APP_"), Some(true));
///
/// let env = Environment::from_fn(|key| (key == "HOME").then(|| "/root".to_string()));
/// assert_eq!(env.lookup("HOME").as_deref(), Some("/root"));
/// assert_eq!(env.has_prefix("HO"), None);
/// ```
#[derive(Clone, Default)]
pub enum Environment {
    /// The variables of the running process.
    #[default]
    Process,
    /// A fixed set of variables.
    List(Vec<(String, String)>),
    /// A lookup function.
    Func(LookupFn),
}

impl Environment {
    /// Builds a fixed environment from `KEY=value` strings. Entries without
    /// `=` are ignored.
    #[must_use]
    pub fn from_list<S: AsRef<str>>(vars: &[S]) -> Self {
        Environment::List(
            vars.iter()
                .filter_map(|kv| kv.as_ref().split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Environment::Func(Arc::new(f))
    }

    /// Returns the value of `key`. With a list, the last definition wins.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        match self {
            Environment::Process => std::env::var(key).ok(),
            Environment::List(vars) => vars
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            Environment::Func(f) => f(key),
        }
    }

    /// Tells whether any variable name starts with `prefix`, or `None` if the
    /// source can not be enumerated.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> Option<bool> {
        match self {
            Environment::Process => Some(std::env::vars_os().any(|(k, _)| {
                k.to_str().map_or(false, |k| k.starts_with(prefix))
            })),
            Environment::List(vars) => Some(vars.iter().any(|(k, _)| k.starts_with(prefix))),
            Environment::Func(_) => None,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Process => f.write_str("Process"),
            Environment::List(vars) => f.debug_tuple("List").field(vars).finish(),
            Environment::Func(_) => f.write_str("Func"),
        }
    }
}

/// Turns a document key into the part of a variable name it contributes:
/// non-alphanumerics become `_` and letters are upper-cased.
pub(crate) fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", prefix, name)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Deserializes the text of one environment variable.
///
/// Scalars are parsed from the text, sequences are split on `:`.
pub(crate) struct EnvDeserializer {
    key: String,
    value: String,
}

impl EnvDeserializer {
    pub(crate) fn new(key: String, value: String) -> Self {
        EnvDeserializer { key, value }
    }

    fn invalid(&self, what: &str) -> Error {
        Error::env(&self.key, format!("invalid {} {:?}", what, self.value))
    }

    fn integer<T: TryFrom<num_bigint::BigInt>>(&self, target: &str) -> Result<T> {
        let n = parse_integer(self.value.trim()).ok_or_else(|| self.invalid("integer"))?;
        T::try_from(n).map_err(|_| Error::env(&self.key, Error::overflow(&self.value, target)))
    }

    fn float(&self) -> Result<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| self.invalid("float"))
    }
}

impl<'de> IntoDeserializer<'de, Error> for EnvDeserializer {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! env_integer {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                let v: $ty = self.integer(stringify!($ty))?;
                visitor.$visit(v)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for EnvDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.value)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match parse_bool(self.value.trim()) {
            Some(b) => visitor.visit_bool(b),
            None => Err(self.invalid("bool")),
        }
    }

    env_integer! {
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

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let f = self.float()?;
        if f.is_finite() && (f as f32).is_infinite() {
            return Err(Error::env(&self.key, Error::overflow(&self.value, "f32")));
        }
        visitor.visit_f32(f as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.float()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let mut chars = self.value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.invalid("character")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.value)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.value)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.value.into_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.value.into_bytes())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let key = self.key;
        let items: Vec<EnvDeserializer> = if self.value.is_empty() {
            Vec::new()
        } else {
            self.value
                .split(':')
                .enumerate()
                .map(|(i, part)| EnvDeserializer::new(format!("{}[{}]", key, i), part.to_string()))
                .collect()
        };
        let mut seq = SeqDeserializer::<_, Error>::new(items.into_iter());
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::env(&self.key, "a table can not be read from a variable"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(self.value.into_deserializer())
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.value)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}
