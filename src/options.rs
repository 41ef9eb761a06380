//! Configuration options for reading and writing documents.
//!
//! This module provides types to customize both directions:
//!
//! - [`Options`]: Main configuration struct
//! - [`LineBreak`]: Line terminator used by the fresh encoders
//! - [`Field`] and [`Fields`]: per-field binding descriptors
//!
//! ## Examples
//!
//! ```rust
//! use serde::Serialize;
//! use serde_boa::{toml, Field, Fields, NamingConvention, Options};
//!
//! #[derive(Serialize)]
//! struct Server {
//!     listen_addr: String,
//!     max_conns: u32,
//! }
//!
//! let server = Server { listen_addr: "0.0.0.0:80".into(), max_conns: 64 };
//!
//! let options = Options::new()
//!     .with_naming(NamingConvention::KebabCase)
//!     .with_fields(Fields::new().field("Server", "max_conns", Field::new().with_help("0 means unlimited")));
//! let out = toml::to_string_with_options(&server, &options).unwrap();
//! assert_eq!(out, "listen-addr = \"0.0.0.0:80\"\n# 0 means unlimited\nmax-conns = 64\n");
//! ```

use crate::env::Environment;
use crate::naming::NamingConvention;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Line terminator written by the fresh encoders.
///
/// # Examples
///
/// ```rust
/// use serde_boa::LineBreak;
///
/// assert_eq!(LineBreak::Lf.as_str(), "\n");
/// assert_eq!(LineBreak::CrLf.as_str(), "\r\n");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineBreak {
    #[default]
    Lf,
    CrLf,
}

impl LineBreak {
    /// Returns the string representation of this line break.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
        }
    }
}

/// How one record field is bound to a document.
///
/// # Examples
///
/// ```rust
/// use serde_boa::Field;
///
/// let field = Field::new().with_name("db-url").with_env("DATABASE_URL");
/// assert_eq!(field.name.as_deref(), Some("db-url"));
/// assert!(!field.ignore);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Field {
    /// Document key, used verbatim instead of the naming convention.
    pub name: Option<String>,
    /// Comment lines written above the key.
    pub help: Vec<String>,
    /// Skip the field when reading and writing.
    pub ignore: bool,
    /// Naming convention for the fields of the nested record.
    pub naming: Option<NamingConvention>,
    /// Read and write the nested record's fields as if they were declared
    /// on the parent.
    pub inline: bool,
    /// Environment variable that overrides the field. Setting it enables the
    /// lookup even without automatic environment overlay.
    pub env: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds help text. Multi-line text becomes several comment lines.
    #[must_use]
    pub fn with_help(mut self, help: &str) -> Self {
        self.help.extend(help.lines().map(|line| line.trim().to_string()));
        self
    }

    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    #[must_use]
    pub fn inlined(mut self) -> Self {
        self.inline = true;
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>) -> Self {
        self.env = Some(key.into());
        self
    }
}

/// A registry of field descriptors keyed by record name and field name.
///
/// The record name is the one serde reports for the type, which is the
/// Rust type name unless `#[serde(rename)]` changes it.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    fields: HashMap<(String, String), Field>,
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the descriptor of `record.field`.
    #[must_use]
    pub fn field(mut self, record: &str, field: &str, descriptor: Field) -> Self {
        self.fields
            .insert((record.to_string(), field.to_string()), descriptor);
        self
    }

    #[must_use]
    pub fn get(&self, record: &str, field: &str) -> Option<&Field> {
        self.fields.get(&(record.to_string(), field.to_string()))
    }
}

type FieldFn = Arc<dyn Fn(&str, &str) -> Option<Field> + Send + Sync>;
type KeyFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Configuration options for reading and writing documents.
///
/// # Examples
///
/// ```rust
/// use serde_boa::{LineBreak, NamingConvention, Options};
///
/// let options = Options::new()
///     .with_indent("    ")
///     .with_line_break(LineBreak::CrLf)
///     .with_naming(NamingConvention::CamelCase)
///     .with_automatic_env("APP");
/// assert_eq!(options.indent, "    ");
/// assert!(options.automatic_env);
/// ```
#[derive(Clone)]
pub struct Options {
    /// Indentation unit of the fresh encoders.
    pub indent: String,
    pub line_break: LineBreak,
    /// Key naming convention. `None` uses the format's default: `snake_case`
    /// for TOML and `camelCase` for JSON5.
    pub naming: Option<NamingConvention>,
    /// Write strict JSON from the JSON5 encoder.
    pub json: bool,
    /// Look up every record field in the environment.
    pub automatic_env: bool,
    /// Prefix of the variable names looked up by the automatic overlay.
    pub env_prefix: String,
    pub environment: Environment,
    field_fn: Option<FieldFn>,
    key_fn: Option<KeyFn>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            indent: "  ".to_string(),
            line_break: LineBreak::default(),
            naming: None,
            json: false,
            automatic_env: false,
            env_prefix: String::new(),
            environment: Environment::default(),
            field_fn: None,
            key_fn: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("indent", &self.indent)
            .field("line_break", &self.line_break)
            .field("naming", &self.naming)
            .field("json", &self.json)
            .field("automatic_env", &self.automatic_env)
            .field("env_prefix", &self.env_prefix)
            .field("environment", &self.environment)
            .field("fields", &self.field_fn.is_some())
            .field("key_stringifier", &self.key_fn.is_some())
            .finish()
    }
}

impl Options {
    /// Creates default options (two-space indent, `\n`, format default
    /// naming, no environment overlay).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.indent, "  ");
    /// assert!(!options.json);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    #[must_use]
    pub fn with_line_break(mut self, line_break: LineBreak) -> Self {
        self.line_break = line_break;
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Makes the JSON5 encoder write strict JSON: quoted keys, no trailing
    /// commas, no comments.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Enables the environment overlay for every field. Variable names are
    /// the field path in `SCREAMING_SNAKE_CASE` behind `prefix`, so with the
    /// prefix `APP` the field `db.max_conns` is read from `APP_DB_MAX_CONNS`.
    #[must_use]
    pub fn with_automatic_env(mut self, prefix: &str) -> Self {
        self.automatic_env = true;
        self.env_prefix = prefix.to_string();
        self
    }

    /// Sets where environment variables are looked up.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::{Environment, Options};
    ///
    /// let options = Options::new().with_environment(Environment::from_list(&["PORT=8080"]));
    /// assert_eq!(options.environment.lookup("PORT").as_deref(), Some("8080"));
    /// ```
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Uses the descriptors of a [`Fields`] registry.
    #[must_use]
    pub fn with_fields(self, fields: Fields) -> Self {
        self.with_field_fn(move |record, field| fields.get(record, field).cloned())
    }

    /// Uses a function that supplies a descriptor for a record name and a
    /// field name.
    #[must_use]
    pub fn with_field_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Option<Field> + Send + Sync + 'static,
    {
        self.field_fn = Some(Arc::new(f));
        self
    }

    /// Uses a function that turns map keys into document keys. Keys it
    /// returns `None` for fall back to their natural text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use serde_boa::{toml, Options, Value};
    ///
    /// let options = Options::new().with_key_stringifier(|key: &Value| {
    ///     key.as_i64().map(|port| format!("port-{}", port))
    /// });
    /// let map = BTreeMap::from([(80, "http"), (443, "https")]);
    /// let out = toml::to_string_with_options(&map, &options).unwrap();
    /// assert_eq!(out, "port-443 = \"https\"\nport-80 = \"http\"\n");
    /// ```
    #[must_use]
    pub fn with_key_stringifier<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.key_fn = Some(Arc::new(f));
        self
    }

    pub(crate) fn field(&self, record: &str, field: &str) -> Field {
        self.field_fn
            .as_ref()
            .and_then(|f| f(record, field))
            .unwrap_or_default()
    }

    pub(crate) fn stringify_key(&self, key: &Value) -> Option<String> {
        self.key_fn.as_ref().and_then(|f| f(key))
    }

    pub(crate) fn naming_or(&self, default: NamingConvention) -> NamingConvention {
        self.naming.unwrap_or(default)
    }
}
