//! TOML documents.
//!
//! [`parse`] reads a document into a format-preserving [`Document`], whose
//! `Display` implementation writes it back byte for byte. [`from_str`] and
//! friends bind a document onto Rust types, [`to_string`] and friends render
//! Rust values as fresh documents.
//!
//! Keys use `snake_case` unless the [`Options`] choose another
//! [`NamingConvention`].
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_boa::toml;
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Server {
//!     listen_addr: String,
//!     max_conns: u32,
//! }
//!
//! let text = "listen_addr = \"0.0.0.0:80\" # public\nmax_conns = 64\n";
//! let server: Server = toml::from_str(text).unwrap();
//! assert_eq!(server.max_conns, 64);
//!
//! let doc = toml::parse(text).unwrap();
//! assert_eq!(doc.to_string(), text);
//!
//! assert_eq!(
//!     toml::to_string(&server).unwrap(),
//!     "listen_addr = \"0.0.0.0:80\"\nmax_conns = 64\n"
//! );
//! ```

pub(crate) mod encode;
pub(crate) mod lex;
mod parse;

use crate::error::{Error, Result};
use crate::naming::NamingConvention;
use crate::options::Options;
use crate::syntax::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, BufReader};

/// Parses TOML text into a document.
///
/// # Errors
///
/// Returns the first syntax error or key redefinition.
pub fn parse(input: &str) -> Result<Document> {
    parse::Parser::new(lex::lexer_from_str(input)).parse()
}

/// Parses a TOML document read from `reader`.
///
/// # Errors
///
/// Fails on read errors, invalid UTF-8 and anything [`parse`] rejects.
pub fn parse_reader<R: io::Read>(reader: R) -> Result<Document> {
    parse::Parser::new(lex::lexer_from_reader(BufReader::new(reader))).parse()
}

/// Deserializes an instance of `T` from TOML text.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use serde_boa::toml;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = toml::from_str("x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns syntax errors, and binding errors wrapped with the destination
/// path and document position.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_str_with_options(input, &Options::default())
}

/// Deserializes an instance of `T` from TOML text with custom options.
///
/// # Errors
///
/// See [`from_str`]. Environment values that can not be parsed also fail.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T: DeserializeOwned>(input: &str, options: &Options) -> Result<T> {
    let doc = parse(input)?;
    from_document(&doc, options)
}

/// Deserializes an instance of `T` from bytes of TOML text.
///
/// # Errors
///
/// Fails on invalid UTF-8, and as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    let s = std::str::from_utf8(input).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Deserializes an instance of `T` from an I/O stream of TOML.
///
/// # Errors
///
/// Fails on read errors, and as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R: io::Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    let doc = parse_reader(reader)?;
    from_document(&doc, &Options::default())
}

/// Binds an already parsed document onto `T`.
///
/// # Errors
///
/// Returns binding errors wrapped with the destination path.
pub fn from_document<T: DeserializeOwned>(doc: &Document, options: &Options) -> Result<T> {
    from_documents(&[doc], options)
}

/// Binds several documents onto `T` at once. Tables are combined, and any
/// other value in a later document replaces the one before it.
///
/// ```rust
/// use serde::Deserialize;
/// use serde_boa::{toml, Options};
///
/// #[derive(Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let defaults = toml::parse("host = \"localhost\"\nport = 80\n").unwrap();
/// let local = toml::parse("port = 8080\n").unwrap();
/// let server: Server = toml::from_documents(&[&defaults, &local], &Options::default()).unwrap();
/// assert_eq!((server.host.as_str(), server.port), ("localhost", 8080));
/// ```
///
/// # Errors
///
/// Returns binding errors wrapped with the destination path and the
/// position in the document that supplied the value.
pub fn from_documents<T: DeserializeOwned>(docs: &[&Document], options: &Options) -> Result<T> {
    crate::de::from_documents(docs, options, options.naming_or(NamingConvention::SnakeCase))
}

/// Renders `value` and parses the result back, giving a document that can
/// be edited in place.
///
/// # Errors
///
/// See [`to_string_with_options`].
pub fn to_document<T: ?Sized + Serialize>(value: &T, options: &Options) -> Result<Document> {
    parse(&to_string_with_options(value, options)?)
}

/// Serializes `value` as a TOML document.
///
/// # Errors
///
/// The top-level value must be a struct or a map, and `None` values can only
/// be omitted, not written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    to_string_with_options(value, &Options::default())
}

/// Serializes `value` as a TOML document with custom options.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_boa::{toml, NamingConvention, Options};
///
/// #[derive(Serialize)]
/// struct Limits { max_conns: u32 }
///
/// let options = Options::new().with_naming(NamingConvention::KebabCase);
/// let text = toml::to_string_with_options(&Limits { max_conns: 8 }, &options).unwrap();
/// assert_eq!(text, "max-conns = 8\n");
/// ```
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T: ?Sized + Serialize>(value: &T, options: &Options) -> Result<String> {
    let naming = options.naming_or(NamingConvention::SnakeCase);
    tracing::debug!(naming = naming.name(), "encoding fresh TOML document");
    let item = crate::ser::to_item(value, options, naming)?;
    encode::encode(&item, options)
}

/// Serializes `value` as TOML into `writer`.
///
/// # Errors
///
/// Fails as [`to_string`], or when writing fails.
pub fn to_writer<W: io::Write, T: ?Sized + Serialize>(writer: W, value: &T) -> Result<()> {
    to_writer_with_options(writer, value, &Options::default())
}

/// Serializes `value` as TOML into `writer` with custom options.
///
/// # Errors
///
/// Fails as [`to_string_with_options`], or when writing fails.
pub fn to_writer_with_options<W: io::Write, T: ?Sized + Serialize>(
    mut writer: W,
    value: &T,
    options: &Options,
) -> Result<()> {
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}
