//! # serde_boa
//!
//! Serde-compatible TOML and JSON5 configuration documents that survive a
//! round trip byte for byte.
//!
//! ## Key Features
//!
//! - **Format-Preserving**: parsing keeps every comment, blank line and
//!   quoting choice, so an unedited [`Document`] writes back exactly as read
//! - **Surgical Edits**: [`Document::set_scalar`] rewrites one value and
//!   leaves every other byte alone
//! - **Serde Compatible**: works with `#[derive(Serialize, Deserialize)]`
//!   types, including integers and decimals beyond 64 bits
//! - **Configurable Binding**: naming conventions, per-field descriptors and
//!   an environment variable overlay
//! - **Precise Errors**: syntax errors carry line and column, binding errors
//!   name the destination path such as `.servers[2].ip`
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! serde_boa = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Reading and Writing
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_boa::{json5, toml};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Database {
//!     url: String,
//!     max_conns: u32,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Config {
//!     name: String,
//!     database: Database,
//! }
//!
//! let config = Config {
//!     name: "demo".to_string(),
//!     database: Database { url: "postgres://db".to_string(), max_conns: 8 },
//! };
//!
//! let text = toml::to_string(&config).unwrap();
//! assert_eq!(text, "name = \"demo\"\n\n[database]\nurl = \"postgres://db\"\nmax_conns = 8\n");
//! assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
//!
//! let text = json5::to_string(&config).unwrap();
//! assert_eq!(json5::from_str::<Config>(&text).unwrap(), config);
//! ```
//!
//! ### Editing in Place
//!
//! ```rust
//! use serde_boa::{toml, Literal, Number};
//!
//! let mut doc = toml::parse("# service\nport = 80 # public\n").unwrap();
//! let port = doc.find(&["port"]).unwrap();
//! doc.set_scalar(port, Literal::Number(Number::from(8080))).unwrap();
//! assert_eq!(doc.to_string(), "# service\nport = 8080 # public\n");
//! ```
//!
//! ### Environment Overlay
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_boa::{toml, Environment, Options};
//!
//! #[derive(Deserialize)]
//! struct Server { host: String, port: u16 }
//!
//! let options = Options::new()
//!     .with_automatic_env("APP")
//!     .with_environment(Environment::from_list(&["APP_PORT=9000"]));
//! let server: Server = toml::from_str_with_options("host = \"a\"\nport = 80", &options).unwrap();
//! assert_eq!(server.port, 9000);
//! ```
//!
//! ## Modules
//!
//! - [`toml`] and [`json5`]: parse, bind and render each format
//! - [`syntax`]: tokens, the rune-level lexer engine and the document tree
//! - [`path`]: key paths and the Set-by-path resolution of documents
//! - [`naming`]: key naming conventions
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - No panics in the public API

#[macro_use]
mod macros;

mod datetime;
mod de;
mod env;
pub mod error;
mod map;
pub mod naming;
pub mod number;
mod options;
pub mod path;
mod ser;
pub mod syntax;
mod value;

pub mod json5;
pub mod toml;

pub use datetime::Datetime;
pub use env::Environment;
pub use error::{Error, Result};
pub use map::Map;
pub use naming::NamingConvention;
pub use number::{Decimal, Number};
pub use options::{Field, Fields, LineBreak, Options};
pub use path::{KeyPath, Segment};
pub use ser::to_value;
pub use syntax::{Cursor, Document, Format, Literal, Node, NodeId, NodeKind, Token, TokenKind};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Listener {
        address: String,
        tls: bool,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Service {
        listeners: Vec<Listener>,
        name: String,
        labels: BTreeMap<String, String>,
        weight: f64,
    }

    fn service() -> Service {
        Service {
            listeners: vec![
                Listener {
                    address: "0.0.0.0:80".into(),
                    tls: false,
                },
                Listener {
                    address: "0.0.0.0:443".into(),
                    tls: true,
                },
            ],
            name: "edge".into(),
            labels: BTreeMap::from([("tier".to_string(), "front".to_string())]),
            weight: 5.0,
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let text = toml::to_string(&service()).unwrap();
        assert!(text.starts_with("name = \"edge\"\nweight = 5.0\n"));
        let back: Service = toml::from_str(&text).unwrap();
        assert_eq!(back, service());
    }

    #[test]
    fn test_json5_round_trip() {
        let text = json5::to_string(&service()).unwrap();
        let back: Service = json5::from_str(&text).unwrap();
        assert_eq!(back, service());

        let json = json5::to_string_json(&service()).unwrap();
        let check: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(check["weight"], serde_json::json!(5.0));
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&service()).unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("edge"));
        assert_eq!(value.get("listeners").and_then(Value::as_array).map(Vec::len), Some(2));
    }

    #[test]
    fn test_document_into_value() {
        let value: Value = json5::from_str("{a: [1, 'x'], b: {c: null}}").unwrap();
        assert!(value.get("a").unwrap().is_array());
        assert!(value.get("b").unwrap().get("c").unwrap().is_null());
    }
}
