//! Error types for document parsing, encoding and binding.
//!
//! Every error that can be traced back to a place in a document carries the
//! 1-based line and column of that place.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: invalid characters, unterminated literals and bad
//!   escapes found by the lexers
//! - **Unexpected Tokens/Nodes**: grammar violations, listing what would have
//!   been accepted instead
//! - **Duplicate Keys**: TOML keys or tables defined twice, pointing at both
//!   definitions
//! - **Type Mismatches and Overflows**: a document value that does not fit the
//!   destination type
//! - **Load Errors**: a binding failure wrapped with the destination path, such
//!   as `.servers[2].ip`
//!
//! ## Examples
//!
//! ```rust
//! use serde_boa::{toml, Error};
//!
//! let err = toml::parse("a = 1\na = 2").unwrap_err();
//! assert!(matches!(err, Error::DuplicateKey { orig_line: 1, .. }));
//! assert!(err.to_string().contains("key a is already defined at line 1, column 1"));
//! ```

use crate::syntax::Cursor;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading, binding or
/// writing a configuration document.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Lexical error: a character or character sequence that does not belong
    /// to the grammar.
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// A token that the grammar does not allow at this point.
    #[error("Syntax error at line {line}, column {col}: on token {found}: {}", expected_list(.expected))]
    UnexpectedToken {
        line: usize,
        col: usize,
        found: String,
        expected: Vec<String>,
    },

    /// A document node of a kind the operation does not handle.
    #[error("Unexpected node at line {line}, column {col}: found {found}, expected {}", expected_list(.expected))]
    UnexpectedNode {
        line: usize,
        col: usize,
        found: String,
        expected: Vec<String>,
    },

    /// A key, table or array of tables that was already defined.
    #[error("Syntax error at line {line}, column {col}: {kind} {path} is already defined at line {orig_line}, column {orig_col}")]
    DuplicateKey {
        line: usize,
        col: usize,
        kind: &'static str,
        path: String,
        orig_line: usize,
        orig_col: usize,
    },

    /// Document value of the wrong kind for the destination
    #[error("config has {found}, but expected {expected} instead")]
    TypeMismatch { found: String, expected: String },

    /// Number that does not fit in the destination type
    #[error("cannot assign {value} to {target}: value does not fit")]
    Overflow { value: String, target: String },

    /// Unsupported type for serialization
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// An environment variable was found but could not be parsed.
    #[error("environment variable {key}: {msg}")]
    Env { key: String, msg: String },

    /// A binding failure, located in both the document and the destination.
    #[error("at {line}:{col}: cannot load value into {target}: {source}")]
    Load {
        line: usize,
        col: usize,
        target: String,
        source: Box<Error>,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

fn expected_list(expected: &[String]) -> String {
    match expected {
        [] => "unexpected token".to_string(),
        [one] => format!("expected token {}", one),
        [a, b] => format!("expected token {} or {}", a, b),
        [init @ .., last] => format!("expected token {}, or {}", init.join(", "), last),
    }
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected newline");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates a syntax error positioned at a cursor.
    pub(crate) fn syntax_at(at: Cursor, msg: impl Into<String>) -> Self {
        Error::Syntax {
            line: at.line,
            col: at.column,
            msg: msg.into(),
        }
    }

    /// Creates an error for a token that is not one of `expected`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Error;
    ///
    /// let err = Error::unexpected_token(2, 7, "'}'", &["','", "']'"]);
    /// assert!(err.to_string().ends_with("expected token ',' or ']'"));
    ///
    /// let err = Error::unexpected_token(1, 1, "'='", &["<identifier>", "<string>", "'['"]);
    /// assert!(err.to_string().ends_with("<identifier>, <string>, or '['"));
    /// ```
    pub fn unexpected_token(line: usize, col: usize, found: &str, expected: &[&str]) -> Self {
        Error::UnexpectedToken {
            line,
            col,
            found: found.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Creates an error for a document node of the wrong kind.
    pub fn unexpected_node(line: usize, col: usize, found: &str, expected: &[&str]) -> Self {
        Error::UnexpectedNode {
            line,
            col,
            found: found.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Creates a duplicate definition error.
    ///
    /// `at` is where the second definition starts and `orig` where the first
    /// one was made.
    pub fn duplicate_key(at: Cursor, kind: &'static str, path: String, orig: Cursor) -> Self {
        Error::DuplicateKey {
            line: at.line,
            col: at.column,
            kind,
            path,
            orig_line: orig.line,
            orig_col: orig.column,
        }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Error;
    ///
    /// let err = Error::type_mismatch("string", "integer");
    /// assert_eq!(err.to_string(), "config has string, but expected integer instead");
    /// ```
    pub fn type_mismatch(found: &str, expected: &str) -> Self {
        Error::TypeMismatch {
            found: found.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Creates an overflow error for a number that does not fit `target`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Error;
    ///
    /// let err = Error::overflow(300, "u8");
    /// assert_eq!(err.to_string(), "cannot assign 300 to u8: value does not fit");
    /// ```
    pub fn overflow<T: fmt::Display>(value: T, target: &str) -> Self {
        Error::Overflow {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// Creates an unsupported type error for types that have no document
    /// representation.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates an error for an environment variable holding an invalid value.
    pub fn env<T: fmt::Display>(key: &str, msg: T) -> Self {
        Error::Env {
            key: key.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Wraps a binding error with the document position and destination path.
    ///
    /// Errors that are already wrapped are returned unchanged, so the
    /// innermost location wins.
    pub fn load(self, at: Cursor, target: &str) -> Self {
        match self {
            Error::Load { .. } => self,
            source => Error::Load {
                line: at.line,
                col: at.column,
                target: target.to_string(),
                source: Box::new(source),
            },
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_boa::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the document position the error refers to, if any.
    #[must_use]
    pub fn position(&self) -> Option<Cursor> {
        match self {
            Error::Syntax { line, col, .. }
            | Error::UnexpectedToken { line, col, .. }
            | Error::UnexpectedNode { line, col, .. }
            | Error::DuplicateKey { line, col, .. }
            | Error::Load { line, col, .. } => Some(Cursor::new(*line, *col)),
            _ => None,
        }
    }

    /// Strips any [`Error::Load`] wrapping and returns the underlying error.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Load { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
