//! Format-independent building blocks shared by the TOML and JSON5 readers.
//!
//! - [`Cursor`] and [`Token`]: positioned lexemes that keep their raw text, so
//!   concatenating every token of a parse reproduces the input exactly
//! - [`lexer`]: the rune-level scanning engine with bounded pushback
//! - [`regexp`]: a longest-match regular expression acceptor driven rune by
//!   rune from the lexer
//! - [`node`]: the format-preserving document tree

pub mod lexer;
pub mod node;
pub mod regexp;

pub use lexer::{Lexer, StateFn};
pub use node::{Children, Document, Format, Node, NodeId, NodeKind};
pub use regexp::Regexp;

use crate::datetime::Datetime;
use crate::error::Error;
use crate::number::Number;
use crate::path::KeyPath;
use std::fmt;

/// A 1-based position in a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Cursor { line, column }
    }

    /// Returns the position following `r`.
    #[inline]
    #[must_use]
    pub const fn advance(self, r: char) -> Self {
        if r == '\n' {
            Cursor {
                line: self.line + 1,
                column: 1,
            }
        } else {
            Cursor {
                line: self.line,
                column: self.column + 1,
            }
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor { line: 1, column: 1 }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The lexical class of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Error,
    Comment,
    InlineComment,
    Whitespace,
    Newline,
    String,
    Number,
    Bool,
    Nil,
    DateTime,
    Identifier,
    Equal,
    Dot,
    Comma,
    Colon,
    Plus,
    Minus,
    LBrace,
    RBrace,
    LSquare,
    RSquare,
    DoubleLSquare,
    DoubleRSquare,
}

impl TokenKind {
    /// Returns `true` for tokens that carry no meaning: whitespace, newlines
    /// and comments.
    #[inline]
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::Comment
                | TokenKind::InlineComment
        )
    }

    /// Returns `true` for comment tokens.
    #[inline]
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::InlineComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "<eof>",
            TokenKind::Error => "<error>",
            TokenKind::Comment => "<comment>",
            TokenKind::InlineComment => "<inline-comment>",
            TokenKind::Whitespace => "<whitespace>",
            TokenKind::Newline => "<newline>",
            TokenKind::String => "<string>",
            TokenKind::Number => "<number>",
            TokenKind::Bool => "<bool>",
            TokenKind::Nil => "<nil>",
            TokenKind::DateTime => "<datetime>",
            TokenKind::Identifier => "<identifier>",
            TokenKind::Equal => "'='",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LSquare => "'['",
            TokenKind::RSquare => "']'",
            TokenKind::DoubleLSquare => "'[['",
            TokenKind::DoubleRSquare => "']]'",
        };
        f.write_str(s)
    }
}

/// The interpreted value of a token or node.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
    DateTime(Datetime),
    KeyPath(KeyPath),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::DateTime(dt) => write!(f, "{}", dt),
            Literal::KeyPath(path) => write!(f, "{}", path),
        }
    }
}

/// A lexeme, with its exact source text and interpreted value.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub value: Option<Literal>,
    pub start: Cursor,
    pub end: Cursor,
}

impl Token {
    /// Creates a token that does not come from any source text, as used by
    /// the fresh encoders and surgical edits.
    #[must_use]
    pub fn synthetic(kind: TokenKind, raw: impl Into<String>) -> Self {
        Token {
            kind,
            raw: raw.into(),
            value: None,
            start: Cursor::default(),
            end: Cursor::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Error for this token appearing where one of `expected` was required.
    pub(crate) fn unexpected(&self, expected: &[TokenKind]) -> Error {
        let expected: Vec<String> = expected.iter().map(TokenKind::to_string).collect();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        Error::unexpected_token(self.start.line, self.start.column, &self.to_string(), &expected)
    }

    /// Returns the string value of string and identifier tokens.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(Literal::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "<eof>"),
            TokenKind::Newline => write!(f, "<newline>"),
            _ => write!(f, "{:?}", self.raw),
        }
    }
}
