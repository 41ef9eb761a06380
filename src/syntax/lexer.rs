//! Rune-level scanning engine shared by the format lexers.
//!
//! A [`Lexer`] pulls runes from a [`RuneSource`] and runs a chain of state
//! functions. Each state consumes runes with the `accept_*` primitives, calls
//! [`Lexer::emit`] once it has recognized a token, and returns the next state.
//! [`Lexer::next`] resumes the chain until a token is available.
//!
//! Up to two runes can be pushed back with [`Lexer::unread_rune`], which is
//! enough to tell `[[` from `[` or `0x` from `0`.
//!
//! A lexical error is reported exactly once; the lexer is closed afterwards
//! and yields [`TokenKind::Eof`] forever.

use crate::error::{Error, Result};
use crate::syntax::regexp::Regexp;
use crate::syntax::{Cursor, Literal, Token, TokenKind};
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::str::Chars;

/// Failure of a [`RuneSource`].
#[derive(Debug)]
pub enum SourceError {
    /// The byte stream is not valid UTF-8.
    BadUtf8,
    /// The underlying reader failed.
    Io(String),
}

/// A stream of Unicode scalar values.
pub trait RuneSource {
    /// Returns the next rune, or `None` at the end of the input.
    fn next_rune(&mut self) -> std::result::Result<Option<char>, SourceError>;
}

/// Reads runes out of a string slice.
pub struct StrSource<'a> {
    chars: Chars<'a>,
}

impl<'a> StrSource<'a> {
    pub fn new(input: &'a str) -> Self {
        StrSource {
            chars: input.chars(),
        }
    }
}

impl RuneSource for StrSource<'_> {
    #[inline]
    fn next_rune(&mut self) -> std::result::Result<Option<char>, SourceError> {
        Ok(self.chars.next())
    }
}

/// Decodes UTF-8 runes out of a buffered reader, one byte at a time so that
/// nothing past the current rune is consumed from the reader.
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        ReaderSource { inner }
    }

    fn read_byte(&mut self) -> std::result::Result<Option<u8>, SourceError> {
        loop {
            let byte = match self.inner.fill_buf() {
                Ok([]) => return Ok(None),
                Ok(buf) => buf[0],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceError::Io(e.to_string())),
            };
            self.inner.consume(1);
            return Ok(Some(byte));
        }
    }
}

impl<R: BufRead> RuneSource for ReaderSource<R> {
    fn next_rune(&mut self) -> std::result::Result<Option<char>, SourceError> {
        let mut buf = [0u8; 4];
        buf[0] = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };
        let width = match buf[0] {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Err(SourceError::BadUtf8),
        };
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self.read_byte()?.ok_or(SourceError::BadUtf8)?;
        }
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or(SourceError::BadUtf8)
    }
}

/// A lexer state: consumes some input and returns the state to resume with,
/// or `None` once the lexer is closed.
pub struct StateFn<S>(pub fn(&mut Lexer<'_, S>) -> Option<StateFn<S>>);

impl<S> Clone for StateFn<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for StateFn<S> {}

#[derive(Clone, Copy, Debug)]
struct Entry {
    rune: char,
    at: Cursor,
    prev: Cursor,
}

/// Ring of the last two runes read, for pushback.
#[derive(Debug, Default)]
struct BackBuffer {
    ring: [Option<Entry>; 2],
    head: usize,
    unread: usize,
}

impl BackBuffer {
    fn push(&mut self, entry: Entry) {
        self.ring[self.head] = Some(entry);
        self.head = (self.head + 1) % 2;
    }

    fn unread(&mut self) -> Option<Entry> {
        if self.unread >= 2 {
            return None;
        }
        let entry = self.ring[(self.head + 1 + self.unread) % 2]?;
        self.unread += 1;
        Some(entry)
    }

    fn reread(&mut self) -> Option<Entry> {
        if self.unread == 0 {
            return None;
        }
        let entry = self.ring[(self.head + 2 - self.unread) % 2]?;
        self.unread -= 1;
        Some(entry)
    }
}

/// The scanning engine, parameterized by format-specific state `S`.
pub struct Lexer<'a, S> {
    source: Box<dyn RuneSource + 'a>,
    state: Option<StateFn<S>>,
    pending: VecDeque<Result<Token>>,
    buf: String,
    back: BackBuffer,
    token_position: Cursor,
    next_position: Cursor,
    position: Cursor,
    /// Format-specific lexing state.
    pub data: S,
}

impl<'a, S> Lexer<'a, S> {
    pub fn new(source: impl RuneSource + 'a, start: StateFn<S>, data: S) -> Self {
        Lexer {
            source: Box::new(source),
            state: Some(start),
            pending: VecDeque::new(),
            buf: String::new(),
            back: BackBuffer::default(),
            token_position: Cursor::default(),
            next_position: Cursor::default(),
            position: Cursor::default(),
            data,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'a str, start: StateFn<S>, data: S) -> Self {
        Self::new(StrSource::new(input), start, data)
    }

    pub fn from_reader<R: BufRead + 'a>(reader: R, start: StateFn<S>, data: S) -> Self {
        Self::new(ReaderSource::new(reader), start, data)
    }

    /// Returns the next token.
    ///
    /// # Errors
    ///
    /// Returns the lexical error that closed the lexer, once.
    pub fn next(&mut self) -> Result<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            match self.state.take() {
                Some(StateFn(state)) => self.state = state(self),
                None => {
                    return Ok(Token {
                        kind: TokenKind::Eof,
                        raw: String::new(),
                        value: None,
                        start: self.next_position,
                        end: self.next_position,
                    })
                }
            }
        }
    }

    /// Position of the first rune of the token being scanned.
    #[inline]
    pub fn token_position(&self) -> Cursor {
        self.token_position
    }

    /// Position of the last rune read.
    #[inline]
    pub fn position(&self) -> Cursor {
        self.position
    }

    /// Position of the next rune to be read.
    #[inline]
    pub fn next_position(&self) -> Cursor {
        self.next_position
    }

    /// Text of the token being scanned.
    #[inline]
    pub fn current(&self) -> &str {
        &self.buf
    }

    /// Reads a rune, or returns `None` at the end of the input.
    pub fn read_rune(&mut self) -> Result<Option<char>> {
        if let Some(entry) = self.back.reread() {
            self.position = entry.at;
            self.next_position = entry.at.advance(entry.rune);
            self.buf.push(entry.rune);
            return Ok(Some(entry.rune));
        }
        let rune = match self.source.next_rune() {
            Ok(Some(r)) => r,
            Ok(None) => return Ok(None),
            Err(SourceError::BadUtf8) => {
                return Err(Error::syntax_at(self.next_position, "bad UTF-8 character"))
            }
            Err(SourceError::Io(msg)) => return Err(Error::Io(msg)),
        };
        self.back.push(Entry {
            rune,
            at: self.next_position,
            prev: self.position,
        });
        self.position = self.next_position;
        self.next_position = self.next_position.advance(rune);
        self.buf.push(rune);
        Ok(Some(rune))
    }

    /// Pushes back the last rune read. At most two runes can be pushed back.
    pub fn unread_rune(&mut self) -> Result<()> {
        let entry = self
            .back
            .unread()
            .ok_or_else(|| Error::syntax_at(self.position, "cannot push back more than 2 runes"))?;
        self.next_position = entry.at;
        self.position = entry.prev;
        self.buf.pop();
        Ok(())
    }

    /// Returns the next rune without consuming it.
    pub fn peek_rune(&mut self) -> Result<Option<char>> {
        let rune = self.read_rune()?;
        if rune.is_some() {
            self.unread_rune()?;
        }
        Ok(rune)
    }

    /// Error for the end of input in the middle of a token.
    pub fn unexpected_eof(&self) -> Error {
        Error::syntax_at(self.next_position, "unexpected end of file")
    }

    /// Consumes `expected`, or fails without consuming anything.
    pub fn accept_rune(&mut self, expected: char) -> Result<()> {
        match self.read_rune()? {
            Some(r) if r == expected => Ok(()),
            Some(r) => {
                self.unread_rune()?;
                Err(Error::syntax_at(
                    self.next_position,
                    format!("unexpected character {:?}: expected {:?}", r, expected),
                ))
            }
            None => Err(self.unexpected_eof()),
        }
    }

    /// Consumes every rune of `expected`, in order.
    pub fn accept_str(&mut self, expected: &str) -> Result<()> {
        expected.chars().try_for_each(|r| self.accept_rune(r))
    }

    /// Consumes one rune satisfying `pred`, described as `what` in errors.
    pub fn accept_if(&mut self, what: &str, pred: impl Fn(char) -> bool) -> Result<char> {
        match self.read_rune()? {
            Some(r) if pred(r) => Ok(r),
            Some(r) => {
                self.unread_rune()?;
                Err(Error::syntax_at(
                    self.next_position,
                    format!("unexpected character {:?}: expected {}", r, what),
                ))
            }
            None => Err(self.unexpected_eof()),
        }
    }

    /// Consumes runes while `pred` holds; stops silently at the end of input.
    /// Returns the number of runes consumed.
    pub fn accept_while(&mut self, pred: impl Fn(char) -> bool) -> Result<usize> {
        let mut count = 0;
        while let Some(r) = self.read_rune()? {
            if !pred(r) {
                self.unread_rune()?;
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Consumes the longest run of input matching `re` and returns its
    /// capture groups, group 0 being the whole match.
    pub fn accept_regex(&mut self, re: &Regexp) -> Result<Vec<String>> {
        re.accept(self)
    }

    /// Emits the scanned text as a token of the given kind and starts a new
    /// token.
    pub fn emit(&mut self, kind: TokenKind, value: Option<Literal>) {
        let token = Token {
            kind,
            raw: std::mem::take(&mut self.buf),
            value,
            start: self.token_position,
            end: self.position,
        };
        self.pending.push_back(Ok(token));
        self.token_position = self.next_position;
    }

    /// Drops the scanned text and starts a new token.
    pub fn discard(&mut self) {
        self.buf.clear();
        self.token_position = self.next_position;
    }

    /// Emits the end of input and closes the lexer.
    pub fn eof(&mut self) -> Option<StateFn<S>> {
        if !self.buf.is_empty() {
            return self.fail(self.unexpected_eof());
        }
        self.emit(TokenKind::Eof, None);
        None
    }

    /// Reports `err` and closes the lexer.
    pub fn fail(&mut self, err: Error) -> Option<StateFn<S>> {
        tracing::trace!(error = %err, "lexer closed on error");
        self.buf.clear();
        self.pending.push_back(Err(err));
        None
    }

    /// Reports a syntax error positioned at the start of the current token.
    pub fn fail_here(&mut self, msg: impl Into<String>) -> Option<StateFn<S>> {
        let err = Error::syntax_at(self.token_position, msg);
        self.fail(err)
    }
}
