//! JSON5 tokenizer.

use crate::error::{Error, Result};
use crate::number::Number;
use crate::syntax::{Lexer, Literal, StateFn, TokenKind};
use num_bigint::BigInt;
use std::io::BufRead;

const LINE_SEPARATOR: char = '\u{2028}';
const PARAGRAPH_SEPARATOR: char = '\u{2029}';

/// Lexing state carried between tokens.
pub(crate) struct State {
    /// Only whitespace was seen since the last newline; tells a `//`
    /// comment on its own line from one trailing a value.
    blank_line: bool,
}

impl Default for State {
    fn default() -> Self {
        State { blank_line: true }
    }
}

type Json5Lexer<'a> = Lexer<'a, State>;

pub(crate) fn lexer_from_str(input: &str) -> Json5Lexer<'_> {
    Lexer::from_str(input, StateFn(lex), State::default())
}

pub(crate) fn lexer_from_reader<'a, R: BufRead + 'a>(reader: R) -> Json5Lexer<'a> {
    Lexer::from_reader(reader, StateFn(lex), State::default())
}

#[inline]
fn is_newline(r: char) -> bool {
    matches!(r, '\n' | '\r' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR)
}

/// ES5 identifier characters; `first` for the start of an identifier.
#[inline]
pub(crate) fn is_identifier_char(r: char, first: bool) -> bool {
    let ok = r.is_alphabetic() || r == '$' || r == '_' || r == '\\';
    if first {
        return ok;
    }
    ok || r.is_numeric() || r == '\u{200C}' || r == '\u{200D}' || r == '\u{203F}' || r == '\u{2040}'
}

fn lex(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    let r = lex_next!(l, l.eof());
    let blank_line = l.data.blank_line;
    l.data.blank_line = false;

    match r {
        '{' => l.emit(TokenKind::LBrace, None),
        '}' => l.emit(TokenKind::RBrace, None),
        '[' => l.emit(TokenKind::LSquare, None),
        ']' => l.emit(TokenKind::RSquare, None),
        ':' => l.emit(TokenKind::Colon, None),
        ',' => l.emit(TokenKind::Comma, None),
        '+' => l.emit(TokenKind::Plus, None),
        '-' => l.emit(TokenKind::Minus, None),
        '"' | '\'' => return lex_string(l, r),
        '\n' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR => {
            l.data.blank_line = true;
            l.emit(TokenKind::Newline, None);
        }
        '\r' => {
            if lex_try!(l, l.peek_rune()) == Some('\n') {
                lex_try!(l, l.read_rune());
            }
            l.data.blank_line = true;
            l.emit(TokenKind::Newline, None);
        }
        '0' => match lex_try!(l, l.read_rune()) {
            Some('x' | 'X') => return lex_hex(l),
            Some('.' | 'e' | 'E') => {
                lex_try!(l, l.unread_rune());
                return lex_number(l);
            }
            Some(next @ '0'..='9') => {
                return l.fail_here(format!("parsing integer: unexpected character '{}'", next));
            }
            next => {
                if next.is_some() {
                    lex_try!(l, l.unread_rune());
                }
                l.emit(TokenKind::Number, Some(Literal::Number(Number::from(0))));
            }
        },
        '.' | '1'..='9' => return lex_number(l),
        '/' => match lex_try!(l, l.read_rune()) {
            Some('/') => {
                lex_try!(l, l.accept_while(|r| !is_newline(r)));
                let text = l.current()[2..].trim().to_string();
                let kind = if blank_line {
                    TokenKind::Comment
                } else {
                    TokenKind::InlineComment
                };
                l.emit(kind, Some(Literal::String(text)));
            }
            Some('*') => {
                l.data.blank_line = blank_line;
                return lex_block_comment(l);
            }
            Some(next) => return l.fail_here(format!("unexpected character {:?}", next)),
            None => {
                let err = l.unexpected_eof();
                return l.fail(err);
            }
        },
        r if r.is_whitespace() => {
            lex_try!(l, l.accept_while(|r| r.is_whitespace() && !is_newline(r)));
            l.data.blank_line = blank_line;
            l.emit(TokenKind::Whitespace, None);
        }
        r if is_identifier_char(r, true) => {
            lex_try!(l, l.unread_rune());
            return lex_identifier(l);
        }
        r => return l.fail_here(format!("unexpected character {:?}", r)),
    }
    Some(StateFn(lex))
}

fn unexpected_eof(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    let err = l.unexpected_eof();
    l.fail(err)
}

fn hex_escape(l: &mut Json5Lexer<'_>, len: usize) -> Result<u32> {
    let mut code = 0u32;
    for _ in 0..len {
        let digit = l.accept_if("hexadecimal digit", |r| r.is_ascii_hexdigit())?;
        code = code * 16 + digit.to_digit(16).unwrap_or(0);
    }
    Ok(code)
}

/// Reads the four digits of a `\u` escape, and the low half of a surrogate
/// pair when the first escape is a high surrogate.
fn unicode_escape(l: &mut Json5Lexer<'_>) -> Result<char> {
    let mut code = hex_escape(l, 4)?;
    if (0xD800..0xDC00).contains(&code) {
        l.accept_str("\\u")?;
        let low = hex_escape(l, 4)?;
        if (0xDC00..0xE000).contains(&low) {
            code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        }
    }
    char::from_u32(code).ok_or_else(|| {
        Error::syntax_at(
            l.position(),
            format!("invalid unicode escape sequence: {:#x} is not a valid code point", code),
        )
    })
}

fn lex_string(l: &mut Json5Lexer<'_>, delim: char) -> Option<StateFn<State>> {
    let mut val = String::new();
    loop {
        let r = lex_next!(l, unexpected_eof(l));
        match r {
            r if r == delim => break,
            r if is_newline(r) => {
                let err = Error::syntax_at(l.position(), "unexpected newline");
                return l.fail(err);
            }
            '\\' => {
                let next = lex_next!(l, unexpected_eof(l));
                match next {
                    // Line continuations.
                    '\n' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR => {}
                    '\r' => {
                        if lex_try!(l, l.peek_rune()) == Some('\n') {
                            lex_try!(l, l.read_rune());
                        }
                    }
                    'b' => val.push('\u{8}'),
                    'f' => val.push('\u{c}'),
                    'n' => val.push('\n'),
                    'r' => val.push('\r'),
                    't' => val.push('\t'),
                    'v' => val.push('\u{b}'),
                    'x' => {
                        let code = lex_try!(l, hex_escape(l, 2));
                        val.push(char::from_u32(code).unwrap_or_default());
                    }
                    'u' => val.push(lex_try!(l, unicode_escape(l))),
                    '0'..='9' => {
                        let digit_follows = matches!(lex_try!(l, l.peek_rune()), Some('0'..='9'));
                        if next == '0' && !digit_follows {
                            val.push('\0');
                            continue;
                        }
                        let err = Error::syntax_at(
                            l.position(),
                            format!("invalid escape sequence '\\{}'", next),
                        );
                        return l.fail(err);
                    }
                    other => val.push(other),
                }
            }
            r => val.push(r),
        }
    }
    l.emit(TokenKind::String, Some(Literal::String(val)));
    Some(StateFn(lex))
}

fn lex_identifier(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    let mut ident = String::new();
    let mut first = true;
    loop {
        let Some(r) = lex_try!(l, l.read_rune()) else {
            break;
        };
        if !is_identifier_char(r, first) {
            lex_try!(l, l.unread_rune());
            break;
        }
        if r == '\\' {
            lex_try!(l, l.accept_rune('u'));
            let c = lex_try!(l, unicode_escape(l));
            if !is_identifier_char(c, first) || c == '\\' {
                return l.fail_here(format!("invalid identifier character {:?}", c));
            }
            ident.push(c);
        } else {
            ident.push(r);
        }
        first = false;
    }

    let (kind, value) = match l.current() {
        "Infinity" => (TokenKind::Number, Some(Literal::Number(Number::Infinity))),
        "NaN" => (TokenKind::Number, Some(Literal::Number(Number::NaN))),
        "null" => (TokenKind::Nil, None),
        "true" => (TokenKind::Bool, Some(Literal::Bool(true))),
        "false" => (TokenKind::Bool, Some(Literal::Bool(false))),
        _ => (TokenKind::Identifier, Some(Literal::String(ident))),
    };
    l.emit(kind, value);
    Some(StateFn(lex))
}

fn lex_block_comment(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    loop {
        let r = lex_next!(l, unexpected_eof(l));
        if r == '*' && lex_try!(l, l.peek_rune()) == Some('/') {
            lex_try!(l, l.read_rune());
            break;
        }
    }
    let raw = l.current();
    let text = raw[2..raw.len() - 2].trim().to_string();
    l.emit(TokenKind::Comment, Some(Literal::String(text)));
    Some(StateFn(lex))
}

fn lex_hex(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    lex_try!(l, l.accept_while(char::is_alphanumeric));
    let digits = l.current()[2..].to_string();
    match BigInt::parse_bytes(digits.as_bytes(), 16) {
        Some(n) => l.emit(TokenKind::Number, Some(Literal::Number(Number::Integer(n)))),
        None => return l.fail_here(format!("parsing {}: invalid hexadecimal integer", digits)),
    }
    Some(StateFn(lex))
}

fn lex_number(l: &mut Json5Lexer<'_>) -> Option<StateFn<State>> {
    lex_try!(l, l.accept_while(|r| r.is_ascii_digit() || matches!(r, 'e' | 'E' | '+' | '-' | '.')));
    let text = l.current().to_string();
    match Number::parse(&text) {
        Some(n) => l.emit(TokenKind::Number, Some(Literal::Number(n))),
        None => return l.fail_here(format!("parsing '{}': invalid number", text)),
    }
    Some(StateFn(lex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Token;

    fn tokens(input: &str) -> Result<Vec<Token>> {
        let mut lexer = lexer_from_str(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next()?;
            if token.is(TokenKind::Eof) {
                return Ok(out);
            }
            out.push(token);
        }
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokens(input).unwrap().iter().map(|t| t.kind).collect()
    }

    fn single(input: &str) -> Token {
        let mut tokens = tokens(input).unwrap();
        assert_eq!(tokens.len(), 1, "{:?}", tokens);
        tokens.remove(0)
    }

    #[test]
    fn test_raw_text_reproduces_input() {
        let input = "// head\n{\r\n  key: 'v', /* note */ \"n\": -0x1F,\u{2028}\tl: [.5, 5., 1e3,],\n}";
        let joined: String = tokens(input).unwrap().iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_comment_kinds() {
        use TokenKind::*;
        assert_eq!(
            kinds("// a\n  // b\nx // c\n/* d */ // e"),
            vec![
                Comment, Newline, Whitespace, Comment, Newline, Identifier, Whitespace,
                InlineComment, Newline, Comment, Whitespace, Comment
            ]
        );
        assert_eq!(single("/*  spaced\n text */").as_str(), Some("spaced\n text"));
    }

    #[test]
    fn test_numbers() {
        let number = |input: &str| match single(input).value {
            Some(Literal::Number(n)) => n,
            other => panic!("not a number: {:?}", other),
        };
        assert_eq!(number("0"), Number::from(0));
        assert_eq!(number("0x1f"), Number::from(31));
        assert_eq!(number(".5").as_f64(), 0.5);
        assert_eq!(number("5.").as_f64(), 5.0);
        assert_eq!(number("0.25e1").as_f64(), 2.5);
        assert_eq!(number("Infinity"), Number::Infinity);
        assert!(matches!(number("NaN"), Number::NaN));
        let err = tokens("012").unwrap_err();
        assert!(err.to_string().contains("parsing integer: unexpected character '1'"));
    }

    #[test]
    fn test_strings_and_identifiers() {
        assert_eq!(single(r#"'it\'s "ok"'"#).as_str(), Some("it's \"ok\""));
        assert_eq!(single("\"a\\\nb\"").as_str(), Some("ab"));
        assert_eq!(single(r#""é😀\x41\0""#).as_str(), Some("é😀A\0"));
        assert_eq!(single("$_ab\\u0063").as_str(), Some("$_abc"));
        assert!(single("null").is(TokenKind::Nil));
        assert_eq!(single("true").value, Some(Literal::Bool(true)));
        let err = tokens("'open\n'").unwrap_err();
        assert!(err.to_string().contains("unexpected newline"));
        let err = tokens("@").unwrap_err();
        assert!(err.to_string().contains("unexpected character '@'"));
    }
}
