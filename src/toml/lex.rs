//! TOML tokenizer.
//!
//! Numbers, dates and bare keys overlap heavily (`1979-05-27` is both a date
//! and a valid key), so any run starting with a sign, an underscore or a
//! digit is matched against a single longest-match regular expression and
//! classified by the capture group that spans the whole match.

use crate::datetime::Datetime;
use crate::error::{Error, Result};
use crate::number::Number;
use crate::syntax::{Lexer, Literal, Regexp, StateFn, TokenKind};
use std::io::BufRead;
use std::sync::OnceLock;

const RINTEGER: &str =
    r"(?:(?:0(?:b[01][01_]*|o[0-7][0-7_]*|x[0-9a-fA-F][0-9a-fA-F_]*)?)|[-+]?[1-9][0-9_]*)";
const RDATE: &str = r"(?:[0-9]+-[0-9]+-[0-9]+)";
const RTIME: &str = r"(?:[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)";
const RKEY: &str = r"([a-zA-Z0-9_-]+)";

fn ndk_pattern() -> String {
    let number = format!(
        r"({}|[-+]?(?:inf|nan|(?:0|[1-9][0-9_]*)(?:\.[0-9][0-9_]*)?(?:[eE][-+]?[0-9][0-9_]*)?))",
        RINTEGER
    );
    let datetime = format!(
        r"({date}[ ]?|{time}|{date}[tT ]{time}(?:[zZ]|[zZ+-][0-9]{{2}}:[0-9]{{2}})?)",
        date = RDATE,
        time = RTIME
    );
    format!(r"(?m:^(?:{}|{}|{}))", number, datetime, RKEY)
}

fn ndk_regexp() -> Result<&'static Regexp> {
    static NDK: OnceLock<Result<Regexp>> = OnceLock::new();
    NDK.get_or_init(|| Regexp::new("number, date, or key", &ndk_pattern()))
        .as_ref()
        .map_err(Clone::clone)
}

pub(crate) fn lexer_from_str(input: &str) -> Lexer<'_, ()> {
    Lexer::from_str(input, StateFn(lex), ())
}

pub(crate) fn lexer_from_reader<'a, R: BufRead + 'a>(reader: R) -> Lexer<'a, ()> {
    Lexer::from_reader(reader, StateFn(lex), ())
}

#[inline]
fn is_space(r: char) -> bool {
    r == ' ' || r == '\t'
}

#[inline]
fn is_bad_control(r: char) -> bool {
    matches!(r, '\u{0}'..='\u{8}' | '\u{b}'..='\u{1f}' | '\u{7f}')
}

#[inline]
pub(crate) fn is_identifier_char(r: char) -> bool {
    r.is_ascii_alphanumeric() || r == '_' || r == '-'
}

fn lex(l: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
    let r = lex_next!(l, l.eof());
    match r {
        ' ' | '\t' => {
            lex_try!(l, l.accept_while(is_space));
            l.emit(TokenKind::Whitespace, None);
        }
        '{' => l.emit(TokenKind::LBrace, None),
        '}' => l.emit(TokenKind::RBrace, None),
        '[' => {
            if lex_try!(l, l.peek_rune()) == Some('[') {
                lex_try!(l, l.read_rune());
                l.emit(TokenKind::DoubleLSquare, None);
            } else {
                l.emit(TokenKind::LSquare, None);
            }
        }
        ']' => {
            if lex_try!(l, l.peek_rune()) == Some(']') {
                lex_try!(l, l.read_rune());
                l.emit(TokenKind::DoubleRSquare, None);
            } else {
                l.emit(TokenKind::RSquare, None);
            }
        }
        '=' => l.emit(TokenKind::Equal, None),
        '.' => l.emit(TokenKind::Dot, None),
        ',' => l.emit(TokenKind::Comma, None),
        '"' | '\'' => return lex_string(l, r),
        '\r' => match lex_try!(l, l.peek_rune()) {
            Some('\n') => {
                lex_try!(l, l.read_rune());
                l.emit(TokenKind::Newline, None);
            }
            _ => return l.fail_here("unexpected character '\\r': expected LF after CR"),
        },
        '\n' => l.emit(TokenKind::Newline, None),
        '#' => return lex_comment(l),
        '+' | '-' | '_' | '0'..='9' => {
            lex_try!(l, l.unread_rune());
            return lex_number_date_or_key(l);
        }
        r if is_identifier_char(r) => return lex_identifier(l),
        r => return l.fail_here(format!("unexpected character {:?}", r)),
    }
    Some(StateFn(lex))
}

fn lex_comment(l: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
    lex_try!(l, l.accept_while(|r| r != '\n' && !is_bad_control(r)));
    match lex_try!(l, l.peek_rune()) {
        None | Some('\n') | Some('\r') => {}
        Some(r) => {
            let err = Error::syntax_at(
                l.next_position(),
                format!("invalid character {:?} in comment", r),
            );
            return l.fail(err);
        }
    }
    let text = l.current().strip_prefix('#').unwrap_or_default().trim().to_string();
    l.emit(TokenKind::Comment, Some(Literal::String(text)));
    Some(StateFn(lex))
}

fn lex_identifier(l: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
    lex_try!(l, l.accept_while(is_identifier_char));
    let (kind, value) = match l.current() {
        "inf" => (TokenKind::Number, Literal::Number(Number::Infinity)),
        "nan" => (TokenKind::Number, Literal::Number(Number::NaN)),
        "true" => (TokenKind::Bool, Literal::Bool(true)),
        "false" => (TokenKind::Bool, Literal::Bool(false)),
        ident => (TokenKind::Identifier, Literal::String(ident.to_string())),
    };
    l.emit(kind, Some(value));
    Some(StateFn(lex))
}

fn lex_number_date_or_key(l: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
    let re = lex_try!(l, ndk_regexp());
    let groups = lex_try!(l, l.accept_regex(re));
    let Ok([whole, mut number, mut datetime, mut key]) = <[String; 4]>::try_from(groups) else {
        return l.fail_here("number, date, or key: unexpected capture groups");
    };
    // Groups that do not span the whole match belong to a shorter
    // alternative.
    for group in [&mut number, &mut datetime, &mut key] {
        if group.len() != whole.len() {
            group.clear();
        }
    }

    if !number.is_empty() {
        match Number::parse(&number) {
            Some(n) => l.emit(TokenKind::Number, Some(Literal::Number(n))),
            None => return l.fail_here(format!("parsing '{}': invalid number", number)),
        }
    } else if !datetime.is_empty() {
        match Datetime::parse(&datetime) {
            Ok(dt) => l.emit(TokenKind::DateTime, Some(Literal::DateTime(dt))),
            Err(e) => return l.fail_here(format!("invalid datetime {:?}: {}", datetime, e)),
        }
    } else if !key.is_empty() {
        l.emit(TokenKind::Identifier, Some(Literal::String(key)));
    } else {
        return l.fail_here(format!(
            "character sequence {:?} does not match number, date, or key",
            whole
        ));
    }
    Some(StateFn(lex))
}

fn unexpected_eof(l: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
    let err = l.unexpected_eof();
    l.fail(err)
}

fn unicode_escape(l: &mut Lexer<'_, ()>, len: usize) -> Result<char> {
    let mut code = 0u32;
    for _ in 0..len {
        let digit = l.accept_if("hexadecimal digit", |r| r.is_ascii_hexdigit())?;
        code = code * 16 + digit.to_digit(16).unwrap_or(0);
    }
    char::from_u32(code).ok_or_else(|| {
        Error::syntax_at(
            l.position(),
            format!("invalid unicode escape sequence: {:#x} is not a valid code point", code),
        )
    })
}

/// Skips the whitespace and newlines following a line-ending backslash. `r`
/// is the rune right after the backslash.
fn line_ending_backslash(l: &mut Lexer<'_, ()>, r: char) -> Result<()> {
    let mut r = r;
    if is_space(r) {
        l.accept_while(is_space)?;
        r = l.read_rune()?.ok_or_else(|| l.unexpected_eof())?;
    }
    match r {
        '\n' => {}
        '\r' => l.accept_rune('\n')?,
        _ => {
            return Err(Error::syntax_at(
                l.position(),
                "a line-ending backslash can only be followed by whitespace until the end of the line",
            ))
        }
    }
    l.accept_while(|r| is_space(r) || r == '\n' || r == '\r')?;
    Ok(())
}

fn lex_string(l: &mut Lexer<'_, ()>, delim: char) -> Option<StateFn<()>> {
    let literal = delim == '\'';
    let mut multiline = false;
    let mut val = String::new();

    let r = lex_next!(l, unexpected_eof(l));
    if r == delim {
        match lex_try!(l, l.peek_rune()) {
            Some(next) if next == delim => {
                lex_try!(l, l.read_rune());
                multiline = true;
            }
            _ => {
                l.emit(TokenKind::String, Some(Literal::String(val)));
                return Some(StateFn(lex));
            }
        }
    } else {
        lex_try!(l, l.unread_rune());
    }

    let mut first = true;
    loop {
        let r = lex_next!(l, unexpected_eof(l));
        match r {
            r if r == delim => {
                if !multiline {
                    break;
                }
                let mut count = 1;
                while count < 5 {
                    match lex_try!(l, l.peek_rune()) {
                        Some(next) if next == delim => {
                            lex_try!(l, l.read_rune());
                            count += 1;
                        }
                        _ => break,
                    }
                }
                if count >= 3 {
                    val.extend(std::iter::repeat(delim).take(count - 3));
                    break;
                }
                val.extend(std::iter::repeat(delim).take(count));
            }
            '\n' | '\r' => {
                if !multiline {
                    let err = Error::syntax_at(l.position(), "unexpected newline");
                    return l.fail(err);
                }
                if r == '\r' {
                    lex_try!(l, l.accept_rune('\n'));
                }
                // The newline right after the opening delimiter is trimmed.
                if !first {
                    val.push_str(if r == '\r' { "\r\n" } else { "\n" });
                }
            }
            '\\' if !literal => {
                let next = lex_next!(l, unexpected_eof(l));
                match next {
                    '\\' | '"' => val.push(next),
                    'b' => val.push('\u{8}'),
                    'f' => val.push('\u{c}'),
                    'n' => val.push('\n'),
                    'r' => val.push('\r'),
                    't' => val.push('\t'),
                    'u' => val.push(lex_try!(l, unicode_escape(l, 4))),
                    'U' => val.push(lex_try!(l, unicode_escape(l, 8))),
                    ' ' | '\t' | '\n' | '\r' if multiline => {
                        lex_try!(l, line_ending_backslash(l, next));
                    }
                    other => {
                        let err = Error::syntax_at(
                            l.position(),
                            format!("invalid escape sequence '\\{}'", other),
                        );
                        return l.fail(err);
                    }
                }
            }
            r if is_bad_control(r) => {
                let err = Error::syntax_at(l.position(), format!("invalid character {:?}", r));
                return l.fail(err);
            }
            r => val.push(r),
        }
        first = false;
    }
    l.emit(TokenKind::String, Some(Literal::String(val)));
    Some(StateFn(lex))
}
