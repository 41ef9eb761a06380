//! Internal helper macros.

/// Unwraps a lexer primitive's result inside a state function, closing the
/// lexer with the error on failure.
macro_rules! lex_try {
    ($lexer:expr, $e:expr) => {
        match $e {
            Ok(value) => value,
            Err(err) => return $lexer.fail(err),
        }
    };
}

/// Reads the next rune inside a state function; the end of input runs
/// `$at_eof`.
macro_rules! lex_next {
    ($lexer:expr, $at_eof:expr) => {
        match $lexer.read_rune() {
            Ok(Some(r)) => r,
            Ok(None) => return $at_eof,
            Err(err) => return $lexer.fail(err),
        }
    };
}
