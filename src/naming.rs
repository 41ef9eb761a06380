//! Naming conventions for document keys.
//!
//! Rust field names are turned into document keys by a [`NamingConvention`].
//! A name is first split into words, then the words are re-cased and joined
//! the way the convention wants:
//!
//! ```rust
//! use serde_boa::NamingConvention;
//!
//! assert_eq!(NamingConvention::KebabCase.format("FirstName"), "first-name");
//! assert_eq!(NamingConvention::CamelCase.format("first_name"), "firstName");
//! assert_eq!(NamingConvention::ScreamingSnakeCase.format("httpServer2"), "HTTP_SERVER_2");
//! ```
//!
//! Words are separated by `_`, `-` and spaces, and start at a change between
//! digits and non-digits, at a lower-case letter followed by an upper-case
//! one, and at an upper-case letter followed by a lower-case one (so
//! `HTTPServer` is `HTTP` and `Server`).

use std::fmt;

/// A rule turning identifiers into document keys.
#[derive(Clone, Copy)]
pub enum NamingConvention {
    /// `camelCase`
    CamelCase,
    /// `PascalCase`
    PascalCase,
    /// `snake_case`
    SnakeCase,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnakeCase,
    /// `kebab-case`
    KebabCase,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebabCase,
    /// `camel_Snake_Case`
    CamelSnakeCase,
    /// `Pascal_Snake_Case`
    PascalSnakeCase,
    /// `Train-Case`
    TrainCase,
    /// `flatcase`
    FlatCase,
    /// `UPPERFLATCASE`
    UpperFlatCase,
    /// A caller-supplied conversion.
    Custom(fn(&str) -> String),
}

const CONVENTIONS: [NamingConvention; 11] = [
    NamingConvention::CamelCase,
    NamingConvention::PascalCase,
    NamingConvention::SnakeCase,
    NamingConvention::ScreamingSnakeCase,
    NamingConvention::KebabCase,
    NamingConvention::ScreamingKebabCase,
    NamingConvention::CamelSnakeCase,
    NamingConvention::PascalSnakeCase,
    NamingConvention::TrainCase,
    NamingConvention::FlatCase,
    NamingConvention::UpperFlatCase,
];

#[derive(Clone, Copy, PartialEq)]
enum Case {
    Lower,
    Upper,
    /// Capitalized words, the first one lower-cased.
    Camel,
    /// Capitalized words.
    Pascal,
}

/// Splits an identifier into words.
///
/// ```rust
/// use serde_boa::naming::split_words;
///
/// assert_eq!(split_words("parseHTTPResponse2xx"), vec!["parse", "HTTP", "Response", "2", "xx"]);
/// assert_eq!(split_words("__max_retries"), vec!["max", "retries"]);
/// ```
#[must_use]
pub fn split_words(ident: &str) -> Vec<String> {
    let chars: Vec<char> = ident.chars().collect();
    let mut words = Vec::new();
    let mut word = String::new();
    for (i, &r) in chars.iter().enumerate() {
        if matches!(r, '_' | '-' | ' ') {
            if !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            continue;
        }
        if let Some(&prev) = word.chars().last().as_ref() {
            let next = chars.get(i + 1).copied();
            let boundary = prev.is_ascii_digit() != r.is_ascii_digit()
                || (prev.is_lowercase() && r.is_uppercase())
                || (prev.is_uppercase() && r.is_uppercase() && next.map_or(false, char::is_lowercase));
            if boundary {
                words.push(std::mem::take(&mut word));
            }
        }
        word.push(r);
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

fn capitalize(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
    }
    let rest = chars.as_str();
    // Acronyms stay upper-case.
    if word.chars().count() > 1 && word.chars().all(|c| !c.is_lowercase()) {
        out.push_str(rest);
    } else {
        out.push_str(&rest.to_lowercase());
    }
}

impl NamingConvention {
    /// Looks up a convention by its own spelling, e.g. `"kebab-case"`.
    ///
    /// ```rust
    /// use serde_boa::NamingConvention;
    ///
    /// let naming = NamingConvention::by_name("Train-Case").unwrap();
    /// assert_eq!(naming.format("max_idle_conns"), "Max-Idle-Conns");
    /// assert!(NamingConvention::by_name("sPoNgEcAsE").is_none());
    /// ```
    #[must_use]
    pub fn by_name(name: &str) -> Option<NamingConvention> {
        CONVENTIONS.iter().copied().find(|c| c.name() == name)
    }

    /// The convention's name, spelled in the convention itself.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            NamingConvention::CamelCase => "camelCase",
            NamingConvention::PascalCase => "PascalCase",
            NamingConvention::SnakeCase => "snake_case",
            NamingConvention::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
            NamingConvention::KebabCase => "kebab-case",
            NamingConvention::ScreamingKebabCase => "SCREAMING-KEBAB-CASE",
            NamingConvention::CamelSnakeCase => "camel_Snake_Case",
            NamingConvention::PascalSnakeCase => "Pascal_Snake_Case",
            NamingConvention::TrainCase => "Train-Case",
            NamingConvention::FlatCase => "flatcase",
            NamingConvention::UpperFlatCase => "UPPERFLATCASE",
            NamingConvention::Custom(_) => "custom",
        }
    }

    const fn rule(&self) -> (Case, &'static str) {
        match self {
            NamingConvention::CamelCase => (Case::Camel, ""),
            NamingConvention::PascalCase => (Case::Pascal, ""),
            NamingConvention::SnakeCase => (Case::Lower, "_"),
            NamingConvention::ScreamingSnakeCase => (Case::Upper, "_"),
            NamingConvention::KebabCase => (Case::Lower, "-"),
            NamingConvention::ScreamingKebabCase => (Case::Upper, "-"),
            NamingConvention::CamelSnakeCase => (Case::Camel, "_"),
            NamingConvention::PascalSnakeCase => (Case::Pascal, "_"),
            NamingConvention::TrainCase => (Case::Pascal, "-"),
            NamingConvention::FlatCase | NamingConvention::Custom(_) => (Case::Lower, ""),
            NamingConvention::UpperFlatCase => (Case::Upper, ""),
        }
    }

    /// Converts an identifier to this convention.
    #[must_use]
    pub fn format(&self, ident: &str) -> String {
        if let NamingConvention::Custom(f) = self {
            return f(ident);
        }
        let (case, sep) = self.rule();
        let mut out = String::with_capacity(ident.len() + 4);
        for (i, word) in split_words(ident).iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            match case {
                Case::Lower => out.push_str(&word.to_lowercase()),
                Case::Upper => out.push_str(&word.to_uppercase()),
                Case::Camel if i == 0 => out.push_str(&word.to_lowercase()),
                Case::Camel | Case::Pascal => capitalize(word, &mut out),
            }
        }
        out
    }
}

impl fmt::Debug for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
