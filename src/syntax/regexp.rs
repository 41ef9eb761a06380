//! Longest-match regular expressions over a live [`Lexer`] stream.
//!
//! Patterns are parsed with `regex-syntax` and compiled into a small
//! Thompson program. [`Regexp::accept`] runs every thread of that program in
//! lock-step, one rune at a time, straight from the lexer: it reads a rune
//! only while at least one thread can still consume it, and pushes back the
//! single rune that made every thread fail. The consumed text must then be
//! exactly the longest match, otherwise nothing sensible can be tokenized and
//! an error is returned.
//!
//! Capture groups are shared between threads: each group reports the last
//! span any thread recorded for it. Callers that use groups to classify a
//! match must check that a group spans the whole match.

use crate::error::{Error, Result};
use crate::syntax::lexer::Lexer;
use regex_syntax::hir::{Class, Hir, HirKind};
use std::fmt;

#[derive(Clone, Debug)]
enum Inst {
    /// Consume one rune within one of the inclusive ranges.
    Ranges(Vec<(char, char)>, usize),
    /// Fork, preferring the first branch.
    Split(usize, usize),
    Jump(usize),
    /// Record the current offset in a capture slot.
    Save(usize, usize),
    Match,
}

/// A compiled pattern with a human-readable name used in error messages.
#[derive(Clone)]
pub struct Regexp {
    name: String,
    pattern: String,
    prog: Vec<Inst>,
    start: usize,
    slots: usize,
}

struct Compiler {
    prog: Vec<Inst>,
    slots: usize,
}

impl Compiler {
    fn push(&mut self, inst: Inst) -> usize {
        self.prog.push(inst);
        self.prog.len() - 1
    }

    /// Compiles `hir` so that it continues at `next`, and returns its entry.
    fn compile(&mut self, hir: &Hir, next: usize) -> Result<usize> {
        match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => Ok(next),
            HirKind::Literal(lit) => {
                let text = std::str::from_utf8(&lit.0)
                    .map_err(|_| Error::custom("regexp: non UTF-8 literal"))?;
                let mut entry = next;
                for r in text.chars().rev() {
                    entry = self.push(Inst::Ranges(vec![(r, r)], entry));
                }
                Ok(entry)
            }
            HirKind::Class(Class::Unicode(class)) => {
                let ranges = class.ranges().iter().map(|r| (r.start(), r.end())).collect();
                Ok(self.push(Inst::Ranges(ranges, next)))
            }
            HirKind::Class(Class::Bytes(class)) => {
                let ranges = class
                    .ranges()
                    .iter()
                    .map(|r| (char::from(r.start()), char::from(r.end())))
                    .collect();
                Ok(self.push(Inst::Ranges(ranges, next)))
            }
            HirKind::Capture(cap) => {
                let index = cap.index as usize;
                self.slots = self.slots.max(2 * index + 2);
                let close = self.push(Inst::Save(2 * index + 1, next));
                let body = self.compile(&cap.sub, close)?;
                Ok(self.push(Inst::Save(2 * index, body)))
            }
            HirKind::Concat(subs) => {
                let mut entry = next;
                for sub in subs.iter().rev() {
                    entry = self.compile(sub, entry)?;
                }
                Ok(entry)
            }
            HirKind::Alternation(subs) => {
                let mut iter = subs.iter().rev();
                let mut entry = match iter.next() {
                    Some(last) => self.compile(last, next)?,
                    None => return Ok(next),
                };
                for sub in iter {
                    let branch = self.compile(sub, next)?;
                    entry = self.push(Inst::Split(branch, entry));
                }
                Ok(entry)
            }
            HirKind::Repetition(rep) => {
                let fork = |body: usize, skip: usize| {
                    if rep.greedy {
                        Inst::Split(body, skip)
                    } else {
                        Inst::Split(skip, body)
                    }
                };
                let mut entry = match rep.max {
                    None => {
                        let hole = self.push(Inst::Match);
                        let body = self.compile(&rep.sub, hole)?;
                        self.prog[hole] = fork(body, next);
                        hole
                    }
                    Some(max) => {
                        let mut entry = next;
                        for _ in rep.min..max {
                            let body = self.compile(&rep.sub, entry)?;
                            entry = self.push(fork(body, next));
                        }
                        entry
                    }
                };
                for _ in 0..rep.min {
                    entry = self.compile(&rep.sub, entry)?;
                }
                Ok(entry)
            }
        }
    }
}

impl Regexp {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        let hir = regex_syntax::Parser::new()
            .parse(pattern)
            .map_err(|e| Error::custom(format!("regexp {}: {}", name, e)))?;
        let mut compiler = Compiler {
            prog: Vec::new(),
            slots: 2,
        };
        let done = compiler.push(Inst::Match);
        let close = compiler.push(Inst::Save(1, done));
        let body = compiler.compile(&hir, close)?;
        let start = compiler.push(Inst::Save(0, body));
        Ok(Regexp {
            name: name.to_string(),
            pattern: pattern.to_string(),
            prog: compiler.prog,
            start,
            slots: compiler.slots,
        })
    }

    /// Returns the name given at compilation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source pattern.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Number of capture groups, including the implicit group 0.
    pub fn group_count(&self) -> usize {
        self.slots / 2
    }

    /// Follows non-consuming instructions from `pc`, collecting the threads
    /// that wait for a rune.
    fn add_thread(&self, step: &mut Step<'_>, pc: usize, offset: usize) {
        let mut stack = vec![pc];
        while let Some(pc) = stack.pop() {
            if std::mem::replace(&mut step.seen[pc], true) {
                continue;
            }
            match &self.prog[pc] {
                Inst::Jump(next) => stack.push(*next),
                Inst::Split(first, second) => {
                    stack.push(*second);
                    stack.push(*first);
                }
                Inst::Save(slot, next) => {
                    step.captures[*slot] = Some(offset);
                    stack.push(*next);
                }
                Inst::Match => *step.matched = Some(offset),
                Inst::Ranges(..) => step.threads.push(pc),
            }
        }
    }

    /// Consumes the longest match from the lexer and returns the capture
    /// groups, group 0 being the whole match. Unmatched groups are empty.
    ///
    /// # Errors
    ///
    /// Fails if the runes read do not form a match, if the input ends before
    /// any match, or if the lexer itself fails.
    pub fn accept<S>(&self, l: &mut Lexer<'_, S>) -> Result<Vec<String>> {
        let mut captures: Vec<Option<usize>> = vec![None; self.slots];
        let mut matched = None;
        let mut seen = vec![false; self.prog.len()];
        let mut threads = Vec::new();
        self.add_thread(
            &mut Step {
                seen: &mut seen,
                captures: &mut captures,
                matched: &mut matched,
                threads: &mut threads,
            },
            self.start,
            0,
        );

        let mut text = String::new();
        let mut at_eof = false;
        while !threads.is_empty() {
            let r = match l.read_rune()? {
                Some(r) => r,
                None => {
                    at_eof = true;
                    break;
                }
            };
            let offset = text.len() + r.len_utf8();
            seen.iter_mut().for_each(|s| *s = false);
            let mut next = Vec::new();
            for &pc in &threads {
                if let Inst::Ranges(ranges, out) = &self.prog[pc] {
                    if ranges.iter().any(|&(lo, hi)| lo <= r && r <= hi) {
                        self.add_thread(
                            &mut Step {
                                seen: &mut seen,
                                captures: &mut captures,
                                matched: &mut matched,
                                threads: &mut next,
                            },
                            *out,
                            offset,
                        );
                    }
                }
            }
            if next.is_empty() {
                l.unread_rune()?;
                break;
            }
            text.push(r);
            threads = next;
        }

        match matched {
            Some(end) if end == text.len() => Ok((0..self.group_count())
                .map(|group| match (captures[2 * group], captures[2 * group + 1]) {
                    (Some(start), Some(end)) if start <= end && end <= text.len() => {
                        text[start..end].to_string()
                    }
                    _ => String::new(),
                })
                .collect()),
            None if at_eof => Err(Error::syntax_at(
                l.token_position(),
                format!(
                    "character sequence {:?} does not match {}: unexpected end of file",
                    text, self.name
                ),
            )),
            _ => Err(Error::syntax_at(
                l.token_position(),
                format!("character sequence {:?} does not match {}", text, self.name),
            )),
        }
    }
}

struct Step<'a> {
    seen: &'a mut [bool],
    captures: &'a mut [Option<usize>],
    matched: &'a mut Option<usize>,
    threads: &'a mut Vec<usize>,
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.pattern)
    }
}

impl fmt::Display for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::StateFn;

    fn idle(_: &mut Lexer<'_, ()>) -> Option<StateFn<()>> {
        None
    }

    fn run(pattern: &str, input: &str) -> (Result<Vec<String>>, String) {
        let re = Regexp::new("test", pattern).unwrap();
        let mut lexer = Lexer::from_str(input, StateFn(idle), ());
        let groups = re.accept(&mut lexer);
        let mut rest = String::new();
        while let Ok(Some(r)) = lexer.read_rune() {
            rest.push(r);
        }
        (groups, rest)
    }

    #[test]
    fn test_longest_match_leaves_rest_unread() {
        let (groups, rest) = run("[0-9]+", "1234 = x");
        assert_eq!(groups.unwrap(), vec!["1234"]);
        assert_eq!(rest, " = x");
    }

    #[test]
    fn test_groups_are_shared_between_threads() {
        let (groups, _) = run("([0-9]+)|([0-9]+-[0-9]+)", "12-34,");
        let groups = groups.unwrap();
        assert_eq!(groups[0], "12-34");
        assert_eq!(groups[1], "12");
        assert_eq!(groups[2], "12-34");
    }

    #[test]
    fn test_partial_match_is_an_error() {
        let (groups, _) = run("ab|abcd", "abcx");
        let err = groups.unwrap_err();
        assert!(err
            .to_string()
            .contains(r#"character sequence "abc" does not match test"#));
    }

    #[test]
    fn test_eof_without_match() {
        let (groups, _) = run("abc", "ab");
        assert!(groups.unwrap_err().to_string().contains("unexpected end of file"));
    }

    #[test]
    fn test_bounded_repetition() {
        let (groups, rest) = run("[0-9]{2}:[0-9]{2}", "07:32:00");
        assert_eq!(groups.unwrap(), vec!["07:32"]);
        assert_eq!(rest, ":00");
        let (groups, _) = run("x{1,3}", "xxxxx");
        assert_eq!(groups.unwrap(), vec!["xxx"]);
    }
}
