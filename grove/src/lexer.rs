//! Context-aware lexer runtime.
//!
//! The lexer runs the language's anchored multi-pattern DFA from the current
//! position, collecting every pattern that matches along the way. The parser
//! passes in the set of terminals that are valid in its current state, and
//! the lexer picks the longest match among those. Text matched by skipped
//! extras (whitespace) is folded into the padding of the next token.

use crate::error::ParseError;
use crate::language::{Language, LexPattern, Symbol};
use crate::length::Length;
use regex_automata::{Anchored, Input, dfa::Automaton};
use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
pub struct LexerStats {
    pub tokens: usize,
    pub chars: usize,
    pub matches: usize,
}

/// A lexed token, measured relative to where the lexer started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    /// Skipped text in front of the token.
    pub padding: Length,
    pub size: Length,
    /// Bytes past the token end that the automaton looked at.
    pub lookahead_bytes: usize,
    pub extra: bool,
    pub keyword: bool,
}

#[derive(Debug)]
struct Scan {
    /// `(length, pattern)` for every match, shortest first.
    matches: Vec<(usize, usize)>,
    /// Bytes examined, counting end of input as one.
    examined: usize,
}

pub struct Lexer<'a> {
    language: &'a Language,
    input: &'a [u8],
    pos: Length,
    stats: LexerStats,
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, input: &'a [u8]) -> Self {
        Self {
            language,
            input,
            pos: Length::ZERO,
            stats: LexerStats::default(),
        }
    }

    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }

    /// Absolute position of the next unread byte.
    #[inline]
    pub fn position(&self) -> Length {
        self.pos
    }

    /// Moves to `pos`, e.g. past a subtree reused from an old tree.
    pub fn seek(&mut self, pos: Length) {
        self.pos = pos;
    }

    /// Lexes the next token that is not a skipped extra.
    ///
    /// `valid` is the lex mode of the current parse state. At the end of the
    /// input the end symbol is returned; bytes no pattern accepts come back as
    /// a one-character error token.
    pub fn next_token(&mut self, valid: &[bool]) -> Result<Token, ParseError> {
        let start = self.pos;
        loop {
            let at = self.pos.bytes;
            if at >= self.input.len() {
                self.stats.tokens += 1;
                return Ok(Token {
                    symbol: self.language.end_symbol(),
                    padding: self.pos - start,
                    size: Length::ZERO,
                    lookahead_bytes: 1,
                    extra: false,
                    keyword: false,
                });
            }

            let scan = self.scan(at)?;
            let Some((len, pattern_id)) = self.select(&scan.matches, valid) else {
                let len = utf8_len(self.input[at]).min(self.input.len() - at);
                let text = &self.input[at..at + len];
                log::trace!("UNMATCHED: at={}, text={:?}", at, printable(text));
                let padding = self.pos - start;
                let size = Length::of(text);
                self.pos = self.pos + size;
                self.stats.tokens += 1;
                return Ok(Token {
                    symbol: self.language.error_symbol(),
                    padding,
                    size,
                    lookahead_bytes: scan.examined.saturating_sub(len).max(1),
                    extra: false,
                    keyword: false,
                });
            };

            let pattern = self.language.lex_table().patterns[pattern_id];
            let text = &self.input[at..at + len];
            log::trace!(
                "MATCHED: at={}, pattern={}, symbol={:?}, text={:?}",
                at,
                pattern_id,
                pattern.symbol.and_then(|s| self.language.symbol_name(s)),
                printable(text)
            );

            let size = Length::of(text);
            let Some(symbol) = pattern.symbol else {
                self.pos = self.pos + size;
                continue;
            };
            let padding = self.pos - start;
            self.pos = self.pos + size;
            self.stats.tokens += 1;
            return Ok(Token {
                symbol,
                padding,
                size,
                lookahead_bytes: scan.examined - len,
                extra: pattern.extra,
                keyword: pattern.keyword,
            });
        }
    }

    fn scan(&mut self, at: usize) -> Result<Scan, ParseError> {
        self.stats.matches += 1;
        let dfa = &self.language.lex_table().dfa;
        let input = &self.input[at..];
        let mut state = dfa
            .start_state_forward(&Input::new(input).anchored(Anchored::Yes))
            .map_err(|e| ParseError::Lexer(e.to_string()))?;
        let mut matches = Vec::new();

        // Match states are delayed by one byte: a match state reached after
        // byte `i` reports a match of length `i`.
        let mut i = 0;
        while i < input.len() {
            self.stats.chars += 1;
            state = dfa.next_state(state, input[i]);
            if dfa.is_special_state(state) {
                if dfa.is_match_state(state) {
                    for k in 0..dfa.match_len(state) {
                        matches.push((i, dfa.match_pattern(state, k).as_usize()));
                    }
                } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                    return Ok(Scan {
                        matches,
                        examined: i + 1,
                    });
                }
            }
            i += 1;
        }
        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            for k in 0..dfa.match_len(state) {
                matches.push((i, dfa.match_pattern(state, k).as_usize()));
            }
        }
        Ok(Scan {
            matches,
            examined: input.len() + 1,
        })
    }

    /// Picks the winning `(length, pattern)`.
    ///
    /// Keywords shorter than the word token's match are dropped, so `selected`
    /// stays one identifier. Among the rest, the longest valid match wins and
    /// ties go to the earlier pattern. If nothing is valid, the longest match
    /// is returned anyway and the parser reports the error.
    fn select(&self, matches: &[(usize, usize)], valid: &[bool]) -> Option<(usize, usize)> {
        let lex = self.language.lex_table();
        let word_len = lex.word.and_then(|word| {
            matches
                .iter()
                .filter(|&&(_, p)| lex.patterns[p].symbol == Some(word))
                .map(|&(len, _)| len)
                .max()
        });

        let mut best_valid: Option<(usize, usize)> = None;
        let mut best_any: Option<(usize, usize)> = None;
        for &(len, p) in matches {
            if len == 0 {
                continue;
            }
            let pattern = &lex.patterns[p];
            if pattern.keyword && word_len.is_some_and(|w| len < w) {
                continue;
            }
            if is_valid(pattern, valid) && better(best_valid, len, p) {
                best_valid = Some((len, p));
            }
            if better(best_any, len, p) {
                best_any = Some((len, p));
            }
        }
        best_valid.or(best_any)
    }
}

#[inline]
fn is_valid(pattern: &LexPattern, valid: &[bool]) -> bool {
    pattern.extra
        || pattern
            .symbol
            .is_some_and(|s| valid.get(s as usize).copied().unwrap_or(false))
}

#[inline]
fn better(best: Option<(usize, usize)>, len: usize, p: usize) -> bool {
    match best {
        None => true,
        Some((blen, bp)) => len > blen || (len == blen && p < bp),
    }
}

fn utf8_len(b: u8) -> usize {
    match b {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

pub(crate) fn printable(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(hex::encode(bytes)),
    }
}
