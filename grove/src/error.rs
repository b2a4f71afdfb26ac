//! # Runtime Error Types
//!
//! [`LanguageError`] is returned when a compiled language handle is rejected,
//! either while it is being constructed or when it is handed to a parser.
//! [`ParseError`] covers the few ways a parse itself can fail. Syntax errors
//! are not among them: malformed input always produces a tree, with the
//! offending regions wrapped in `ERROR` nodes.
use thiserror::Error;

/// A compiled language could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    /// The table layout was produced for a different runtime version.
    #[error("incompatible language version {found} (expected {expected})")]
    IncompatibleVersion { found: u32, expected: u32 },

    /// The tables are internally inconsistent.
    #[error("corrupt language data: {0}")]
    Corrupt(String),
}

/// A parse could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `parse` was called before a language was assigned.
    #[error("no language assigned to parser")]
    NoLanguage,

    /// The lexer automaton refused to start.
    #[error("lexer error: {0}")]
    Lexer(String),

    /// The parse tables drove the engine into an impossible state.
    #[error("internal parser error: {0}")]
    Internal(String),
}
