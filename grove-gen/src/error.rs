//! # Compiler Error Types
//!
//! [`GrammarError`] reports problems with the grammar model itself, found
//! while it is flattened into productions. [`CompileError`] covers everything
//! that can go wrong afterwards: lexer automaton construction, unresolved
//! parse table conflicts, and rejection of the finished tables by the runtime.
use crate::lr::Conflict;
use thiserror::Error;

/// The grammar model is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    Empty,

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    #[error("rule `{rule}` refers to undefined symbol `{symbol}`")]
    UndefinedSymbol { rule: String, symbol: String },

    #[error("start rule `{0}` must not be a token")]
    TerminalStartRule(String),

    #[error("word token `{0}` must name a pattern rule")]
    InvalidWord(String),

    #[error("extra `{0}` must be a string, a pattern or a token rule")]
    InvalidExtra(String),

    #[error("token `{0}` matches the empty string")]
    EmptyToken(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("rule `{0}` expands to too many alternatives")]
    TooManyAlternatives(String),
}

/// A grammar could not be compiled into a language.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Building the lexer automaton failed.
    #[error("lexer automaton: {0}")]
    Automaton(String),

    /// Conflicts that precedence and associativity do not resolve.
    #[error("{} unresolved parse table conflict(s)", .0.len())]
    Conflicts(Vec<Conflict>),

    /// More states, symbols or productions than the table layout can index.
    #[error("too many {0} for the table layout")]
    TooLarge(&'static str),

    #[error("compiled tables rejected: {0}")]
    Language(#[from] grove::LanguageError),
}
