//! Incremental LR parsing runtime.
//!
//! `grove` executes compiled language tables: a context-aware lexer driven by
//! a multi-pattern DFA, a deterministic LR parser with error recovery, and an
//! immutable concrete syntax tree with a tree-sitter style node API.
//!
//! Languages are produced by `grove-gen` and handed to a [`Parser`]:
//!
//! ```ignore
//! let mut parser = grove::Parser::new();
//! parser.set_language(&language)?;
//! let mut tree = parser.parse(text, None)?;
//!
//! let (edit, text) = grove::InputEdit::insert(text, 0, "-- note\n");
//! tree.edit(&edit);
//! let tree = parser.parse(&text, Some(&tree))?;
//! println!("{}", tree.to_sexp());
//! ```

mod cursor;
mod edit;
mod error;
mod language;
mod length;
mod lexer;
mod node;
mod parser;
mod reusable;
mod subtree;
mod tree;

#[cfg(test)]
mod test_language;

pub use crate::cursor::TreeCursor;
pub use crate::edit::InputEdit;
pub use crate::error::{LanguageError, ParseError};
pub use crate::language::{
    FieldId, FieldMapEntry, LANGUAGE_VERSION, Language, LanguageData, LexPattern, LexTable,
    ParseAction, ParseTable, Production, ProductionId, StateId, Symbol, SymbolMetadata,
};
pub use crate::length::{Length, Point, Range};
pub use crate::lexer::{Lexer, LexerStats, Token};
pub use crate::node::Node;
pub use crate::parser::{Parser, ParserStats};
pub use crate::subtree::{FirstLeaf, Subtree};
pub use crate::tree::Tree;
