//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Grammar compiler for the `grove` runtime.
//!
//! A [`Grammar`](grammar::Grammar) written with the combinators in
//! [`grammar`] is turned into a [`grove::Language`] by [`compile`]:
//!  * **flattening** into numbered BNF productions with field maps,
//!  * **LR(0) / LALR(1) / SLR(1)** table construction with precedence and
//!    associativity resolving ambiguities,
//!  * a **lexer automaton** over all tokens, consulted per parse state so
//!    keywords stay contextual.
//!
//! The [`report`] module dumps the intermediate results in a line-oriented
//! text format for inspection.

pub mod compile;
pub mod error;
pub mod flatten;
pub mod grammar;
pub mod lexgen;
pub mod lr;
pub mod report;
pub mod symtab;

pub use compile::{CompileOptions, Compiled, TableKind, compile};
pub use error::{CompileError, GrammarError};
pub use grammar::Grammar;
