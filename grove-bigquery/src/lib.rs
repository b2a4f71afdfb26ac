//! BigQuery SQL grammar for the `grove` incremental parser.
//!
//! ```no_run
//! let language = grove_bigquery::language().expect("Error loading BigQuery grammar");
//! let mut parser = grove::Parser::new();
//! parser.set_language(&language).expect("Error loading BigQuery grammar");
//! let tree = parser.parse("SELECT a FROM t", None).unwrap();
//! assert_eq!(tree.root_node().kind(), "source_file");
//! ```
//!
//! The grammar is compiled the first time [`language`] is called; every
//! later call hands out the same compiled tables.

pub mod grammar;

use grove::Language;
use grove_gen::{CompileError, CompileOptions, Grammar, compile};
use once_cell::sync::Lazy;
use thiserror::Error;

/// The BigQuery grammar could not be turned into a usable language.
#[derive(Debug, Clone, Error)]
#[error("Error loading BigQuery grammar: {0}")]
pub struct LoadError(String);

impl From<CompileError> for LoadError {
    fn from(e: CompileError) -> Self {
        LoadError(e.to_string())
    }
}

static LANGUAGE: Lazy<Result<Language, LoadError>> = Lazy::new(|| {
    let options = CompileOptions {
        strict: false,
        ..CompileOptions::default()
    };
    let compiled = compile(&grammar::bigquery(), &options)?;
    log::debug!(
        "BigQuery grammar loaded: {} states, {} conflicts",
        compiled.language.state_count(),
        compiled.conflicts.len()
    );
    Ok(compiled.language)
});

/// Returns the compiled BigQuery language.
pub fn language() -> Result<Language, LoadError> {
    (*LANGUAGE).clone()
}

/// The BigQuery grammar model.
pub fn grammar() -> Grammar {
    grammar::bigquery()
}
