//! Compiled language handles.
//!
//! A [`Language`] bundles everything the runtime needs to parse one grammar:
//! symbol metadata, productions with their field maps, the LR action table,
//! the lexer automaton and the per-state lex modes. Handles are cheap to
//! clone and can be shared freely between threads.
//!
//! Symbols are numbered the way the table compiler lays them out:
//! nonterminals first (symbol `0` is the augmented start symbol), then
//! terminals, with the end-of-input terminal last. The error symbol sits just
//! past the table and never has an action.

use crate::error::LanguageError;
use regex_automata::dfa::{Automaton, dense};
use smartstring::alias::String;
use std::fmt;
use std::sync::Arc;

pub type Symbol = u16;
pub type StateId = u16;
pub type ProductionId = u16;
pub type FieldId = u16;

/// Table layout version understood by this runtime.
pub const LANGUAGE_VERSION: u32 = 1;

/// A single entry of the parse table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseAction {
    Error,
    Accept,
    Shift(StateId),
    Reduce(ProductionId),
    Goto(StateId),
}

impl ParseAction {
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ParseAction::Error)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub name: String,
    /// Visible symbols appear as nodes in the public tree.
    pub visible: bool,
    /// Named symbols come from grammar rules; anonymous ones from string literals.
    pub named: bool,
}

/// Associates a field with a structural child of a production.
///
/// Structural indices skip extras (comments, error regions) that were
/// attached to the node while it was being built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMapEntry {
    pub child_index: u16,
    pub field_id: FieldId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub child_count: u16,
    pub fields: Vec<FieldMapEntry>,
}

impl Production {
    pub fn field_for_child(&self, child_index: usize) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|e| e.child_index as usize == child_index)
            .map(|e| e.field_id)
    }
}

/// Dense LR action table, one row per state and one column per symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTable {
    pub state_count: usize,
    pub symbol_count: usize,
    pub actions: Vec<ParseAction>,
}

impl ParseTable {
    /// Looks up the action for `symbol` in `state`.
    ///
    /// Anything outside the table, including the error symbol, is an error.
    #[inline]
    pub fn action(&self, state: StateId, symbol: Symbol) -> ParseAction {
        let (state, symbol) = (state as usize, symbol as usize);
        if state >= self.state_count || symbol >= self.symbol_count {
            return ParseAction::Error;
        }
        self.actions[state * self.symbol_count + symbol]
    }
}

/// What a lexer pattern produces when it wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexPattern {
    /// The terminal produced, or `None` for skipped text such as whitespace.
    pub symbol: Option<Symbol>,
    /// Extras are valid everywhere and never change the parse state.
    pub extra: bool,
    /// A string terminal that the word token would also match.
    pub keyword: bool,
}

#[derive(Clone, Debug)]
pub struct LexTable {
    /// Anchored multi-pattern DFA; pattern `i` is described by `patterns[i]`.
    pub dfa: dense::DFA<Vec<u32>>,
    pub patterns: Vec<LexPattern>,
    /// The identifier-like token that keywords are carved out of.
    pub word: Option<Symbol>,
}

/// Raw tables of a compiled language.
#[derive(Clone, Debug)]
pub struct LanguageData {
    pub name: String,
    pub version: u32,
    pub symbols: Vec<SymbolMetadata>,
    pub nonterminal_count: usize,
    /// Field names; field id `i` names `field_names[i - 1]`.
    pub field_names: Vec<String>,
    pub productions: Vec<Production>,
    pub table: ParseTable,
    pub lex: LexTable,
    /// Valid-terminal sets, indexed by symbol.
    pub lex_modes: Vec<Vec<bool>>,
    /// Lex mode of every parse state.
    pub state_lex_modes: Vec<u16>,
    pub start_state: StateId,
}

/// A validated, shareable handle to compiled language tables.
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

impl Language {
    /// Validates `data` and wraps it into a handle.
    pub fn new(data: LanguageData) -> Result<Self, LanguageError> {
        validate(&data)?;
        log::debug!(
            "language {:?}: {} symbols, {} productions, {} states, {} lex modes",
            data.name,
            data.symbols.len(),
            data.productions.len(),
            data.table.state_count,
            data.lex_modes.len()
        );
        Ok(Self(Arc::new(data)))
    }

    pub fn data(&self) -> &LanguageData {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn version(&self) -> u32 {
        self.0.version
    }

    /// Do both handles point at the same compiled tables?
    pub fn ptr_eq(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn symbol_count(&self) -> usize {
        self.0.symbols.len()
    }

    pub fn state_count(&self) -> usize {
        self.0.table.state_count
    }

    pub fn nonterminal_count(&self) -> usize {
        self.0.nonterminal_count
    }

    #[inline]
    pub fn end_symbol(&self) -> Symbol {
        (self.0.symbols.len() - 1) as Symbol
    }

    #[inline]
    pub fn error_symbol(&self) -> Symbol {
        self.0.symbols.len() as Symbol
    }

    #[inline]
    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        (symbol as usize) >= self.0.nonterminal_count
    }

    pub fn symbol_name(&self, symbol: Symbol) -> Option<&str> {
        if symbol == self.error_symbol() {
            return Some("ERROR");
        }
        self.0.symbols.get(symbol as usize).map(|m| m.name.as_str())
    }

    pub fn symbol_is_named(&self, symbol: Symbol) -> bool {
        symbol == self.error_symbol()
            || self.0.symbols.get(symbol as usize).is_some_and(|m| m.named)
    }

    pub fn symbol_is_visible(&self, symbol: Symbol) -> bool {
        symbol == self.error_symbol()
            || self.0.symbols.get(symbol as usize).is_some_and(|m| m.visible)
    }

    /// Finds the symbol for a node kind, e.g. `("identifier", true)`.
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<Symbol> {
        if named && kind == "ERROR" {
            return Some(self.error_symbol());
        }
        self.0
            .symbols
            .iter()
            .position(|m| m.visible && m.named == named && m.name.as_str() == kind)
            .map(|i| i as Symbol)
    }

    pub fn field_count(&self) -> usize {
        self.0.field_names.len()
    }

    pub fn field_name_for_id(&self, id: FieldId) -> Option<&str> {
        let idx = (id as usize).checked_sub(1)?;
        self.0.field_names.get(idx).map(|s| s.as_str())
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.0
            .field_names
            .iter()
            .position(|f| f.as_str() == name)
            .map(|i| (i + 1) as FieldId)
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.0.productions.get(id as usize)
    }

    #[inline]
    pub fn action(&self, state: StateId, symbol: Symbol) -> ParseAction {
        self.0.table.action(state, symbol)
    }

    #[inline]
    pub fn lex_mode_for_state(&self, state: StateId) -> u16 {
        self.0.state_lex_modes[state as usize]
    }

    #[inline]
    pub fn lex_mode(&self, mode: u16) -> &[bool] {
        &self.0.lex_modes[mode as usize]
    }

    pub fn start_state(&self) -> StateId {
        self.0.start_state
    }

    pub(crate) fn lex_table(&self) -> &LexTable {
        &self.0.lex
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.0.name)
            .field("version", &self.0.version)
            .field("symbols", &self.0.symbols.len())
            .field("states", &self.0.table.state_count)
            .finish()
    }
}

fn corrupt(msg: impl Into<std::string::String>) -> LanguageError {
    LanguageError::Corrupt(msg.into())
}

fn validate(data: &LanguageData) -> Result<(), LanguageError> {
    if data.version != LANGUAGE_VERSION {
        return Err(LanguageError::IncompatibleVersion {
            found: data.version,
            expected: LANGUAGE_VERSION,
        });
    }

    let n_sym = data.symbols.len();
    if n_sym < 2 || n_sym >= Symbol::MAX as usize {
        return Err(corrupt(format!("bad symbol count {}", n_sym)));
    }
    if data.nonterminal_count == 0 || data.nonterminal_count >= n_sym {
        return Err(corrupt(format!(
            "bad nonterminal count {} of {} symbols",
            data.nonterminal_count, n_sym
        )));
    }

    let table = &data.table;
    if table.symbol_count != n_sym {
        return Err(corrupt(format!(
            "table has {} columns, expected {}",
            table.symbol_count, n_sym
        )));
    }
    if table.state_count == 0 || table.actions.len() != table.state_count * table.symbol_count {
        return Err(corrupt(format!(
            "table has {} entries for {} states",
            table.actions.len(),
            table.state_count
        )));
    }
    if data.start_state as usize >= table.state_count {
        return Err(corrupt(format!("bad start state {}", data.start_state)));
    }

    for (i, prod) in data.productions.iter().enumerate() {
        if prod.lhs as usize >= data.nonterminal_count {
            return Err(corrupt(format!("production {} has terminal lhs", i)));
        }
        for entry in &prod.fields {
            if entry.child_index >= prod.child_count
                || entry.field_id == 0
                || entry.field_id as usize > data.field_names.len()
            {
                return Err(corrupt(format!("production {} has bad field map", i)));
            }
        }
    }

    for (i, action) in table.actions.iter().enumerate() {
        let (state, sym) = (i / n_sym, i % n_sym);
        let terminal = sym >= data.nonterminal_count;
        let ok = match *action {
            ParseAction::Error => true,
            ParseAction::Accept => sym == n_sym - 1,
            ParseAction::Shift(s) => terminal && (s as usize) < table.state_count,
            ParseAction::Goto(s) => !terminal && (s as usize) < table.state_count,
            ParseAction::Reduce(p) => terminal && (p as usize) < data.productions.len(),
        };
        if !ok {
            return Err(corrupt(format!(
                "bad action {:?} at state {} symbol {}",
                action, state, sym
            )));
        }
    }

    if data.state_lex_modes.len() != table.state_count {
        return Err(corrupt("lex mode count does not match state count"));
    }
    if let Some(m) = data
        .state_lex_modes
        .iter()
        .find(|&&m| m as usize >= data.lex_modes.len())
    {
        return Err(corrupt(format!("bad lex mode {}", m)));
    }
    if data.lex_modes.iter().any(|m| m.len() != n_sym) {
        return Err(corrupt("lex mode width does not match symbol count"));
    }

    let lex = &data.lex;
    if lex.patterns.len() != lex.dfa.pattern_len() {
        return Err(corrupt(format!(
            "{} lexer patterns for a {}-pattern automaton",
            lex.patterns.len(),
            lex.dfa.pattern_len()
        )));
    }
    for pattern in &lex.patterns {
        if let Some(sym) = pattern.symbol {
            if (sym as usize) < data.nonterminal_count || sym as usize >= n_sym - 1 {
                return Err(corrupt(format!("lexer pattern yields non-token {}", sym)));
            }
        }
    }
    if let Some(word) = lex.word {
        if (word as usize) < data.nonterminal_count || word as usize >= n_sym {
            return Err(corrupt(format!("bad word token {}", word)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_language::{ITEM, LIST, LIST_END, list_language, list_language_data};

    #[test]
    fn symbol_queries() {
        let language = list_language();
        assert_eq!(language.name(), "list");
        assert_eq!(language.end_symbol(), LIST_END);
        assert_eq!(language.error_symbol(), LIST_END + 1);
        assert_eq!(language.symbol_name(LIST), Some("list"));
        assert_eq!(language.symbol_name(language.error_symbol()), Some("ERROR"));
        assert_eq!(language.symbol_name(99), None);
        assert!(language.is_terminal(ITEM));
        assert!(!language.is_terminal(LIST));
        assert!(!language.symbol_is_visible(LIST_END));
        assert!(language.symbol_is_named(language.error_symbol()));
        assert_eq!(language.id_for_node_kind("number", true), Some(ITEM));
        assert_eq!(language.id_for_node_kind("number", false), None);
        assert_eq!(language.id_for_node_kind("end", true), None);
        assert_eq!(language.field_id_for_name("item"), Some(1));
        assert_eq!(language.field_name_for_id(1), Some("item"));
        assert_eq!(language.field_name_for_id(0), None);
        assert_eq!(language.action(0, ITEM), ParseAction::Shift(2));
        assert_eq!(language.action(0, 42), ParseAction::Error);
    }

    #[test]
    fn handles_share_tables() {
        let language = list_language();
        let copy = language.clone();
        assert!(language.ptr_eq(&copy));
        assert!(!language.ptr_eq(&list_language()));
    }

    #[test]
    fn rejects_other_version() {
        let mut data = list_language_data();
        data.version = LANGUAGE_VERSION + 1;
        assert_eq!(
            Language::new(data).unwrap_err(),
            LanguageError::IncompatibleVersion {
                found: LANGUAGE_VERSION + 1,
                expected: LANGUAGE_VERSION,
            }
        );
    }

    #[test]
    fn rejects_corrupt_tables() {
        let mut data = list_language_data();
        data.table.actions.pop();
        assert!(matches!(
            Language::new(data),
            Err(LanguageError::Corrupt(_))
        ));

        let mut data = list_language_data();
        data.table.actions[1] = ParseAction::Shift(1);
        assert!(matches!(
            Language::new(data),
            Err(LanguageError::Corrupt(_))
        ));

        let mut data = list_language_data();
        data.productions[1].fields[0].field_id = 7;
        assert!(matches!(
            Language::new(data),
            Err(LanguageError::Corrupt(_))
        ));

        let mut data = list_language_data();
        data.lex.patterns.pop();
        assert!(matches!(
            Language::new(data),
            Err(LanguageError::Corrupt(_))
        ));

        let mut data = list_language_data();
        data.state_lex_modes[2] = 9;
        assert!(matches!(
            Language::new(data),
            Err(LanguageError::Corrupt(_))
        ));
    }
}
