//! From grammar to language.
//!
//! [`compile`] runs the whole pipeline: the grammar is flattened into
//! numbered productions, the LR(0) automaton is built and annotated with
//! SLR(1) or LALR(1) lookaheads, conflicts are settled by precedence and
//! associativity, the tokens are compiled into a lexer automaton, and the
//! result is validated by the runtime as a [`Language`].

use crate::error::CompileError;
use crate::flatten::{FlatGrammar, flatten};
use crate::grammar::{Assoc, Grammar};
use crate::lexgen::build_lex_table;
use crate::lr::{
    self, ActTyp, Automaton, Conflict, ResolvedTab, construct_set, construct_table, first_sets,
    follow_sets, lalr_reductions, slr_reductions,
};
use crate::report::describe_conflict;
use grove::{
    FieldMapEntry, LANGUAGE_VERSION, Language, LanguageData, ParseAction, ParseTable, Production,
    Symbol, SymbolMetadata,
};
use std::collections::HashMap;

/// How reduce lookaheads are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableKind {
    /// FOLLOW sets of the reduced nonterminal.
    Slr,
    /// Lookaheads propagated through the LR(0) automaton.
    #[default]
    Lalr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    pub table: TableKind,
    /// Fail on conflicts left after precedence resolution instead of
    /// logging them and keeping the default choice.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            table: TableKind::Lalr,
            strict: true,
        }
    }
}

/// A compiled grammar together with the intermediate results, for reports.
#[derive(Debug)]
pub struct Compiled {
    pub language: Language,
    pub grammar: FlatGrammar,
    pub automaton: Automaton,
    pub table: ResolvedTab,
    /// Conflicts settled by default choice; always empty in strict mode.
    pub conflicts: Vec<Conflict>,
}

/// Compiles `grammar` into a [`Language`].
pub fn compile(grammar: &Grammar, options: &CompileOptions) -> Result<Compiled, CompileError> {
    let flat = flatten(grammar)?;
    let prods = flat.prods();
    let n_nonterm = flat.nonterminal_count;
    let n_term = flat.terminal_count();
    log::debug!(
        "grammar {:?}: {} nonterminals, {} terminals, {} productions",
        flat.name,
        n_nonterm,
        n_term,
        prods.len()
    );

    let automaton = construct_set(&prods, n_nonterm);
    let reductions = match options.table {
        TableKind::Slr => {
            let (first, nullable) = first_sets(&prods, n_nonterm, n_term);
            let follow = follow_sets(&prods, n_nonterm, n_term, 0, &first, &nullable);
            slr_reductions(&automaton, &prods, &follow)
        }
        TableKind::Lalr => lalr_reductions(&automaton, &prods, n_nonterm, n_term),
    };
    let candidates = construct_table(&automaton, &reductions, n_nonterm, n_term);
    let prec: Vec<(i32, Assoc)> = flat.productions.iter().map(|p| (p.prec, p.assoc)).collect();
    let (table, conflicts) = lr::resolve(&candidates, &automaton, &prods, &prec);

    if !conflicts.is_empty() {
        for c in &conflicts {
            log::warn!("{}", describe_conflict(&flat, c));
        }
        if options.strict {
            return Err(CompileError::Conflicts(conflicts));
        }
    }

    let lex = build_lex_table(&flat)?;
    let (lex_modes, state_lex_modes) = lex_modes(&table, n_nonterm)?;
    let data = LanguageData {
        name: flat.name.clone(),
        version: LANGUAGE_VERSION,
        symbols: flat
            .symbols
            .iter()
            .map(|s| SymbolMetadata {
                name: s.name.clone(),
                visible: s.visible,
                named: s.named,
            })
            .collect(),
        nonterminal_count: n_nonterm,
        field_names: flat.field_names.clone(),
        productions: productions(&flat)?,
        table: parse_table(&table, flat.symbols.len())?,
        lex,
        lex_modes,
        state_lex_modes,
        start_state: 0,
    };
    let language = Language::new(data)?;

    Ok(Compiled {
        language,
        grammar: flat,
        automaton,
        table,
        conflicts,
    })
}

fn narrow(value: usize, what: &'static str) -> Result<u16, CompileError> {
    u16::try_from(value).map_err(|_| CompileError::TooLarge(what))
}

fn productions(grammar: &FlatGrammar) -> Result<Vec<Production>, CompileError> {
    grammar
        .productions
        .iter()
        .map(|p| {
            let fields = p
                .fields
                .iter()
                .map(|&(child, field)| {
                    Ok(FieldMapEntry {
                        child_index: narrow(child, "children")?,
                        field_id: narrow(field, "fields")?,
                    })
                })
                .collect::<Result<_, CompileError>>()?;
            Ok(Production {
                lhs: narrow(p.lhs, "symbols")?,
                child_count: narrow(p.rhs.len(), "children")?,
                fields,
            })
        })
        .collect()
}

fn parse_table(table: &ResolvedTab, n_sym: usize) -> Result<ParseTable, CompileError> {
    narrow(table.len(), "states")?;
    let mut actions = Vec::with_capacity(table.len() * n_sym);
    for row in table {
        for act in row {
            actions.push(match act {
                None => ParseAction::Error,
                Some(a) => match a.typ {
                    ActTyp::Accept => ParseAction::Accept,
                    ActTyp::Shift => ParseAction::Shift(narrow(a.val, "states")?),
                    ActTyp::Goto => ParseAction::Goto(narrow(a.val, "states")?),
                    ActTyp::Reduce => ParseAction::Reduce(narrow(a.val, "productions")?),
                },
            });
        }
    }
    Ok(ParseTable {
        state_count: table.len(),
        symbol_count: n_sym,
        actions,
    })
}

/// Groups states by the set of terminals they have an action for.
fn lex_modes(
    table: &ResolvedTab,
    n_nonterm: usize,
) -> Result<(Vec<Vec<bool>>, Vec<u16>), CompileError> {
    let mut modes: Vec<Vec<bool>> = Vec::new();
    let mut index: HashMap<Vec<bool>, u16> = HashMap::new();
    let mut state_modes = Vec::with_capacity(table.len());
    for row in table {
        let valid: Vec<bool> = row
            .iter()
            .enumerate()
            .map(|(sym, act)| sym >= n_nonterm && act.is_some())
            .collect();
        let mode = match index.get(&valid) {
            Some(&m) => m,
            None => {
                let m = narrow(modes.len(), "lex modes")?;
                modes.push(valid.clone());
                index.insert(valid, m);
                m
            }
        };
        state_modes.push(mode);
    }
    log::debug!("{} lex modes for {} states", modes.len(), table.len());
    Ok((modes, state_modes))
}

/// Symbol id of a grammar symbol by name, hidden rules included.
///
/// Named symbols win over anonymous tokens with the same text.
pub fn symbol(language: &Language, name: &str) -> Option<Symbol> {
    let symbols = &language.data().symbols;
    symbols
        .iter()
        .position(|m| m.named && m.name.as_str() == name)
        .or_else(|| symbols.iter().position(|m| m.name.as_str() == name))
        .map(|i| i as Symbol)
}
