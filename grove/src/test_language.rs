//! Hand-built languages used by the runtime's unit tests.

use crate::language::{
    FieldMapEntry, LANGUAGE_VERSION, Language, LanguageData, LexPattern, LexTable, ParseAction,
    ParseTable, Production, SymbolMetadata,
};
use regex_automata::{
    MatchKind,
    dfa::{StartKind, dense},
    nfa::thompson::{Config as ThomConfig, NFA},
    util::syntax,
};

fn sym(name: &str, visible: bool, named: bool) -> SymbolMetadata {
    SymbolMetadata {
        name: name.into(),
        visible,
        named,
    }
}

fn build_dfa(patterns: &[&str]) -> dense::DFA<Vec<u32>> {
    let conf = syntax::Config::new().utf8(false);
    let hirs: Vec<_> = patterns
        .iter()
        .map(|p| syntax::parse_with(p, &conf).unwrap())
        .collect();
    let nfa = NFA::compiler()
        .configure(ThomConfig::new().utf8(false))
        .build_many_from_hir(&hirs)
        .unwrap();
    dense::Builder::new()
        .configure(
            dense::DFA::config()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .build_from_nfa(&nfa)
        .unwrap()
}

pub const IDENTIFIER: u16 = 1;
pub const SELECT: u16 = 2;
pub const NUMBER: u16 = 3;
pub const TIMES: u16 = 4;
pub const STAR: u16 = 5;
pub const COMMENT: u16 = 6;
pub const LT: u16 = 7;
pub const LE: u16 = 8;
pub const END: u16 = 9;

/// A single-state language exercising the lexer only.
pub fn lexer_language() -> Language {
    let symbols = vec![
        sym("start", false, true),
        sym("identifier", true, true),
        sym("SELECT", true, false),
        sym("number", true, true),
        sym("*", true, false),
        sym("star", true, true),
        sym("comment", true, true),
        sym("<", true, false),
        sym("<=", true, false),
        sym("end", false, true),
    ];
    let n = symbols.len();
    let dfa = build_dfa(&[
        r"(?i-u:select)",
        r"\*",
        r"\*",
        r"<",
        r"<=",
        r"[A-Za-z_][A-Za-z0-9_]*",
        r"[0-9]+",
        r"\s+",
        r"--[^\n]*",
    ]);
    let pat = |symbol: Option<u16>, extra: bool, keyword: bool| LexPattern {
        symbol,
        extra,
        keyword,
    };
    let patterns = vec![
        pat(Some(SELECT), false, true),
        pat(Some(TIMES), false, false),
        pat(Some(STAR), false, false),
        pat(Some(LT), false, false),
        pat(Some(LE), false, false),
        pat(Some(IDENTIFIER), false, false),
        pat(Some(NUMBER), false, false),
        pat(None, true, false),
        pat(Some(COMMENT), true, false),
    ];
    Language::new(LanguageData {
        name: "lexer-test".into(),
        version: LANGUAGE_VERSION,
        symbols,
        nonterminal_count: 1,
        field_names: vec![],
        productions: vec![],
        table: ParseTable {
            state_count: 1,
            symbol_count: n,
            actions: vec![ParseAction::Error; n],
        },
        lex: LexTable {
            dfa,
            patterns,
            word: Some(IDENTIFIER),
        },
        lex_modes: vec![vec![true; n]],
        state_lex_modes: vec![0],
        start_state: 0,
    })
    .unwrap()
}

/// Valid-terminal set containing exactly `symbols`.
pub fn mode(n: usize, symbols: &[u16]) -> Vec<bool> {
    let mut v = vec![false; n];
    for &s in symbols {
        v[s as usize] = true;
    }
    v
}

pub const LIST: u16 = 1;
pub const ITEM: u16 = 2;
pub const LIST_COMMENT: u16 = 3;
pub const LIST_END: u16 = 4;

/// `list: list number | number`, with `#` comments as extras.
///
/// The `number` in `list -> list number` carries the field `item`.
pub fn list_language() -> Language {
    Language::new(list_language_data()).unwrap()
}

pub fn list_language_data() -> LanguageData {
    use ParseAction::{Accept, Error as E, Goto as G, Reduce as R, Shift as S};
    let symbols = vec![
        sym("start", false, true),
        sym("list", true, true),
        sym("number", true, true),
        sym("comment", true, true),
        sym("end", false, true),
    ];
    #[rustfmt::skip]
    let actions = vec![
        E, G(1), S(2), E, E,
        E, E,    S(3), E, Accept,
        E, E,    R(2), E, R(2),
        E, E,    R(1), E, R(1),
    ];
    let dfa = build_dfa(&[r"[0-9]+", r"\s+", r"#[^\n]*"]);
    LanguageData {
        name: "list".into(),
        version: LANGUAGE_VERSION,
        symbols,
        nonterminal_count: 2,
        field_names: vec!["item".into()],
        productions: vec![
            Production {
                lhs: 0,
                child_count: 1,
                fields: vec![],
            },
            Production {
                lhs: LIST,
                child_count: 2,
                fields: vec![FieldMapEntry {
                    child_index: 1,
                    field_id: 1,
                }],
            },
            Production {
                lhs: LIST,
                child_count: 1,
                fields: vec![],
            },
        ],
        table: ParseTable {
            state_count: 4,
            symbol_count: 5,
            actions,
        },
        lex: LexTable {
            dfa,
            patterns: vec![
                LexPattern {
                    symbol: Some(ITEM),
                    extra: false,
                    keyword: false,
                },
                LexPattern {
                    symbol: None,
                    extra: true,
                    keyword: false,
                },
                LexPattern {
                    symbol: Some(LIST_COMMENT),
                    extra: true,
                    keyword: false,
                },
            ],
            word: None,
        },
        lex_modes: vec![
            vec![false, false, true, false, false],
            vec![false, false, true, false, true],
        ],
        state_lex_modes: vec![0, 1, 1, 1],
        start_state: 0,
    }
}
