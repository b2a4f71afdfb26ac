//! Lexer automaton construction.
//!
//! All token definitions are compiled into one anchored multi-pattern DFA.
//! Pattern order decides ties between equally long matches: string tokens
//! come first, then pattern tokens, then skipped extras. Which tokens are
//! acceptable at a given point is decided at runtime from the parse state's
//! lex mode, so a keyword is only a keyword where the grammar expects one.

use crate::error::CompileError;
use crate::flatten::{FlatGrammar, TokenDef};
use grove::{LexPattern, LexTable, Symbol};
use regex_automata::{
    MatchKind,
    dfa::{StartKind, dense},
    nfa::thompson::{Config as ThomConfig, NFA},
    util::syntax,
};

/// Compiles the tokens of `grammar` into a [`LexTable`].
pub fn build_lex_table(grammar: &FlatGrammar) -> Result<LexTable, CompileError> {
    let word_regex = match grammar.word {
        Some(word) => {
            let def = grammar
                .tokens
                .iter()
                .find(|t| t.symbol == word)
                .map(|t| t.def.regex())
                .ok_or_else(|| CompileError::Automaton(format!("word token {} has no pattern", word)))?;
            let anchored = format!("^(?:{})$", def);
            Some(
                regex::Regex::new(&anchored)
                    .map_err(|e| CompileError::Automaton(e.to_string()))?,
            )
        }
        None => None,
    };

    let mut regexes: Vec<std::string::String> = Vec::new();
    let mut patterns: Vec<LexPattern> = Vec::new();

    let strings = grammar.tokens.iter().filter(|t| t.def.is_string());
    let others = grammar.tokens.iter().filter(|t| !t.def.is_string());
    for token in strings.chain(others) {
        let keyword = match (&token.def, &word_regex) {
            (TokenDef::String { value, .. }, Some(word)) => word.is_match(value),
            _ => false,
        };
        regexes.push(token.def.regex());
        patterns.push(LexPattern {
            symbol: Some(token.symbol as Symbol),
            extra: grammar.extra_tokens.contains(&token.symbol),
            keyword,
        });
    }
    for def in &grammar.skip {
        regexes.push(def.regex());
        patterns.push(LexPattern {
            symbol: None,
            extra: true,
            keyword: false,
        });
    }

    let dfa = build_dfa(&regexes)?;
    log::debug!(
        "lexer automaton: {} patterns, {} bytes",
        patterns.len(),
        dfa.memory_usage()
    );
    Ok(LexTable {
        dfa,
        patterns,
        word: grammar.word.map(|w| w as Symbol),
    })
}

fn build_dfa(regexes: &[std::string::String]) -> Result<dense::DFA<Vec<u32>>, CompileError> {
    let conf = syntax::Config::new().utf8(false);
    let mut hirs = Vec::with_capacity(regexes.len());
    for regex in regexes {
        hirs.push(
            syntax::parse_with(regex, &conf)
                .map_err(|e| CompileError::Automaton(format!("{}: {}", regex, e)))?,
        );
    }
    let nfa = NFA::compiler()
        .configure(ThomConfig::new().utf8(false))
        .build_many_from_hir(&hirs)
        .map_err(|e| CompileError::Automaton(e.to_string()))?;
    dense::Builder::new()
        .configure(
            dense::DFA::config()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .build_from_nfa(&nfa)
        .map_err(|e| CompileError::Automaton(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::grammar::*;
    use regex_automata::dfa::Automaton;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn grammar() -> FlatGrammar {
        let g = Grammar::new("kw")
            .rule(
                "statement",
                seq([kw("SELECT"), sym("identifier"), string("*"), sym("comment")]),
            )
            .rule("identifier", pattern(r"[A-Za-z_][A-Za-z0-9_]*"))
            .rule("comment", pattern(r"--[^\n]*"))
            .extra(pattern(r"\s+"))
            .extra(sym("comment"))
            .word("identifier");
        flatten(&g).unwrap()
    }

    #[test]
    fn pattern_order_and_flags() {
        init_logger();
        let g = grammar();
        let lex = build_lex_table(&g).unwrap();
        let select = g.find_symbol("SELECT").unwrap() as Symbol;
        let star = g.find_symbol("*").unwrap() as Symbol;
        let identifier = g.find_symbol("identifier").unwrap() as Symbol;
        let comment = g.find_symbol("comment").unwrap() as Symbol;

        let symbols: Vec<Option<Symbol>> = lex.patterns.iter().map(|p| p.symbol).collect();
        assert_eq!(
            symbols,
            [Some(select), Some(star), Some(identifier), Some(comment), None]
        );
        assert!(lex.patterns[0].keyword);
        assert!(!lex.patterns[1].keyword);
        assert!(lex.patterns[3].extra);
        assert!(lex.patterns[4].extra);
        assert!(!lex.patterns[2].extra);
        assert_eq!(lex.word, Some(identifier));
        assert_eq!(lex.dfa.pattern_len(), 5);
    }

    #[test]
    fn bad_regex_is_reported() {
        let mut g = grammar();
        g.skip.push(TokenDef::Pattern("(".into()));
        let err = build_lex_table(&g).unwrap_err();
        assert!(matches!(err, CompileError::Automaton(_)));
    }
}
