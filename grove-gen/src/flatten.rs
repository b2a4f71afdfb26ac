//! Flattening of the rule DSL into numbered BNF productions.
//!
//! Choices and optional parts inside a sequence are expanded in place, so a
//! rule like `seq(a, optional(b), c)` becomes the two productions `a b c` and
//! `a c`. Only repetitions introduce helper nonterminals: `repeat1(x)` turns
//! into a hidden, left-recursive `_<rule>_repeatN`.
//!
//! Numbering follows the runtime: nonterminals first with `0` the augmented
//! start symbol, then tokens, with the end-of-input token last.

use crate::error::GrammarError;
use crate::grammar::{Assoc, Grammar, Rule};
use crate::symtab::Symtab;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::{HashMap, HashSet};

/// Upper bound on the productions a single rule may expand into.
pub const MAX_ALTERNATIVES: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub visible: bool,
    pub named: bool,
}

/// Lexical definition of a token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenDef {
    String {
        value: String,
        case_insensitive: bool,
    },
    Pattern(String),
}

impl TokenDef {
    fn from_rule(rule: &Rule) -> Option<TokenDef> {
        match rule {
            Rule::String {
                value,
                case_insensitive,
            } => Some(TokenDef::String {
                value: value.clone(),
                case_insensitive: *case_insensitive,
            }),
            Rule::Pattern(p) => Some(TokenDef::Pattern(p.clone())),
            _ => None,
        }
    }

    /// Regular expression fed to the lexer automaton.
    pub fn regex(&self) -> std::string::String {
        match self {
            TokenDef::String {
                value,
                case_insensitive: false,
            } => regex::escape(value),
            TokenDef::String {
                value,
                case_insensitive: true,
            } => format!("(?i-u:{})", regex::escape(value)),
            TokenDef::Pattern(p) => p.to_string(),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TokenDef::String { .. })
    }

    fn describe(&self) -> &str {
        match self {
            TokenDef::String { value, .. } => value.as_str(),
            TokenDef::Pattern(p) => p.as_str(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatProduction {
    pub lhs: usize,
    pub rhs: Vec<usize>,
    /// `(child index, field id)`; field ids start at 1.
    pub fields: Vec<(usize, usize)>,
    pub prec: i32,
    pub assoc: Assoc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub symbol: usize,
    pub def: TokenDef,
}

#[derive(Clone, Debug)]
pub struct FlatGrammar {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub nonterminal_count: usize,
    pub productions: Vec<FlatProduction>,
    /// Every token except end of input.
    pub tokens: Vec<Token>,
    /// Anonymous extras, skipped into the padding of the next token.
    pub skip: Vec<TokenDef>,
    /// Token symbols that may appear anywhere.
    pub extra_tokens: Vec<usize>,
    pub field_names: Vec<String>,
    pub word: Option<usize>,
}

impl FlatGrammar {
    pub fn terminal_count(&self) -> usize {
        self.symbols.len() - self.nonterminal_count
    }

    pub fn end_symbol(&self) -> usize {
        self.symbols.len() - 1
    }

    pub fn symbol_name(&self, symbol: usize) -> &str {
        self.symbols.get(symbol).map_or("?", |s| s.name.as_str())
    }

    pub fn symbol_names(&self) -> Vec<std::string::String> {
        self.symbols.iter().map(|s| s.name.to_string()).collect()
    }

    /// Productions as `[lhs, rhs...]` symbol vectors.
    pub fn prods(&self) -> Vec<Vec<usize>> {
        self.productions
            .iter()
            .map(|p| std::iter::once(p.lhs).chain(p.rhs.iter().copied()).collect())
            .collect()
    }

    pub fn find_symbol(&self, name: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s.name.as_str() == name)
    }
}

type Prec = Option<(i32, Assoc)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Sym {
    Nonterminal(usize),
    Terminal(usize),
}

#[derive(Clone, Debug)]
struct Step {
    sym: Sym,
    field: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct Alt {
    steps: Vec<Step>,
    prec: Prec,
}

impl Alt {
    fn single(sym: Sym) -> Self {
        Alt {
            steps: vec![Step { sym, field: None }],
            prec: None,
        }
    }

    fn concat(&self, other: &Alt) -> Alt {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Alt {
            steps,
            prec: self.prec.or(other.prec),
        }
    }
}

struct Builder<'g> {
    rules: IndexMap<&'g str, Sym>,
    nonterminals: Vec<SymbolInfo>,
    terminals: Vec<(SymbolInfo, TokenDef)>,
    anonymous: HashMap<TokenDef, usize>,
    repeats: HashMap<(Rule, Prec), usize>,
    productions: Vec<(usize, Alt)>,
    current: &'g str,
    repeat_count: usize,
}

/// Flattens `grammar` into numbered productions and token definitions.
pub fn flatten(grammar: &Grammar) -> Result<FlatGrammar, GrammarError> {
    let Some((start_name, _)) = grammar.rules.first() else {
        return Err(GrammarError::Empty);
    };

    let mut b = Builder {
        rules: IndexMap::new(),
        nonterminals: vec![SymbolInfo {
            name: "start".into(),
            visible: false,
            named: true,
        }],
        terminals: Vec::new(),
        anonymous: HashMap::new(),
        repeats: HashMap::new(),
        productions: Vec::new(),
        current: start_name.as_str(),
        repeat_count: 0,
    };

    for (name, rule) in &grammar.rules {
        if b.rules.contains_key(name.as_str()) {
            return Err(GrammarError::DuplicateRule(name.to_string()));
        }
        let info = SymbolInfo {
            name: name.clone(),
            visible: !name.starts_with('_'),
            named: true,
        };
        let sym = match TokenDef::from_rule(rule) {
            Some(def) => {
                check_token(name, &def)?;
                b.terminals.push((info, def));
                Sym::Terminal(b.terminals.len() - 1)
            }
            None => {
                b.nonterminals.push(info);
                Sym::Nonterminal(b.nonterminals.len() - 1)
            }
        };
        b.rules.insert(name.as_str(), sym);
    }

    let start = match b.rules.get(start_name.as_str()) {
        Some(&Sym::Nonterminal(nt)) => nt,
        _ => return Err(GrammarError::TerminalStartRule(start_name.to_string())),
    };
    b.productions.push((0, Alt::single(Sym::Nonterminal(start))));

    for (name, rule) in &grammar.rules {
        let Some(&Sym::Nonterminal(nt)) = b.rules.get(name.as_str()) else {
            continue;
        };
        b.current = name.as_str();
        b.repeat_count = 0;
        let alts = b.expand(rule, None)?;
        b.productions.extend(alts.into_iter().map(|alt| (nt, alt)));
    }

    let word = match &grammar.word {
        None => None,
        Some(name) => match b.rules.get(name.as_str()) {
            Some(&Sym::Terminal(t)) if matches!(b.terminals[t].1, TokenDef::Pattern(_)) => Some(t),
            _ => return Err(GrammarError::InvalidWord(name.to_string())),
        },
    };

    let mut skip = Vec::new();
    let mut extra_terminals = Vec::new();
    for extra in &grammar.extras {
        match extra {
            Rule::String { .. } | Rule::Pattern(_) => {
                if let Some(def) = TokenDef::from_rule(extra) {
                    check_token(def.describe(), &def)?;
                    skip.push(def);
                }
            }
            Rule::Symbol(name) => match b.rules.get(name.as_str()) {
                Some(&Sym::Terminal(t)) => extra_terminals.push(t),
                Some(&Sym::Nonterminal(_)) => {
                    return Err(GrammarError::InvalidExtra(name.to_string()));
                }
                None => {
                    return Err(GrammarError::UndefinedSymbol {
                        rule: "extras".into(),
                        symbol: name.to_string(),
                    });
                }
            },
            other => return Err(GrammarError::InvalidExtra(format!("{:?}", other))),
        }
    }

    Ok(b.finish(grammar, word, skip, extra_terminals))
}

impl<'g> Builder<'g> {
    fn expand(&mut self, rule: &Rule, ctx: Prec) -> Result<Vec<Alt>, GrammarError> {
        match rule {
            Rule::Blank => Ok(vec![Alt::default()]),
            Rule::String { .. } | Rule::Pattern(_) => {
                let t = self.anonymous_token(rule)?;
                Ok(vec![Alt::single(Sym::Terminal(t))])
            }
            Rule::Symbol(name) => match self.rules.get(name.as_str()) {
                Some(&sym) => Ok(vec![Alt::single(sym)]),
                None => Err(GrammarError::UndefinedSymbol {
                    rule: self.current.to_string(),
                    symbol: name.to_string(),
                }),
            },
            Rule::Seq(items) => {
                let mut acc = vec![Alt::default()];
                for item in items {
                    let alts = self.expand(item, ctx)?;
                    self.check_size(acc.len() * alts.len())?;
                    acc = acc
                        .iter()
                        .flat_map(|a| alts.iter().map(move |b| a.concat(b)))
                        .collect();
                }
                Ok(acc)
            }
            Rule::Choice(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(self.expand(item, ctx)?);
                    self.check_size(out.len())?;
                }
                Ok(out)
            }
            Rule::Repeat(inner) => {
                let aux = self.repeat_aux(inner, ctx)?;
                Ok(vec![Alt::default(), Alt::single(aux)])
            }
            Rule::Repeat1(inner) => Ok(vec![Alt::single(self.repeat_aux(inner, ctx)?)]),
            Rule::Field { name, rule } => {
                let mut alts = self.expand(rule, ctx)?;
                for step in alts.iter_mut().flat_map(|a| a.steps.iter_mut()) {
                    if step.field.is_none() {
                        step.field = Some(name.clone());
                    }
                }
                Ok(alts)
            }
            Rule::Prec { value, assoc, rule } => {
                let prec = Some((*value, *assoc));
                let mut alts = self.expand(rule, prec)?;
                for alt in &mut alts {
                    alt.prec = alt.prec.or(prec);
                }
                Ok(alts)
            }
        }
    }

    fn check_size(&self, n: usize) -> Result<(), GrammarError> {
        if n > MAX_ALTERNATIVES {
            return Err(GrammarError::TooManyAlternatives(self.current.to_string()));
        }
        Ok(())
    }

    fn anonymous_token(&mut self, rule: &Rule) -> Result<usize, GrammarError> {
        let Some(def) = TokenDef::from_rule(rule) else {
            return Err(GrammarError::InvalidPattern {
                pattern: format!("{:?}", rule),
                message: "not a token".into(),
            });
        };
        if let Some(&t) = self.anonymous.get(&def) {
            return Ok(t);
        }
        check_token(def.describe(), &def)?;
        let info = SymbolInfo {
            name: def.describe().into(),
            visible: def.is_string(),
            named: false,
        };
        self.terminals.push((info, def.clone()));
        let t = self.terminals.len() - 1;
        self.anonymous.insert(def, t);
        Ok(t)
    }

    /// Hidden `aux → x | aux x` for `repeat1(x)`, shared between identical
    /// repetitions under the same precedence.
    fn repeat_aux(&mut self, inner: &Rule, ctx: Prec) -> Result<Sym, GrammarError> {
        let key = (inner.clone(), ctx);
        if let Some(&nt) = self.repeats.get(&key) {
            return Ok(Sym::Nonterminal(nt));
        }
        self.repeat_count += 1;
        let nt = self.nonterminals.len();
        self.nonterminals.push(SymbolInfo {
            name: format!("_{}_repeat{}", self.current, self.repeat_count).as_str().into(),
            visible: false,
            named: false,
        });
        self.repeats.insert(key, nt);

        let me = Sym::Nonterminal(nt);
        for alt in self.expand(inner, ctx)? {
            if alt.steps.is_empty() {
                continue;
            }
            let prec = alt.prec.or(ctx);
            let mut recursive = vec![Step {
                sym: me,
                field: None,
            }];
            recursive.extend(alt.steps.iter().cloned());
            self.productions.push((
                nt,
                Alt {
                    steps: alt.steps,
                    prec,
                },
            ));
            self.productions.push((
                nt,
                Alt {
                    steps: recursive,
                    prec,
                },
            ));
        }
        Ok(me)
    }

    fn finish(
        self,
        grammar: &Grammar,
        word: Option<usize>,
        skip: Vec<TokenDef>,
        extra_terminals: Vec<usize>,
    ) -> FlatGrammar {
        let n_nt = self.nonterminals.len();
        let number = |sym: Sym| match sym {
            Sym::Nonterminal(nt) => nt,
            Sym::Terminal(t) => n_nt + t,
        };

        let mut fields = Symtab::new();
        let mut seen = HashSet::new();
        let mut productions = Vec::with_capacity(self.productions.len());
        for (lhs, alt) in self.productions {
            let rhs: Vec<usize> = alt.steps.iter().map(|s| number(s.sym)).collect();
            if !seen.insert((lhs, rhs.clone())) {
                continue;
            }
            let prod_fields = alt
                .steps
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.field.as_ref().map(|f| (i, fields.add(f) + 1)))
                .collect();
            let (prec, assoc) = alt.prec.unwrap_or((0, Assoc::None));
            productions.push(FlatProduction {
                lhs,
                rhs,
                fields: prod_fields,
                prec,
                assoc,
            });
        }

        let mut symbols = self.nonterminals;
        let mut tokens = Vec::with_capacity(self.terminals.len());
        for (t, (info, def)) in self.terminals.into_iter().enumerate() {
            symbols.push(info);
            tokens.push(Token {
                symbol: n_nt + t,
                def,
            });
        }
        symbols.push(SymbolInfo {
            name: "end".into(),
            visible: false,
            named: true,
        });

        FlatGrammar {
            name: grammar.name.clone(),
            symbols,
            nonterminal_count: n_nt,
            productions,
            tokens,
            skip,
            extra_tokens: extra_terminals.into_iter().map(|t| n_nt + t).collect(),
            field_names: fields.into_vec(),
            word: word.map(|t| n_nt + t),
        }
    }
}

/// Rejects tokens that are not valid regexes or that match the empty string.
fn check_token(name: &str, def: &TokenDef) -> Result<(), GrammarError> {
    let empty = match def {
        TokenDef::String { value, .. } => value.is_empty(),
        TokenDef::Pattern(p) => {
            let re = regex::Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                GrammarError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                }
            })?;
            re.is_match("")
        }
    };
    if empty {
        return Err(GrammarError::EmptyToken(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::*;

    fn rhs_names(g: &FlatGrammar, p: &FlatProduction) -> Vec<std::string::String> {
        p.rhs.iter().map(|&s| g.symbol_name(s).to_string()).collect()
    }

    fn productions_of<'a>(g: &'a FlatGrammar, lhs: &str) -> Vec<&'a FlatProduction> {
        let lhs = g.find_symbol(lhs).unwrap();
        g.productions.iter().filter(|p| p.lhs == lhs).collect()
    }

    #[test]
    fn numbers_nonterminals_then_tokens() {
        let g = flatten(
            &Grammar::new("t")
                .rule("list", repeat1(sym("item")))
                .rule("item", choice([sym("number"), string("(")]))
                .rule("number", pattern(r"[0-9]+"))
                .extra(pattern(r"\s+")),
        )
        .unwrap();
        let names = g.symbol_names();
        assert_eq!(names[0], "start");
        assert_eq!(names[1], "list");
        assert_eq!(names[2], "item");
        assert_eq!(names[3], "_list_repeat1");
        assert_eq!(g.nonterminal_count, 4);
        assert_eq!(names[4], "number");
        assert_eq!(names[5], "(");
        assert_eq!(names.last().map(|s| s.as_str()), Some("end"));
        assert_eq!(g.end_symbol(), names.len() - 1);
        assert_eq!(g.terminal_count(), 3);

        assert_eq!(g.productions[0].lhs, 0);
        assert_eq!(g.productions[0].rhs, vec![1]);
        assert!(!g.symbols[3].visible);
        assert!(g.symbols[4].named && g.symbols[4].visible);
        assert!(!g.symbols[5].named && g.symbols[5].visible);
        assert_eq!(g.skip.len(), 1);
        assert_eq!(g.tokens.len(), 2);
    }

    #[test]
    fn repeat_is_left_recursive() {
        let g = flatten(
            &Grammar::new("t")
                .rule("list", repeat1(sym("item")))
                .rule("item", string("x")),
        )
        .unwrap();
        let aux = productions_of(&g, "_list_repeat1");
        assert_eq!(aux.len(), 2);
        assert_eq!(rhs_names(&g, aux[0]), ["item"]);
        assert_eq!(rhs_names(&g, aux[1]), ["_list_repeat1", "item"]);
        let list = productions_of(&g, "list");
        assert_eq!(list.len(), 1);
        assert_eq!(rhs_names(&g, list[0]), ["_list_repeat1"]);
    }

    #[test]
    fn optional_expands_in_place() {
        let g = flatten(
            &Grammar::new("t")
                .rule(
                    "call",
                    seq([sym("name"), optional(sym("args")), repeat(string(";"))]),
                )
                .rule("args", string("()"))
                .rule("name", pattern("[a-z]+")),
        )
        .unwrap();
        let call: Vec<_> = productions_of(&g, "call")
            .into_iter()
            .map(|p| rhs_names(&g, p).join(" "))
            .collect();
        assert_eq!(
            call,
            [
                "name args",
                "name args _call_repeat1",
                "name",
                "name _call_repeat1"
            ]
        );
    }

    #[test]
    fn identical_repeats_are_shared() {
        let g = flatten(
            &Grammar::new("t")
                .rule("a", seq([repeat1(string("x")), string(";"), repeat1(string("x"))]))
                .rule("b", repeat1(string("y"))),
        )
        .unwrap();
        assert!(g.find_symbol("_a_repeat1").is_some());
        assert!(g.find_symbol("_a_repeat2").is_none());
        assert!(g.find_symbol("_b_repeat1").is_some());
        assert_eq!(g.tokens.len(), 3);
    }

    #[test]
    fn fields_follow_children() {
        let g = flatten(
            &Grammar::new("t")
                .rule(
                    "binary",
                    seq([
                        field("left", sym("atom")),
                        field("operator", choice([string("+"), string("-")])),
                        field("right", sym("atom")),
                    ]),
                )
                .rule("atom", pattern("[a-z]")),
        )
        .unwrap();
        let names: Vec<&str> = g.field_names.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, ["left", "operator", "right"]);
        let prods = productions_of(&g, "binary");
        assert_eq!(prods.len(), 2);
        assert_eq!(prods[0].fields, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn inner_precedence_wins() {
        let g = flatten(
            &Grammar::new("t")
                .rule(
                    "e",
                    choice([
                        prec_left(1, seq([sym("e"), string("+"), sym("e")])),
                        prec(5, prec_right(9, seq([string("-"), sym("e")]))),
                        sym("n"),
                    ]),
                )
                .rule("n", pattern("[0-9]")),
        )
        .unwrap();
        let prods = productions_of(&g, "e");
        assert_eq!((prods[0].prec, prods[0].assoc), (1, Assoc::Left));
        assert_eq!((prods[1].prec, prods[1].assoc), (9, Assoc::Right));
        assert_eq!((prods[2].prec, prods[2].assoc), (0, Assoc::None));
    }

    #[test]
    fn extras_and_word() {
        let g = flatten(
            &Grammar::new("t")
                .rule("s", repeat(sym("id")))
                .rule("id", pattern("[a-z]+"))
                .rule("comment", pattern("#.*"))
                .extra(pattern(r"\s"))
                .extra(sym("comment"))
                .word("id"),
        )
        .unwrap();
        assert_eq!(g.extra_tokens, vec![g.find_symbol("comment").unwrap()]);
        assert_eq!(g.word, g.find_symbol("id"));
        assert_eq!(g.skip, vec![TokenDef::Pattern(r"\s".into())]);
    }

    #[test]
    fn token_regexes() {
        assert_eq!(TokenDef::Pattern("[a-z]+".into()).regex(), "[a-z]+");
        let plus = TokenDef::String {
            value: "+".into(),
            case_insensitive: false,
        };
        assert_eq!(plus.regex(), r"\+");
        let select = TokenDef::String {
            value: "SELECT".into(),
            case_insensitive: true,
        };
        assert_eq!(select.regex(), "(?i-u:SELECT)");
    }

    #[test]
    fn grammar_errors() {
        assert_eq!(flatten(&Grammar::new("t")).unwrap_err(), GrammarError::Empty);
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", blank()).rule("a", blank())).unwrap_err(),
            GrammarError::DuplicateRule("a".into())
        );
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", sym("b"))).unwrap_err(),
            GrammarError::UndefinedSymbol {
                rule: "a".into(),
                symbol: "b".into()
            }
        );
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", string("x"))).unwrap_err(),
            GrammarError::TerminalStartRule("a".into())
        );
        assert_eq!(
            flatten(
                &Grammar::new("t")
                    .rule("a", sym("b"))
                    .rule("b", string("x"))
                    .word("b")
            )
            .unwrap_err(),
            GrammarError::InvalidWord("b".into())
        );
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", blank()).extra(sym("a"))).unwrap_err(),
            GrammarError::InvalidExtra("a".into())
        );
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", sym("b")).rule("b", pattern("x*"))).unwrap_err(),
            GrammarError::EmptyToken("b".into())
        );
        assert!(matches!(
            flatten(&Grammar::new("t").rule("a", pattern("("))).unwrap_err(),
            GrammarError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn expansion_is_bounded() {
        let pieces: Vec<Rule> = (0..13).map(|_| optional(string("x"))).collect();
        assert_eq!(
            flatten(&Grammar::new("t").rule("a", seq(pieces))).unwrap_err(),
            GrammarError::TooManyAlternatives("a".into())
        );
    }
}
