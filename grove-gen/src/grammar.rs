//! Grammar model.
//!
//! A grammar is an ordered list of named rules written with a small
//! combinator DSL in the style of tree-sitter's `grammar.js`:
//!
//! ```
//! use grove_gen::grammar::*;
//!
//! let grammar = Grammar::new("calc")
//!     .rule("program", repeat(sym("expression")))
//!     .rule(
//!         "expression",
//!         choice([
//!             prec_left(1, seq([sym("expression"), string("+"), sym("expression")])),
//!             sym("number"),
//!         ]),
//!     )
//!     .rule("number", pattern(r"[0-9]+"))
//!     .extra(pattern(r"\s+"));
//! assert_eq!(grammar.start_rule(), Some("program"));
//! ```
//!
//! The first rule is the start rule. Rules whose names begin with `_` are
//! hidden: they never show up as nodes, their children are spliced into the
//! parent instead. A rule whose body is a single string or pattern is a
//! named token.

use smartstring::alias::String;

/// Associativity used to break precedence ties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Matches nothing.
    Blank,
    /// A literal token.
    String {
        value: String,
        case_insensitive: bool,
    },
    /// A token described by a regular expression.
    Pattern(String),
    /// Reference to another rule.
    Symbol(String),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    Repeat(Box<Rule>),
    Repeat1(Box<Rule>),
    /// Names the children produced by `rule`.
    Field {
        name: String,
        rule: Box<Rule>,
    },
    Prec {
        value: i32,
        assoc: Assoc,
        rule: Box<Rule>,
    },
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn string(value: &str) -> Rule {
    Rule::String {
        value: value.into(),
        case_insensitive: false,
    }
}

/// A case-insensitive keyword, e.g. `kw("SELECT")`.
pub fn kw(value: &str) -> Rule {
    Rule::String {
        value: value.into(),
        case_insensitive: true,
    }
}

pub fn pattern(regex: &str) -> Rule {
    Rule::Pattern(regex.into())
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(name.into())
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(rules.into_iter().collect())
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(rules.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

/// `rule (, rule)*`
pub fn comma_sep1(rule: Rule) -> Rule {
    seq([rule.clone(), repeat(seq([string(","), rule]))])
}

pub fn comma_sep(rule: Rule) -> Rule {
    optional(comma_sep1(rule))
}

pub fn field(name: &str, rule: Rule) -> Rule {
    Rule::Field {
        name: name.into(),
        rule: Box::new(rule),
    }
}

pub fn prec(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::None,
        rule: Box::new(rule),
    }
}

pub fn prec_left(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::Left,
        rule: Box::new(rule),
    }
}

pub fn prec_right(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::Right,
        rule: Box::new(rule),
    }
}

impl Rule {
    /// Is this rule a single token definition?
    pub fn is_token(&self) -> bool {
        matches!(self, Rule::String { .. } | Rule::Pattern(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grammar {
    pub name: String,
    /// Rules in definition order; the first one is the start rule.
    pub rules: Vec<(String, Rule)>,
    /// Tokens allowed anywhere between other tokens.
    pub extras: Vec<Rule>,
    /// The identifier-like token that keywords are checked against.
    pub word: Option<String>,
}

impl Grammar {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn rule(mut self, name: &str, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn extra(mut self, rule: Rule) -> Self {
        self.extras.push(rule);
        self
    }

    pub fn word(mut self, name: &str) -> Self {
        self.word = Some(name.into());
        self
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.rules.first().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, rule)| rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_rule_order() {
        let g = Grammar::new("g")
            .rule("b", sym("a"))
            .rule("a", string("x"))
            .extra(pattern(r"\s"))
            .word("a");
        assert_eq!(g.start_rule(), Some("b"));
        assert_eq!(g.rules.len(), 2);
        assert_eq!(g.extras.len(), 1);
        assert_eq!(g.word.as_deref(), Some("a"));
        assert!(g.get("a").is_some_and(Rule::is_token));
        assert!(!g.get("b").is_some_and(Rule::is_token));
        assert!(g.get("c").is_none());
    }

    #[test]
    fn helpers_build_expected_rules() {
        assert_eq!(optional(sym("a")), Rule::Choice(vec![sym("a"), Rule::Blank]));
        assert_eq!(
            kw("select"),
            Rule::String {
                value: "select".into(),
                case_insensitive: true
            }
        );
        let Rule::Seq(items) = comma_sep1(sym("a")) else {
            panic!("comma_sep1 is a sequence");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Rule::Repeat(_)));
        assert_eq!(
            prec_left(2, blank()),
            Rule::Prec {
                value: 2,
                assoc: Assoc::Left,
                rule: Box::new(Rule::Blank)
            }
        );
    }
}
