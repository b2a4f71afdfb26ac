//! Plain-text dumps of the compiler's intermediate results.
//!
//! The formats are line oriented with a short record tag in front, so they
//! can be grepped and diffed:
//!
//! ```text
//! PS,<number of productions>
//! P,<index>,<LHS> -> <RHS symbols>
//! CS,<number of states>
//! C,<state>,<item>
//! FIRST,<symbol>,{<terminals>}
//! T,<state>,<symbol>,<action>
//! X,<state>,<symbol>,<kind>,<productions>
//! ```

use crate::flatten::FlatGrammar;
use crate::lr::{Automaton, Conflict, ConflictKind, ResolvedTab};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Writes the grammar productions, one per line.
pub fn write_prods<W: Write>(
    out: &mut W,
    prods: &[Vec<usize>],
    tokens: &[String],
) -> io::Result<()> {
    writeln!(out, "PS,{}\n", prods.len())?;
    for (i, prod) in prods.iter().enumerate() {
        write!(out, "P,{},", i)?;
        for (j, t) in prod.iter().enumerate() {
            write!(out, "{} ", tokens[*t])?;
            if j == 0 {
                write!(out, "-> ")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes every item of every LR(0) state, with the dot marked by `.`.
pub fn write_set<W: Write>(
    out: &mut W,
    automaton: &Automaton,
    prods: &[Vec<usize>],
    tokens: &[String],
) -> io::Result<()> {
    writeln!(out, "CS,{}\n", automaton.states.len())?;
    for (i, state) in automaton.states.iter().enumerate() {
        for item in state {
            write!(out, "C,{},", i)?;
            let p = &prods[item.prod];
            for (j, t) in p.iter().enumerate() {
                if j == item.dot {
                    write!(out, ". ")?;
                }
                write!(out, "{} ", tokens[*t])?;
                if j == 0 {
                    write!(out, "-> ")?;
                }
            }
            if p.len() == item.dot {
                write!(out, ". ")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes FIRST sets when `nullable` is given, FOLLOW sets otherwise.
pub fn write_fstflw<W: Write>(
    out: &mut W,
    vs: &[BTreeSet<usize>],
    nullable: Option<&[bool]>,
    tokens: &[String],
) -> io::Result<()> {
    let label = if nullable.is_some() { "FIRST" } else { "FOLLOW" };
    for (sym, set) in vs.iter().enumerate() {
        let dname = format!("${}", sym);
        let name = tokens.get(sym).unwrap_or(&dname);
        write!(out, "{},{},{{", label, name)?;
        if nullable.is_some_and(|n| n[sym]) {
            write!(out, "`empty', ")?;
        }
        for &t in set {
            let dname = format!("${}", t);
            let tname = tokens.get(t).unwrap_or(&dname);
            write!(out, "{}, ", tname)?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}

/// Writes the non-error cells of the resolved parse table.
pub fn write_table<W: Write>(out: &mut W, table: &ResolvedTab, tokens: &[String]) -> io::Result<()> {
    writeln!(out, "TS,{}\n", table.len())?;
    for (state, row) in table.iter().enumerate() {
        for (sym, act) in row.iter().enumerate() {
            let Some(act) = act else {
                continue;
            };
            writeln!(
                out,
                "T,{},{},{}({})",
                state,
                tokens[sym],
                act.typ.to_str(),
                act.val
            )?;
        }
    }
    Ok(())
}

/// One-line, human readable description of a conflict.
pub fn describe_conflict(grammar: &FlatGrammar, conflict: &Conflict) -> String {
    let kind = match conflict.kind {
        ConflictKind::ShiftReduce => "shift/reduce",
        ConflictKind::ReduceReduce => "reduce/reduce",
    };
    let prods: Vec<String> = conflict
        .productions
        .iter()
        .map(|&p| describe_production(grammar, p))
        .collect();
    format!(
        "{} conflict in state {} on `{}`: {}",
        kind,
        conflict.state,
        grammar.symbol_name(conflict.symbol),
        prods.join(" | ")
    )
}

fn describe_production(grammar: &FlatGrammar, p: usize) -> String {
    match grammar.productions.get(p) {
        Some(prod) => {
            let rhs: Vec<&str> = prod.rhs.iter().map(|&s| grammar.symbol_name(s)).collect();
            format!("{} -> {}", grammar.symbol_name(prod.lhs), rhs.join(" "))
        }
        None => format!("#{}", p),
    }
}

/// Writes every conflict, one per line.
pub fn write_conflicts<W: Write>(
    out: &mut W,
    grammar: &FlatGrammar,
    conflicts: &[Conflict],
) -> io::Result<()> {
    writeln!(out, "XS,{}\n", conflicts.len())?;
    for c in conflicts {
        writeln!(out, "X,{}", describe_conflict(grammar, c))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr::{Act, ActTyp, construct_set, first_sets, follow_sets};

    fn tokens() -> Vec<String> {
        ["start", "E", "+", "n", "end"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    // E → E + n | n
    fn prods() -> Vec<Vec<usize>> {
        vec![vec![0, 1], vec![1, 1, 2, 3], vec![1, 3]]
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn productions() {
        let text = render(|out| write_prods(out, &prods(), &tokens()));
        assert_eq!(text, "PS,3\n\nP,0,start -> E \nP,1,E -> E + n \nP,2,E -> n \n");
    }

    #[test]
    fn item_sets() {
        let automaton = construct_set(&prods(), 2);
        let text = render(|out| write_set(out, &automaton, &prods(), &tokens()));
        assert!(text.starts_with("CS,5\n\n"));
        assert!(text.contains("C,0,start -> . E \n"));
        assert!(text.contains("C,0,E -> . n \n"));
        assert!(text.contains("E -> E + n . \n"));
    }

    #[test]
    fn first_and_follow_sets() {
        let (first, nullable) = first_sets(&prods(), 2, 3);
        let follow = follow_sets(&prods(), 2, 3, 0, &first, &nullable);
        let text = render(|out| write_fstflw(out, &first, Some(&nullable), &tokens()));
        assert!(text.contains("FIRST,E,{n, }\n"));
        let text = render(|out| write_fstflw(out, &follow, None, &tokens()));
        assert!(text.contains("FOLLOW,E,{+, end, }\n"));
    }

    #[test]
    fn table_cells() {
        let table = vec![vec![None, Some(Act::new(ActTyp::Goto, 1)), None, Some(Act::new(ActTyp::Shift, 2)), None]];
        let text = render(|out| write_table(out, &table, &tokens()));
        assert_eq!(text, "TS,1\n\nT,0,E,Goto(1)\nT,0,n,Shift(2)\n");
    }
}
