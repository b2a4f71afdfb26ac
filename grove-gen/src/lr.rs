// LR(0) item machinery, FIRST/FOLLOW computations, SLR(1) and LALR(1)
// lookaheads, and parse table construction with precedence-based conflict
// resolution.
//
// Productions are plain symbol vectors with the left-hand side at index 0,
// so an item's dot starts at 1.

use crate::grammar::Assoc;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An LR(0) item: a production with a marker (the *dot*) showing how much of
/// its right-hand side has been recognized.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    pub prod: usize,
    pub dot: usize,
}

pub type ItemSet = BTreeSet<Item>;

/// Production indices grouped by their left-hand side.
pub fn prods_by_lhs(prods: &[Vec<usize>], n_nonterm: usize) -> Vec<Vec<usize>> {
    let mut by_lhs = vec![Vec::new(); n_nonterm];
    for (i, p) in prods.iter().enumerate() {
        by_lhs[p[0]].push(i);
    }
    by_lhs
}

/// Computes the LR(0) closure of `items`: for every item with the dot in
/// front of a nonterminal, the initial items of that nonterminal's
/// productions are added until nothing new appears.
pub fn closure(
    items: &ItemSet,
    prods: &[Vec<usize>],
    by_lhs: &[Vec<usize>],
    n_nonterm: usize,
) -> ItemSet {
    let mut c = items.clone();
    let mut work: Vec<Item> = items.iter().cloned().collect();
    while let Some(item) = work.pop() {
        let Some(&t) = prods[item.prod].get(item.dot) else {
            continue;
        };
        if t >= n_nonterm {
            continue;
        }
        for &j in &by_lhs[t] {
            let new_item = Item { prod: j, dot: 1 };
            if c.insert(new_item.clone()) {
                work.push(new_item);
            }
        }
    }
    c
}

/// Computes the LR(0) goto of `items` on `sym`: the closure of all items
/// advanced past `sym`.
pub fn goto(
    items: &ItemSet,
    sym: usize,
    prods: &[Vec<usize>],
    by_lhs: &[Vec<usize>],
    n_nonterm: usize,
) -> ItemSet {
    let mut moved = ItemSet::new();
    for item in items {
        let p = &prods[item.prod];
        if item.dot < p.len() && p[item.dot] == sym {
            moved.insert(Item {
                prod: item.prod,
                dot: item.dot + 1,
            });
        }
    }
    closure(&moved, prods, by_lhs, n_nonterm)
}

/// The canonical collection of LR(0) item sets with its transitions.
#[derive(Clone, Debug)]
pub struct Automaton {
    pub states: Vec<ItemSet>,
    /// Symbol to target state, per state.
    pub transitions: Vec<BTreeMap<usize, usize>>,
}

/// Constructs the canonical collection of LR(0) item sets, starting from
/// the closure of `start → • <first rule>`. States are numbered in discovery
/// order, so state 0 is the start state.
pub fn construct_set(prods: &[Vec<usize>], n_nonterm: usize) -> Automaton {
    let by_lhs = prods_by_lhs(prods, n_nonterm);
    let start = closure(
        &ItemSet::from([Item { prod: 0, dot: 1 }]),
        prods,
        &by_lhs,
        n_nonterm,
    );
    let mut states = vec![start.clone()];
    let mut transitions = vec![BTreeMap::new()];
    let mut index: HashMap<ItemSet, usize> = HashMap::from([(start, 0)]);

    let mut i = 0;
    while i < states.len() {
        let mut moved: BTreeMap<usize, ItemSet> = BTreeMap::new();
        for item in &states[i] {
            if let Some(&sym) = prods[item.prod].get(item.dot) {
                moved.entry(sym).or_default().insert(Item {
                    prod: item.prod,
                    dot: item.dot + 1,
                });
            }
        }
        for (sym, kernel) in moved {
            let next = closure(&kernel, prods, &by_lhs, n_nonterm);
            let j = match index.get(&next) {
                Some(&j) => j,
                None => {
                    let j = states.len();
                    states.push(next.clone());
                    transitions.push(BTreeMap::new());
                    index.insert(next, j);
                    j
                }
            };
            transitions[i].insert(sym, j);
        }
        i += 1;
    }
    log::debug!("LR(0) automaton: {} states", states.len());
    Automaton {
        states,
        transitions,
    }
}

/// Computes FIRST sets and nullability for all grammar symbols.
pub fn first_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
) -> (Vec<BTreeSet<usize>>, Vec<bool>) {
    let n_sym = n_nonterm + n_term;
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_sym];
    let mut nullable = vec![false; n_sym];
    // Terminals: FIRST(t) = {t}
    for (t, set) in first.iter_mut().enumerate().skip(n_nonterm) {
        set.insert(t);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                // Clone FIRST(sym) to avoid simultaneous borrow
                let first_sym = first[sym].clone();
                for f in first_sym {
                    if first[lhs].insert(f) {
                        changed = true;
                    }
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}

/// Computes FOLLOW sets for all nonterminals. The start symbol is followed
/// by end of input, the last terminal.
pub fn follow_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
    start_sym: usize,
    first: &[BTreeSet<usize>],
    nullable: &[bool],
) -> Vec<BTreeSet<usize>> {
    let eos = n_nonterm + n_term - 1;
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nonterm];
    follow[start_sym].insert(eos);
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let rhs = &prod[1..];
            for (i, &b) in rhs.iter().enumerate() {
                if b >= n_nonterm {
                    continue;
                }
                let mut beta_nullable = true;
                let mut first_beta = BTreeSet::new();
                for &sym in &rhs[i + 1..] {
                    first_beta.extend(first[sym].iter().copied());
                    if !nullable[sym] {
                        beta_nullable = false;
                        break;
                    }
                }
                for f in first_beta {
                    if follow[b].insert(f) {
                        changed = true;
                    }
                }
                if beta_nullable {
                    let follow_lhs = follow[lhs].clone();
                    for f in follow_lhs {
                        if follow[b].insert(f) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    follow
}

/// A set of terminals, stored as a bitset over symbol ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TermSet {
    bits: Vec<u64>,
}

impl TermSet {
    pub fn with_symbols(n_sym: usize) -> Self {
        Self {
            bits: vec![0; n_sym.div_ceil(64)],
        }
    }

    pub fn insert(&mut self, sym: usize) -> bool {
        let (word, bit) = (sym / 64, 1u64 << (sym % 64));
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let fresh = self.bits[word] & bit == 0;
        self.bits[word] |= bit;
        fresh
    }

    pub fn contains(&self, sym: usize) -> bool {
        self.bits
            .get(sym / 64)
            .is_some_and(|w| w & (1u64 << (sym % 64)) != 0)
    }

    /// Adds every member of `other`; returns whether anything was new.
    pub fn union_with(&mut self, other: &TermSet) -> bool {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }
        let mut changed = false;
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            let merged = *a | *b;
            changed |= merged != *a;
            *a = merged;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(i, &w)| {
            (0..64)
                .filter(move |b| w & (1u64 << b) != 0)
                .map(move |b| i * 64 + b)
        })
    }
}

impl FromIterator<usize> for TermSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = TermSet::default();
        for sym in iter {
            set.insert(sym);
        }
        set
    }
}

/// Completed productions and their lookaheads, per state.
pub type Reductions = Vec<Vec<(usize, TermSet)>>;

fn complete_items<'a>(
    state: &'a ItemSet,
    prods: &'a [Vec<usize>],
) -> impl Iterator<Item = &'a Item> + 'a {
    state
        .iter()
        .filter(move |item| item.dot == prods[item.prod].len())
}

/// SLR(1): a completed production reduces on FOLLOW of its left-hand side.
pub fn slr_reductions(
    automaton: &Automaton,
    prods: &[Vec<usize>],
    follow: &[BTreeSet<usize>],
) -> Reductions {
    automaton
        .states
        .iter()
        .map(|state| {
            complete_items(state, prods)
                .map(|item| {
                    let lhs = prods[item.prod][0];
                    (item.prod, follow[lhs].iter().copied().collect())
                })
                .collect()
        })
        .collect()
}

/// LALR(1): lookaheads are propagated over the LR(0) automaton until they
/// reach a fixpoint.
///
/// Within a state, `[A → α • B β, L]` gives every `[B → • γ]` the lookahead
/// FIRST(β), plus `L` when β is nullable. Along a transition the lookahead of
/// an item carries over to the advanced item in the target state.
pub fn lalr_reductions(
    automaton: &Automaton,
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
) -> Reductions {
    let n_sym = n_nonterm + n_term;
    let eos = n_sym - 1;
    let by_lhs = prods_by_lhs(prods, n_nonterm);
    let (first, nullable) = first_sets(prods, n_nonterm, n_term);

    // FIRST and nullability of every production suffix p[k..].
    let suffix: Vec<Vec<(TermSet, bool)>> = prods
        .iter()
        .map(|p| {
            let mut out = vec![(TermSet::with_symbols(n_sym), true); p.len() + 1];
            for k in (1..p.len()).rev() {
                let sym = p[k];
                let mut set: TermSet = first[sym].iter().copied().collect();
                let tail_nullable = nullable[sym] && out[k + 1].1;
                if nullable[sym] {
                    let tail = out[k + 1].0.clone();
                    set.union_with(&tail);
                }
                out[k] = (set, tail_nullable);
            }
            out
        })
        .collect();

    let items: Vec<Vec<Item>> = automaton
        .states
        .iter()
        .map(|s| s.iter().cloned().collect())
        .collect();
    let pos: Vec<HashMap<Item, usize>> = items
        .iter()
        .map(|s| s.iter().cloned().enumerate().map(|(i, it)| (it, i)).collect())
        .collect();
    let mut la: Vec<Vec<TermSet>> = items
        .iter()
        .map(|s| vec![TermSet::with_symbols(n_sym); s.len()])
        .collect();

    if let Some(&k) = pos[0].get(&Item { prod: 0, dot: 1 }) {
        la[0][k].insert(eos);
    }
    let mut work = vec![0];
    let mut queued = vec![false; items.len()];
    queued[0] = true;

    while let Some(s) = work.pop() {
        queued[s] = false;

        let mut changed = true;
        while changed {
            changed = false;
            for (i, item) in items[s].iter().enumerate() {
                let Some(&b) = prods[item.prod].get(item.dot) else {
                    continue;
                };
                if b >= n_nonterm {
                    continue;
                }
                let (first_beta, nullable_beta) = &suffix[item.prod][item.dot + 1];
                let mut add = first_beta.clone();
                if *nullable_beta {
                    add.union_with(&la[s][i]);
                }
                for &j in &by_lhs[b] {
                    if let Some(&k) = pos[s].get(&Item { prod: j, dot: 1 }) {
                        changed |= la[s][k].union_with(&add);
                    }
                }
            }
        }

        for (i, item) in items[s].iter().enumerate() {
            let Some(&x) = prods[item.prod].get(item.dot) else {
                continue;
            };
            let Some(&t) = automaton.transitions[s].get(&x) else {
                continue;
            };
            let advanced = Item {
                prod: item.prod,
                dot: item.dot + 1,
            };
            let Some(&k) = pos[t].get(&advanced) else {
                continue;
            };
            let src = la[s][i].clone();
            if la[t][k].union_with(&src) && !queued[t] {
                queued[t] = true;
                work.push(t);
            }
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(s, state)| {
            state
                .iter()
                .enumerate()
                .filter(|(_, item)| item.dot == prods[item.prod].len())
                .map(|(i, item)| (item.prod, la[s][i].clone()))
                .collect()
        })
        .collect()
}

/// Represents the type of parser action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActTyp {
    /// Accept action: the input is a complete sentence.
    Accept = 1,
    /// Shift action: pushes a new state onto the stack.
    Shift = 2,
    /// Reduce action: applies a grammar production.
    Reduce = 3,
    /// Goto action: transitions on a nonterminal.
    Goto = 5,
}

impl ActTyp {
    pub fn to_str(self) -> &'static str {
        match self {
            ActTyp::Accept => "Accept",
            ActTyp::Shift => "Shift",
            ActTyp::Reduce => "Reduce",
            ActTyp::Goto => "Goto",
        }
    }
}

/// A parse action: its type plus a state or production index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Act {
    pub typ: ActTyp,
    pub val: usize,
}

impl Act {
    pub fn new(typ: ActTyp, val: usize) -> Self {
        Act { typ, val }
    }
}

/// Candidate actions per state and symbol, before conflict resolution.
pub type Tab = Vec<Vec<BTreeSet<Act>>>;

/// Fills shifts and gotos from the automaton's transitions and reduces from
/// `reductions`. Completing production 0 accepts.
pub fn construct_table(
    automaton: &Automaton,
    reductions: &Reductions,
    n_nonterm: usize,
    n_term: usize,
) -> Tab {
    let n_sym = n_nonterm + n_term;
    let eos = n_sym - 1;
    let mut tab: Tab = vec![vec![BTreeSet::new(); n_sym]; automaton.states.len()];
    for (state, row) in tab.iter_mut().enumerate() {
        for (&sym, &next) in &automaton.transitions[state] {
            let typ = if sym < n_nonterm {
                ActTyp::Goto
            } else {
                ActTyp::Shift
            };
            row[sym].insert(Act::new(typ, next));
        }
        for (prod, lookahead) in &reductions[state] {
            for t in lookahead.iter().filter(|&t| t < n_sym) {
                if *prod == 0 {
                    if t == eos {
                        row[t].insert(Act::new(ActTyp::Accept, 0));
                    }
                } else {
                    row[t].insert(Act::new(ActTyp::Reduce, *prod));
                }
            }
        }
    }
    tab
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// An ambiguity that precedence and associativity did not settle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: usize,
    /// The lookahead token.
    pub symbol: usize,
    pub kind: ConflictKind,
    /// Productions involved: reduced ones and, for shift/reduce, the ones
    /// whose items shift the token.
    pub productions: Vec<usize>,
}

/// The resolved table: at most one action per cell.
pub type ResolvedTab = Vec<Vec<Option<Act>>>;

/// Picks one action per cell.
///
/// Reduce/reduce: the higher production precedence wins, a tie goes to the
/// lowest production and is reported. Shift/reduce: the reduced
/// production's precedence is compared with the highest precedence among the
/// items shifting the token; on a tie, left associativity reduces, right
/// associativity shifts, and no associativity shifts and is reported.
pub fn resolve(
    tab: &Tab,
    automaton: &Automaton,
    prods: &[Vec<usize>],
    prec: &[(i32, Assoc)],
) -> (ResolvedTab, Vec<Conflict>) {
    let mut conflicts = Vec::new();
    let resolved = tab
        .iter()
        .enumerate()
        .map(|(state, row)| {
            row.iter()
                .enumerate()
                .map(|(symbol, acts)| {
                    if acts.len() <= 1 {
                        return acts.iter().next().copied();
                    }
                    resolve_cell(state, symbol, acts, automaton, prods, prec, &mut conflicts)
                })
                .collect()
        })
        .collect();
    (resolved, conflicts)
}

fn resolve_cell(
    state: usize,
    symbol: usize,
    acts: &BTreeSet<Act>,
    automaton: &Automaton,
    prods: &[Vec<usize>],
    prec: &[(i32, Assoc)],
    conflicts: &mut Vec<Conflict>,
) -> Option<Act> {
    let prec_of = |p: usize| prec.get(p).copied().unwrap_or((0, Assoc::None));
    let shift = acts.iter().find(|a| a.typ == ActTyp::Shift).copied();
    let reduces: Vec<Act> = acts
        .iter()
        .filter(|a| matches!(a.typ, ActTyp::Reduce | ActTyp::Accept))
        .copied()
        .collect();
    let prod_of = |a: &Act| if a.typ == ActTyp::Accept { 0 } else { a.val };

    let reduce = if reduces.len() > 1 {
        let best = reduces.iter().map(|a| prec_of(prod_of(a)).0).max()?;
        let top: Vec<Act> = reduces
            .iter()
            .filter(|a| prec_of(prod_of(a)).0 == best)
            .copied()
            .collect();
        if top.len() > 1 {
            conflicts.push(Conflict {
                state,
                symbol,
                kind: ConflictKind::ReduceReduce,
                productions: top.iter().map(prod_of).collect(),
            });
        }
        top.into_iter().min_by_key(prod_of)
    } else {
        reduces.first().copied()
    };

    let (Some(shift), Some(reduce)) = (shift, reduce) else {
        return shift.or(reduce);
    };

    let shifting: Vec<usize> = automaton.states[state]
        .iter()
        .filter(|item| prods[item.prod].get(item.dot) == Some(&symbol))
        .map(|item| item.prod)
        .collect();
    let shift_prec = shifting.iter().map(|&p| prec_of(p).0).max().unwrap_or(0);
    let (reduce_prec, assoc) = prec_of(prod_of(&reduce));

    if reduce_prec > shift_prec {
        return Some(reduce);
    }
    if reduce_prec < shift_prec {
        return Some(shift);
    }
    match assoc {
        Assoc::Left => Some(reduce),
        Assoc::Right => Some(shift),
        Assoc::None => {
            let mut productions = vec![prod_of(&reduce)];
            productions.extend(shifting);
            productions.sort_unstable();
            productions.dedup();
            conflicts.push(Conflict {
                state,
                symbol,
                kind: ConflictKind::ShiftReduce,
                productions,
            });
            Some(shift)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 start, 1 E, 2 '+', 3 '*', 4 n, 5 end
    fn expr_prods() -> Vec<Vec<usize>> {
        vec![vec![0, 1], vec![1, 1, 2, 1], vec![1, 1, 3, 1], vec![1, 4]]
    }

    // 0 start, 1 S, 2 L, 3 R, 4 '=', 5 '*', 6 id, 7 end
    //   S → L = R | R;  L → * R | id;  R → L
    fn lalr_only_prods() -> Vec<Vec<usize>> {
        vec![
            vec![0, 1],
            vec![1, 2, 4, 3],
            vec![1, 3],
            vec![2, 5, 3],
            vec![2, 6],
            vec![3, 2],
        ]
    }

    fn build(
        prods: &[Vec<usize>],
        n_nonterm: usize,
        n_term: usize,
        prec: &[(i32, Assoc)],
        lalr: bool,
    ) -> (Automaton, ResolvedTab, Vec<Conflict>) {
        let automaton = construct_set(prods, n_nonterm);
        let reductions = if lalr {
            lalr_reductions(&automaton, prods, n_nonterm, n_term)
        } else {
            let (first, nullable) = first_sets(prods, n_nonterm, n_term);
            let follow = follow_sets(prods, n_nonterm, n_term, 0, &first, &nullable);
            slr_reductions(&automaton, prods, &follow)
        };
        let tab = construct_table(&automaton, &reductions, n_nonterm, n_term);
        let (resolved, conflicts) = resolve(&tab, &automaton, prods, prec);
        (automaton, resolved, conflicts)
    }

    #[test]
    fn closure_adds_initial_items() {
        let prods = expr_prods();
        let by_lhs = prods_by_lhs(&prods, 2);
        let c = closure(&ItemSet::from([Item { prod: 0, dot: 1 }]), &prods, &by_lhs, 2);
        let expected: ItemSet = (0..4).map(|prod| Item { prod, dot: 1 }).collect();
        assert_eq!(c, expected);

        let g = goto(&c, 4, &prods, &by_lhs, 2);
        assert_eq!(g, ItemSet::from([Item { prod: 3, dot: 2 }]));
    }

    #[test]
    fn canonical_collection_of_expression_grammar() {
        let automaton = construct_set(&expr_prods(), 2);
        assert_eq!(automaton.states.len(), 7);
        assert_eq!(automaton.transitions[0].get(&1), Some(&1));
        assert_eq!(automaton.transitions[0].get(&4), Some(&2));
        assert_eq!(automaton.transitions[3].get(&4), Some(&2));
        assert!(automaton.transitions[2].is_empty());
    }

    #[test]
    fn first_and_follow() {
        let prods = vec![
            // 0 start, 1 S, 2 A, 3 a, 4 b, 5 end;  S → A b | A;  A → a | ε
            vec![0, 1],
            vec![1, 2, 4],
            vec![1, 2],
            vec![2, 3],
            vec![2],
        ];
        let (first, nullable) = first_sets(&prods, 3, 3);
        assert_eq!(first[1], BTreeSet::from([3, 4]));
        assert_eq!(first[2], BTreeSet::from([3]));
        assert!(nullable[1] && nullable[2] && !nullable[3]);

        let follow = follow_sets(&prods, 3, 3, 0, &first, &nullable);
        assert_eq!(follow[0], BTreeSet::from([5]));
        assert_eq!(follow[1], BTreeSet::from([5]));
        assert_eq!(follow[2], BTreeSet::from([4, 5]));
    }

    #[test]
    fn term_set_operations() {
        let mut a = TermSet::with_symbols(10);
        assert!(a.is_empty());
        assert!(a.insert(3));
        assert!(!a.insert(3));
        assert!(a.insert(70));
        let b: TermSet = [1, 3].into_iter().collect();
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), [1, 3, 70]);
        assert!(a.contains(70) && !a.contains(2) && !a.contains(500));
    }

    #[test]
    fn ambiguous_expressions_conflict_without_precedence() {
        let (_, _, conflicts) = build(&expr_prods(), 2, 4, &[], true);
        assert_eq!(conflicts.len(), 4);
        assert!(conflicts.iter().all(|c| c.kind == ConflictKind::ShiftReduce));
    }

    #[test]
    fn precedence_and_associativity_resolve_conflicts() {
        let prec = [
            (0, Assoc::None),
            (1, Assoc::Left),
            (2, Assoc::Left),
            (0, Assoc::None),
        ];
        let (automaton, table, conflicts) = build(&expr_prods(), 2, 4, &prec, true);
        assert!(conflicts.is_empty());
        // State 5 holds E → E + E •; state 6 holds E → E * E •.
        assert!(automaton.states[5].contains(&Item { prod: 1, dot: 4 }));
        assert_eq!(table[5][3], Some(Act::new(ActTyp::Shift, 4)));
        assert_eq!(table[5][2], Some(Act::new(ActTyp::Reduce, 1)));
        assert_eq!(table[6][2], Some(Act::new(ActTyp::Reduce, 2)));
        assert_eq!(table[6][3], Some(Act::new(ActTyp::Reduce, 2)));
        assert_eq!(table[1][5], Some(Act::new(ActTyp::Accept, 0)));
        assert_eq!(table[0][1], Some(Act::new(ActTyp::Goto, 1)));
    }

    #[test]
    fn right_associativity_shifts() {
        let prec = [(0, Assoc::None), (1, Assoc::Right), (1, Assoc::Right), (0, Assoc::None)];
        let (_, table, conflicts) = build(&expr_prods(), 2, 4, &prec, true);
        assert!(conflicts.is_empty());
        assert_eq!(table[5][2], Some(Act::new(ActTyp::Shift, 3)));
    }

    #[test]
    fn lalr_resolves_what_slr_cannot() {
        let prods = lalr_only_prods();
        let (_, _, slr) = build(&prods, 4, 4, &[], false);
        assert_eq!(slr.len(), 1);
        assert_eq!(slr[0].symbol, 4);
        assert_eq!(slr[0].kind, ConflictKind::ShiftReduce);

        let (_, _, lalr) = build(&prods, 4, 4, &[], true);
        assert!(lalr.is_empty());
    }

    #[test]
    fn reduce_reduce_conflicts() {
        // 0 start, 1 S, 2 A, 3 B, 4 x, 5 end;  S → A | B;  A → x;  B → x
        let prods = vec![
            vec![0, 1],
            vec![1, 2],
            vec![1, 3],
            vec![2, 4],
            vec![3, 4],
        ];
        let (automaton, table, conflicts) = build(&prods, 4, 2, &[], true);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ReduceReduce);
        assert_eq!(conflicts[0].productions, vec![3, 4]);
        let state = automaton.transitions[0][&4];
        assert_eq!(table[state][5], Some(Act::new(ActTyp::Reduce, 3)));

        let prec = [
            (0, Assoc::None),
            (0, Assoc::None),
            (0, Assoc::None),
            (0, Assoc::None),
            (1, Assoc::None),
        ];
        let (_, table, conflicts) = build(&prods, 4, 2, &prec, true);
        assert!(conflicts.is_empty());
        assert_eq!(table[state][5], Some(Act::new(ActTyp::Reduce, 4)));
    }
}
