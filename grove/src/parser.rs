//! Incremental LR parser driver.
//!
//! The driver runs the language's deterministic LR table over tokens produced
//! by the context-aware [`Lexer`]. Given the edited tree from a previous
//! parse, it reuses unchanged subtrees instead of relexing and reparsing the
//! text they cover. Syntax errors never abort a parse: offending tokens and
//! abandoned stack regions are wrapped in `ERROR` nodes and parsing resumes.

use crate::error::{LanguageError, ParseError};
use crate::language::{LANGUAGE_VERSION, Language, ParseAction, ProductionId, StateId, Symbol};
use crate::length::Length;
use crate::lexer::{Lexer, LexerStats};
use crate::reusable::ReusableNode;
use crate::subtree::Subtree;
use crate::tree::Tree;

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    /// Tokens produced by the lexer, extras included.
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    /// Subtrees taken over from the old tree.
    pub reused_nodes: usize,
    /// Times error recovery was entered.
    pub errors: usize,
}

/// Parses text into [`Tree`]s with a single assigned [`Language`].
///
/// A parser is not shared between threads; create one per thread. The
/// language and the trees it produces are immutable and may be shared freely.
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<Language>,
    stats: ParserStats,
    lexer_stats: LexerStats,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the language used by subsequent parses.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        if language.version() != LANGUAGE_VERSION {
            return Err(LanguageError::IncompatibleVersion {
                found: language.version(),
                expected: LANGUAGE_VERSION,
            });
        }
        self.language = Some(language.clone());
        Ok(())
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Counters from the most recent parse.
    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    pub fn lexer_stats(&self) -> LexerStats {
        self.lexer_stats.clone()
    }

    /// Clears the counters; the language stays assigned.
    pub fn reset(&mut self) {
        self.stats = ParserStats::default();
        self.lexer_stats = LexerStats::default();
    }

    /// Parses `text`.
    ///
    /// When `old_tree` is given it must already reflect every edit made to
    /// the text since it was produced (see [`Tree::edit`]); its unchanged
    /// subtrees are then reused. An old tree built with a different language
    /// is ignored.
    pub fn parse(
        &mut self,
        text: impl AsRef<[u8]>,
        old_tree: Option<&Tree>,
    ) -> Result<Tree, ParseError> {
        let language = self.language.clone().ok_or(ParseError::NoLanguage)?;
        let text = text.as_ref();
        let old_root = old_tree
            .filter(|tree| tree.language().ptr_eq(&language))
            .map(|tree| tree.root_subtree());

        let mut run = Run::new(&language, text, old_root);
        let root = run.parse()?;
        self.stats = run.stats.clone();
        self.lexer_stats = run.lexer.stats();
        log::debug!(
            "parsed {} bytes{}: {:?}",
            text.len(),
            if old_root.is_some() { " incrementally" } else { "" },
            self.stats
        );
        Ok(Tree::new(root, language))
    }
}

#[derive(Debug)]
struct StackEntry {
    state: StateId,
    /// `None` only for the bottom entry.
    subtree: Option<Subtree>,
    /// Extras and error regions that follow `subtree`.
    extras: Vec<Subtree>,
    /// Absolute end of this entry, extras included.
    end: Length,
}

#[derive(Debug)]
struct Lookahead {
    subtree: Subtree,
    /// Absolute start, padding included.
    start: Length,
    reused: bool,
}

impl Lookahead {
    /// Absolute end of the text the first token depended on.
    fn dependency_end(&self) -> usize {
        let relative = self.subtree.first_leaf().map_or(
            self.subtree.total_bytes() + self.subtree.lookahead_bytes(),
            |leaf| leaf.end_bytes,
        );
        self.start.bytes + relative
    }
}

enum Recovery {
    /// Try the same lookahead again on the repaired stack.
    Retry(Lookahead),
    /// The lookahead was consumed into an error region.
    Skipped,
    /// Nothing could be recovered before the end of input.
    Done(Subtree),
}

struct Run<'a> {
    language: &'a Language,
    lexer: Lexer<'a>,
    reusable: ReusableNode,
    stack: Vec<StackEntry>,
    stats: ParserStats,
    last_error: Option<usize>,
    no_reuse_at: Option<usize>,
}

impl<'a> Run<'a> {
    fn new(language: &'a Language, text: &'a [u8], old_root: Option<&Subtree>) -> Self {
        let mut reusable = ReusableNode::new(old_root);
        // The root itself carries the end token and is never reused whole.
        reusable.descend();
        Self {
            language,
            lexer: Lexer::new(language, text),
            reusable,
            stack: vec![StackEntry {
                state: language.start_state(),
                subtree: None,
                extras: Vec::new(),
                end: Length::ZERO,
            }],
            stats: ParserStats::default(),
            last_error: None,
            no_reuse_at: None,
        }
    }

    fn top_state(&self) -> StateId {
        self.stack.last().map_or(self.language.start_state(), |e| e.state)
    }

    fn parse(&mut self) -> Result<Subtree, ParseError> {
        let mut lookahead: Option<Lookahead> = None;
        loop {
            let state = self.top_state();
            let la = match lookahead.take() {
                Some(la) => la,
                None => self.next_lookahead(state)?,
            };

            if la.subtree.is_extra() && !la.reused {
                self.push_extra(la.subtree);
                continue;
            }

            if log::log_enabled!(log::Level::Trace) {
                self.dump_state(&la);
            }

            let action = self.language.action(state, la.subtree.leaf_symbol());
            match action {
                ParseAction::Shift(next) => {
                    log::trace!("Shift {}", next);
                    self.shift(state, next, la)?;
                }
                ParseAction::Reduce(production) => {
                    self.reduce(production, &la)?;
                    lookahead = Some(la);
                }
                ParseAction::Accept => {
                    log::trace!("Accept");
                    return self.accept(la);
                }
                ParseAction::Error | ParseAction::Goto(_) => {
                    if la.reused {
                        // The old subtree does not fit here; lex its text afresh.
                        self.no_reuse_at = Some(la.start.bytes);
                        self.lexer.seek(la.start);
                        continue;
                    }
                    match self.recover(state, la)? {
                        Recovery::Retry(la) => lookahead = Some(la),
                        Recovery::Skipped => {}
                        Recovery::Done(root) => return Ok(root),
                    }
                }
            }
        }
    }

    fn next_lookahead(&mut self, state: StateId) -> Result<Lookahead, ParseError> {
        let start = self.lexer.position();
        if let Some(subtree) = self.reuse_node(state, start.bytes) {
            log::trace!(
                "Reuse {:?} at {}",
                self.language.symbol_name(subtree.symbol()),
                start.bytes
            );
            return Ok(Lookahead {
                subtree,
                start,
                reused: true,
            });
        }

        let language = self.language;
        let mode = language.lex_mode_for_state(state);
        let token = self.lexer.next_token(language.lex_mode(mode))?;
        self.stats.tokens += 1;
        let is_error = token.symbol == language.error_symbol();
        Ok(Lookahead {
            subtree: Subtree::leaf(&token, state, mode, is_error),
            start,
            reused: false,
        })
    }

    /// Finds a subtree of the old tree that starts at `position` and can be
    /// pushed in `state` without changing the outcome of the parse.
    fn reuse_node(&mut self, state: StateId, position: usize) -> Option<Subtree> {
        if self.no_reuse_at == Some(position) {
            return None;
        }
        while let Some(tree) = self.reusable.tree().cloned() {
            let byte_offset = self.reusable.byte_offset();
            let end_byte = byte_offset + tree.total_bytes();
            if byte_offset > position {
                break;
            }
            if byte_offset < position {
                if end_byte <= position || !self.reusable.descend() {
                    self.reusable.advance();
                }
                continue;
            }

            let Some(leaf) = tree.first_leaf() else {
                if !self.reusable.descend() {
                    self.reusable.advance();
                }
                continue;
            };
            if tree.has_changes() || tree.has_error() || tree.is_extra() || tree.size().is_zero() {
                if !self.reusable.descend() {
                    self.reusable.advance();
                }
                continue;
            }

            if leaf.lex_mode != self.language.lex_mode_for_state(state)
                || self.language.action(state, leaf.symbol).is_error()
            {
                self.reusable.advance_past_leaf();
                break;
            }
            return Some(tree);
        }
        None
    }

    fn shift(&mut self, state: StateId, next: StateId, la: Lookahead) -> Result<(), ParseError> {
        let start = la.start;
        let (subtree, next) = if la.reused {
            match self.breakdown(state) {
                Some(found) => found,
                None => {
                    self.no_reuse_at = Some(start.bytes);
                    self.lexer.seek(start);
                    return Ok(());
                }
            }
        } else {
            (la.subtree, next)
        };

        let end = start + subtree.total_size();
        if la.reused {
            self.stats.reused_nodes += 1;
            self.reusable.advance();
            self.lexer.seek(end);
        }
        self.stats.shifts += 1;
        self.stack.push(StackEntry {
            state: next,
            subtree: Some(subtree.with_parse_state(state)),
            extras: Vec::new(),
            end,
        });
        Ok(())
    }

    /// Descends into the reusable subtree until it reaches one that was
    /// originally pushed from `state`, or a single token.
    fn breakdown(&mut self, state: StateId) -> Option<(Subtree, StateId)> {
        loop {
            let tree = self.reusable.tree()?.clone();
            if tree.child_count() == 0 {
                return match self.language.action(state, tree.symbol()) {
                    ParseAction::Shift(next) if tree.is_leaf() => Some((tree, next)),
                    _ => None,
                };
            }
            if tree.parse_state() == state {
                if let ParseAction::Goto(next) = self.language.action(state, tree.symbol()) {
                    return Some((tree, next));
                }
            }
            if !self.reusable.descend() {
                return None;
            }
        }
    }

    fn reduce(&mut self, production_id: ProductionId, la: &Lookahead) -> Result<(), ParseError> {
        let language = self.language;
        let production = language.production(production_id).ok_or_else(|| {
            ParseError::Internal(format!("unknown production {}", production_id))
        })?;
        let count = production.child_count as usize;
        if self.stack.len() <= count {
            return Err(ParseError::Internal(format!(
                "stack underflow reducing production {}",
                production_id
            )));
        }

        let base = self.stack.len() - count;
        let popped: Vec<StackEntry> = self.stack.drain(base..).collect();
        let popped_end = popped.last().map(|e| e.end);
        let mut children = Vec::with_capacity(count);
        let mut trailing = Vec::new();
        for (i, entry) in popped.into_iter().enumerate() {
            children.extend(entry.subtree);
            if i + 1 == count {
                trailing = entry.extras;
            } else {
                children.extend(entry.extras);
            }
        }

        let Some(below) = self.stack.last() else {
            return Err(ParseError::Internal("empty stack".into()));
        };
        let state = below.state;
        let start = below.end;
        let lookahead_end = la.dependency_end().saturating_sub(start.bytes);
        let node = Subtree::node(
            production.lhs,
            children,
            Some(production_id),
            state,
            lookahead_end,
        );
        let next = match language.action(state, production.lhs) {
            ParseAction::Goto(next) => next,
            other => {
                return Err(ParseError::Internal(format!(
                    "no goto for {:?} in state {}: {:?}",
                    language.symbol_name(production.lhs),
                    state,
                    other
                )));
            }
        };
        log::trace!(
            "Reduce {} ({:?}/{})",
            production_id,
            language.symbol_name(production.lhs),
            count
        );

        self.stats.reductions += 1;
        self.stack.push(StackEntry {
            state: next,
            subtree: Some(node),
            extras: trailing,
            end: popped_end.unwrap_or(start),
        });
        Ok(())
    }

    fn push_extra(&mut self, extra: Subtree) {
        if let Some(top) = self.stack.last_mut() {
            top.end = top.end + extra.total_size();
            top.extras.push(extra.with_parse_state(top.state));
        }
    }

    /// Builds the root from the accepted node, attaching leading and trailing
    /// extras and the end token so the root spans the whole input.
    fn accept(&mut self, la: Lookahead) -> Result<Subtree, ParseError> {
        if self.stack.len() != 2 {
            return Err(ParseError::Internal(format!(
                "accept with {} stack entries",
                self.stack.len()
            )));
        }
        let mut stack = std::mem::take(&mut self.stack);
        let (Some(entry), Some(bottom)) = (stack.pop(), stack.pop()) else {
            return Err(ParseError::Internal("empty stack".into()));
        };
        let Some(root) = entry.subtree else {
            return Err(ParseError::Internal("accept without a node".into()));
        };

        let mut children = bottom.extras;
        children.extend(root.children().iter().cloned());
        children.extend(entry.extras);
        children.push(la.subtree.with_extra(true));
        Ok(root.with_children(children))
    }

    fn recover(&mut self, state: StateId, la: Lookahead) -> Result<Recovery, ParseError> {
        self.stats.errors += 1;
        let language = self.language;
        let symbol = la.subtree.symbol();
        let end = language.end_symbol();
        let position = la.start.bytes;
        let repeated = self.last_error == Some(position);
        self.last_error = Some(position);
        log::trace!(
            "Error in state {} on {:?} at {}{}",
            state,
            language.symbol_name(symbol),
            position,
            if repeated { " (again)" } else { "" }
        );

        if !repeated && symbol != language.error_symbol() {
            if symbol != end && self.next_token_fits(state)? {
                self.skip(la);
                return Ok(Recovery::Skipped);
            }
            if let Some(depth) = self.recovery_depth(symbol) {
                self.pop_into_error(depth);
                return Ok(Recovery::Retry(la));
            }
        }

        if symbol == end {
            return Ok(Recovery::Done(self.error_root(la)));
        }
        self.skip(la);
        Ok(Recovery::Skipped)
    }

    /// Would the token after the current lookahead be accepted in `state`?
    fn next_token_fits(&mut self, state: StateId) -> Result<bool, ParseError> {
        let language = self.language;
        let saved = self.lexer.position();
        let valid = language.lex_mode(language.lex_mode_for_state(state));
        let mut token = self.lexer.next_token(valid)?;
        while token.extra {
            token = self.lexer.next_token(valid)?;
        }
        self.lexer.seek(saved);
        Ok(!language.action(state, token.symbol).is_error())
    }

    /// Deepest-from-top stack index whose state has an action for `symbol`.
    fn recovery_depth(&self, symbol: Symbol) -> Option<usize> {
        let top = self.stack.len().checked_sub(1)?;
        (0..top)
            .rev()
            .find(|&i| !self.language.action(self.stack[i].state, symbol).is_error())
    }

    /// Pops every entry above `depth` into an `ERROR` extra on that entry.
    fn pop_into_error(&mut self, depth: usize) {
        let error_symbol = self.language.error_symbol();
        let popped: Vec<StackEntry> = self.stack.drain(depth + 1..).collect();
        let Some(end) = popped.last().map(|e| e.end) else {
            return;
        };
        let mut children = Vec::new();
        for entry in popped {
            children.extend(entry.subtree);
            children.extend(entry.extras);
        }
        let top = &mut self.stack[depth];
        log::trace!("Pop {} subtrees into ERROR", children.len());
        append_error(&mut top.extras, error_symbol, children, top.state);
        top.end = end;
    }

    /// Consumes the lookahead into an `ERROR` extra on the stack top.
    fn skip(&mut self, la: Lookahead) {
        let error_symbol = self.language.error_symbol();
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        top.end = top.end + la.subtree.total_size();
        let token = la.subtree.with_parse_state(top.state);
        log::trace!("Skip {} bytes at {}", token.total_bytes(), la.start.bytes);
        if token.is_error() && !matches!(top.extras.last(), Some(last) if last.is_error()) {
            top.extras.push(token.with_extra(true));
        } else {
            append_error(&mut top.extras, error_symbol, vec![token], top.state);
        }
    }

    /// Wraps everything parsed so far, plus the end token, in an `ERROR` root.
    fn error_root(&mut self, la: Lookahead) -> Subtree {
        let mut children = Vec::new();
        for entry in self.stack.drain(..) {
            children.extend(entry.subtree);
            children.extend(entry.extras);
        }
        children.push(la.subtree.with_extra(true));
        Subtree::error(
            self.language.error_symbol(),
            children,
            self.language.start_state(),
        )
        .with_extra(false)
    }

    fn dump_state(&self, la: &Lookahead) {
        let language = self.language;
        let mut output = String::new();
        for entry in &self.stack {
            output.push_str(&format!("<{}>  ", entry.state));
            if let Some(subtree) = &entry.subtree {
                output.push_str(language.symbol_name(subtree.symbol()).unwrap_or("?"));
                output.push_str("  ");
            }
        }
        output.push_str(&format!(
            "<-  {}{}",
            language.symbol_name(la.subtree.symbol()).unwrap_or("?"),
            if la.reused { " (reused)" } else { "" }
        ));
        log::trace!("{}", output);
    }
}

/// Adds `children` to the error region ending `extras`, opening a new one if
/// the last extra is not an error.
fn append_error(
    extras: &mut Vec<Subtree>,
    error_symbol: Symbol,
    children: Vec<Subtree>,
    state: StateId,
) {
    match extras.last_mut() {
        Some(last) if last.is_error() => {
            let mut merged = if last.child_count() == 0 {
                vec![last.clone()]
            } else {
                last.children().to_vec()
            };
            merged.extend(children);
            *last = Subtree::error(error_symbol, merged, state);
        }
        _ => extras.push(Subtree::error(error_symbol, children, state)),
    }
}
