//! Immutable, reference-counted concrete syntax tree nodes.
//!
//! Positions are relative: every subtree knows the whitespace in front of it
//! (`padding`) and its own `size`, but not where it starts. Editing a tree
//! therefore only rebuilds the spine of nodes that overlap the edit, and
//! untouched subtrees are shared between the old and the new tree.

use crate::language::{ProductionId, StateId, Symbol};
use crate::length::Length;
use crate::lexer::Token;
use std::sync::Arc;

/// The first token inside a subtree, as seen by the parser when it decides
/// whether the subtree may be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirstLeaf {
    pub symbol: Symbol,
    pub lex_mode: u16,
    /// End of the leaf's lookahead, relative to the subtree start.
    pub end_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct SubtreeData {
    pub symbol: Symbol,
    pub padding: Length,
    pub size: Length,
    pub lookahead_bytes: usize,
    /// State on top of the stack when this subtree was pushed.
    pub parse_state: StateId,
    pub production: Option<ProductionId>,
    pub children: Vec<Subtree>,
    pub extra: bool,
    pub is_error: bool,
    pub has_error: bool,
    pub has_changes: bool,
    pub first_leaf: Option<FirstLeaf>,
}

#[derive(Clone, Debug)]
pub struct Subtree(Arc<SubtreeData>);

impl Subtree {
    /// Wraps a freshly lexed token.
    pub fn leaf(token: &Token, parse_state: StateId, lex_mode: u16, is_error: bool) -> Self {
        Subtree(Arc::new(SubtreeData {
            symbol: token.symbol,
            padding: token.padding,
            size: token.size,
            lookahead_bytes: token.lookahead_bytes,
            parse_state,
            production: None,
            children: Vec::new(),
            extra: token.extra,
            is_error,
            has_error: is_error,
            has_changes: false,
            first_leaf: Some(FirstLeaf {
                symbol: token.symbol,
                lex_mode,
                end_bytes: token.padding.bytes + token.size.bytes + token.lookahead_bytes,
            }),
        }))
    }

    /// Builds an interior node over `children`.
    ///
    /// `lookahead_end` is the end of the lookahead token that triggered the
    /// reduction, relative to the node start; the node depends on it.
    pub fn node(
        symbol: Symbol,
        children: Vec<Subtree>,
        production: Option<ProductionId>,
        parse_state: StateId,
        lookahead_end: usize,
    ) -> Self {
        let mut data = SubtreeData {
            symbol,
            padding: Length::ZERO,
            size: Length::ZERO,
            lookahead_bytes: 0,
            parse_state,
            production,
            children,
            extra: false,
            is_error: false,
            has_error: false,
            has_changes: false,
            first_leaf: None,
        };
        data.summarize(lookahead_end);
        Subtree(Arc::new(data))
    }

    /// Builds an `ERROR` node; error regions are attached as extras.
    pub fn error(symbol: Symbol, children: Vec<Subtree>, parse_state: StateId) -> Self {
        let mut data = SubtreeData {
            symbol,
            padding: Length::ZERO,
            size: Length::ZERO,
            lookahead_bytes: 0,
            parse_state,
            production: None,
            children,
            extra: true,
            is_error: true,
            has_error: true,
            has_changes: false,
            first_leaf: None,
        };
        data.summarize(0);
        Subtree(Arc::new(data))
    }

    pub fn data(&self) -> &SubtreeData {
        &self.0
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    #[inline]
    pub fn padding(&self) -> Length {
        self.0.padding
    }

    #[inline]
    pub fn size(&self) -> Length {
        self.0.size
    }

    #[inline]
    pub fn total_size(&self) -> Length {
        self.0.padding + self.0.size
    }

    #[inline]
    pub fn total_bytes(&self) -> usize {
        self.0.padding.bytes + self.0.size.bytes
    }

    #[inline]
    pub fn lookahead_bytes(&self) -> usize {
        self.0.lookahead_bytes
    }

    #[inline]
    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    #[inline]
    pub fn production(&self) -> Option<ProductionId> {
        self.0.production
    }

    #[inline]
    pub fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.0.children.is_empty() && self.0.production.is_none() && !self.0.is_error
    }

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.0.extra
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.0.is_error
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.0.has_error
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.0.has_changes
    }

    #[inline]
    pub fn first_leaf(&self) -> Option<FirstLeaf> {
        self.0.first_leaf
    }

    /// Symbol of the first token, which is what the parse table is indexed by.
    pub fn leaf_symbol(&self) -> Symbol {
        self.0.first_leaf.map_or(self.0.symbol, |l| l.symbol)
    }

    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of this subtree pushed from a different state.
    pub fn with_parse_state(&self, parse_state: StateId) -> Subtree {
        if self.0.parse_state == parse_state {
            return self.clone();
        }
        let mut data = (*self.0).clone();
        data.parse_state = parse_state;
        Subtree(Arc::new(data))
    }

    pub fn with_extra(&self, extra: bool) -> Subtree {
        if self.0.extra == extra {
            return self.clone();
        }
        let mut data = (*self.0).clone();
        data.extra = extra;
        Subtree(Arc::new(data))
    }

    /// Copy of this subtree with `children` replaced, e.g. to add extras.
    pub fn with_children(&self, children: Vec<Subtree>) -> Subtree {
        let mut data = (*self.0).clone();
        let lookahead_end = self.total_bytes() + self.0.lookahead_bytes;
        data.children = children;
        data.summarize(lookahead_end);
        Subtree(Arc::new(data))
    }

    /// Applies `edit`, given in coordinates relative to this subtree's start.
    ///
    /// Every subtree whose text or lookahead overlaps the edit is copied,
    /// resized and flagged `has_changes`; the rest is shared with `self`.
    pub(crate) fn edit(&self, edit: &Edit) -> Subtree {
        let is_noop = edit.old_end.bytes == edit.start.bytes && edit.new_end.bytes == edit.start.bytes;
        let is_pure_insertion = edit.old_end.bytes == edit.start.bytes;

        let mut padding = self.padding();
        let mut size = self.size();
        let total_size = padding + size;
        let end_byte = total_size.bytes + self.lookahead_bytes();
        if edit.start.bytes > end_byte || (is_noop && edit.start.bytes == end_byte) {
            return self.clone();
        }

        if edit.old_end.bytes <= padding.bytes {
            // Entirely within the padding: shift without resizing.
            padding = edit.new_end + (padding - edit.old_end);
        } else if edit.start.bytes < padding.bytes {
            // Starts in the padding, ends in the content.
            size = size.saturating_sub(edit.old_end - padding);
            padding = edit.new_end;
        } else if edit.start.bytes < total_size.bytes
            || (edit.start.bytes == total_size.bytes && is_pure_insertion)
        {
            size = (edit.new_end - padding) + total_size.saturating_sub(edit.old_end);
        }

        let mut data = (*self.0).clone();
        data.padding = padding;
        data.size = size;
        data.has_changes = true;

        let mut edit = *edit;
        let mut child_right = Length::ZERO;
        for (i, child) in self.0.children.iter().enumerate() {
            let child_size = child.total_size();
            let child_left = child_right;
            child_right = child_left + child_size;

            if child_right.bytes + child.lookahead_bytes() < edit.start.bytes {
                continue;
            }
            if child_left.bytes > edit.old_end.bytes
                || (child_left.bytes == edit.old_end.bytes && child_size.bytes > 0 && i > 0)
            {
                break;
            }

            let mut child_edit = Edit {
                start: edit.start.saturating_sub(child_left),
                old_end: edit.old_end.saturating_sub(child_left),
                new_end: edit.new_end.saturating_sub(child_left),
            };

            // Inserted text goes to the first child touching the edit; later
            // children only shrink.
            if child_right.bytes > edit.start.bytes
                || (child_right.bytes == edit.start.bytes && is_pure_insertion)
            {
                edit.new_end = edit.start;
            } else {
                child_edit.old_end = child_edit.start;
                child_edit.new_end = child_edit.start;
            }

            data.children[i] = child.edit(&child_edit);
        }

        Subtree(Arc::new(data))
    }
}

impl SubtreeData {
    fn summarize(&mut self, lookahead_end: usize) {
        let mut total = Length::ZERO;
        let mut lookahead_end = lookahead_end;
        let mut has_error = self.is_error;
        let mut first_leaf = None;
        for (i, child) in self.children.iter().enumerate() {
            if i == 0 {
                self.padding = child.padding();
            }
            if first_leaf.is_none() {
                first_leaf = child.first_leaf().map(|l| FirstLeaf {
                    end_bytes: l.end_bytes + total.bytes,
                    ..l
                });
            }
            lookahead_end =
                lookahead_end.max(total.bytes + child.total_bytes() + child.lookahead_bytes());
            total = total + child.total_size();
            has_error |= child.has_error();
        }
        if self.children.is_empty() {
            self.padding = Length::ZERO;
        }
        self.size = total - self.padding;
        self.lookahead_bytes = lookahead_end.saturating_sub(total.bytes);
        self.has_error = has_error;
        if !self.is_error {
            self.first_leaf = first_leaf;
        }
    }
}

/// An edit in subtree-relative coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edit {
    pub start: Length,
    pub old_end: Length,
    pub new_end: Length,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::Point;

    fn token(symbol: Symbol, padding: &str, text: &str) -> Token {
        Token {
            symbol,
            padding: Length::of(padding.as_bytes()),
            size: Length::of(text.as_bytes()),
            lookahead_bytes: 1,
            extra: false,
            keyword: false,
        }
    }

    // "a + b" as [a][ +][ b] under one node.
    fn sample() -> Subtree {
        let a = Subtree::leaf(&token(10, "", "a"), 0, 0, false);
        let plus = Subtree::leaf(&token(11, " ", "+"), 1, 0, false);
        let b = Subtree::leaf(&token(10, " ", "b"), 2, 0, false);
        Subtree::node(3, vec![a, plus, b], Some(1), 0, 0)
    }

    fn edit(start: usize, old_end: usize, new_end: usize) -> Edit {
        Edit {
            start: Length::new(start, Point::new(0, start)),
            old_end: Length::new(old_end, Point::new(0, old_end)),
            new_end: Length::new(new_end, Point::new(0, new_end)),
        }
    }

    #[test]
    fn node_summarizes_children() {
        let tree = sample();
        assert_eq!(tree.padding(), Length::ZERO);
        assert_eq!(tree.size().bytes, 5);
        assert_eq!(tree.lookahead_bytes(), 1);
        assert_eq!(tree.leaf_symbol(), 10);
        assert_eq!(tree.first_leaf().map(|l| l.end_bytes), Some(2));
        assert!(!tree.has_error());
    }

    #[test]
    fn node_lookahead_covers_reduction_lookahead() {
        let a = Subtree::leaf(&token(10, "", "a"), 0, 0, false);
        let node = Subtree::node(3, vec![a], Some(1), 0, 4);
        assert_eq!(node.lookahead_bytes(), 3);
    }

    #[test]
    fn edit_inside_last_child() {
        let tree = sample();
        // "a + b" -> "a + bcd"
        let edited = tree.edit(&edit(5, 5, 7));
        assert!(edited.has_changes());
        assert_eq!(edited.size().bytes, 7);
        let children = edited.children();
        assert!(!children[0].has_changes());
        assert!(children[0].ptr_eq(&tree.children()[0]));
        assert!(children[2].has_changes());
        assert_eq!(children[2].size().bytes, 3);
    }

    #[test]
    fn edit_in_padding_shifts_child() {
        let tree = sample();
        // "a + b" -> "a +   b"
        let edited = tree.edit(&edit(4, 4, 6));
        assert_eq!(edited.size().bytes, 7);
        let b = &edited.children()[2];
        assert_eq!(b.padding().bytes, 3);
        assert_eq!(b.size().bytes, 1);
        // the "+" only looked at the space before the insertion point
        assert!(!edited.children()[1].has_changes());
        assert!(edited.children()[1].ptr_eq(&tree.children()[1]));
    }

    #[test]
    fn edit_far_after_node_is_ignored() {
        let tree = sample();
        let edited = tree.edit(&edit(20, 21, 25));
        assert!(edited.ptr_eq(&tree));
    }

    #[test]
    fn deletion_shrinks_following_children() {
        let tree = sample();
        // "a + b" -> "a b": delete "+ " (bytes 2..4)
        let edited = tree.edit(&edit(2, 4, 2));
        assert_eq!(edited.size().bytes, 3);
        let plus = &edited.children()[1];
        assert_eq!(plus.total_bytes(), 1);
    }

    #[test]
    fn error_nodes_are_extra() {
        let a = Subtree::leaf(&token(10, " ", "a"), 0, 0, false);
        let err = Subtree::error(99, vec![a], 0);
        assert!(err.is_extra());
        assert!(err.is_error());
        assert!(err.has_error());
        assert_eq!(err.padding().bytes, 1);
        assert_eq!(err.size().bytes, 1);
        assert!(err.first_leaf().is_none());
    }
}
