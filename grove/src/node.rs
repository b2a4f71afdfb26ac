//! Positioned, read-only views of tree nodes.
//!
//! Hidden nodes (rules whose names start with `_`, auxiliary repetitions) are
//! never exposed: their children are spliced into the parent, and a field
//! attached to a hidden node is inherited by those children.

use crate::cursor::TreeCursor;
use crate::language::{FieldId, Language, Symbol};
use crate::length::{Length, Point, Range};
use crate::subtree::Subtree;
use crate::tree::Tree;
use std::fmt;

/// A syntax node: a subtree together with its absolute position.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    subtree: &'tree Subtree,
    /// Absolute start, padding included.
    offset: Length,
}

/// A visible child with its position and field.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Child<'tree> {
    pub subtree: &'tree Subtree,
    pub offset: Length,
    pub field: Option<FieldId>,
}

impl<'tree> Node<'tree> {
    pub(crate) fn new(tree: &'tree Tree, subtree: &'tree Subtree, offset: Length) -> Self {
        Self {
            tree,
            subtree,
            offset,
        }
    }

    pub(crate) fn from_child(tree: &'tree Tree, child: Child<'tree>) -> Self {
        Self::new(tree, child.subtree, child.offset)
    }

    pub fn tree(&self) -> &'tree Tree {
        self.tree
    }

    fn language(&self) -> &'tree Language {
        self.tree.language()
    }

    pub fn kind_id(&self) -> Symbol {
        self.subtree.symbol()
    }

    /// Node type name, e.g. `"select_statement"` or `"("`.
    pub fn kind(&self) -> &'tree str {
        self.language().symbol_name(self.kind_id()).unwrap_or("")
    }

    pub fn is_named(&self) -> bool {
        self.language().symbol_is_named(self.kind_id())
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    /// Was this node touched by an edit since it was parsed?
    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    fn start(&self) -> Length {
        self.offset + self.subtree.padding()
    }

    fn end(&self) -> Length {
        self.offset + self.subtree.total_size()
    }

    pub fn start_byte(&self) -> usize {
        self.start().bytes
    }

    pub fn end_byte(&self) -> usize {
        self.end().bytes
    }

    pub fn start_position(&self) -> Point {
        self.start().extent
    }

    pub fn end_position(&self) -> Point {
        self.end().extent
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn range(&self) -> Range {
        Range {
            start_byte: self.start_byte(),
            end_byte: self.end_byte(),
            start_point: self.start_position(),
            end_point: self.end_position(),
        }
    }

    /// The source text of this node.
    pub fn utf8_text<'a>(&self, source: &'a [u8]) -> Result<&'a str, std::str::Utf8Error> {
        let end = self.end_byte().min(source.len());
        let start = self.start_byte().min(end);
        std::str::from_utf8(&source[start..end])
    }

    pub(crate) fn visible_children(&self) -> Vec<Child<'tree>> {
        let mut out = Vec::new();
        collect_visible(self.language(), self.subtree, self.offset, None, &mut out);
        out
    }

    pub fn child_count(&self) -> usize {
        self.visible_children().len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        let child = *self.visible_children().get(index)?;
        Some(Node::from_child(self.tree, child))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'tree>> + use<'tree> {
        let tree = self.tree;
        self.visible_children()
            .into_iter()
            .map(move |c| Node::from_child(tree, c))
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + use<'tree> {
        self.children().filter(|n| n.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        let id = self.language().field_id_for_name(name)?;
        self.child_by_field_id(id)
    }

    pub fn child_by_field_id(&self, id: FieldId) -> Option<Node<'tree>> {
        let child = self
            .visible_children()
            .into_iter()
            .find(|c| c.field == Some(id))?;
        Some(Node::from_child(self.tree, child))
    }

    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'tree>> {
        let Some(id) = self.language().field_id_for_name(name) else {
            return Vec::new();
        };
        let tree = self.tree;
        self.visible_children()
            .into_iter()
            .filter(|c| c.field == Some(id))
            .map(|c| Node::from_child(tree, c))
            .collect()
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'tree str> {
        let field = self.visible_children().get(index)?.field?;
        self.language().field_name_for_id(field)
    }

    /// Same subtree at the same position.
    fn is_same(&self, other: &Node<'_>) -> bool {
        self.subtree.ptr_eq(other.subtree) && self.offset.bytes == other.offset.bytes
    }

    /// The visible children of this node's parent and its index among them.
    ///
    /// Descends from the root, building each level's child list once.
    fn locate(&self) -> Option<(Node<'tree>, Vec<Child<'tree>>, usize)> {
        let mut parent = self.tree.root_node();
        if parent.is_same(self) {
            return None;
        }
        let (start, end) = (self.offset.bytes, self.end_byte());
        loop {
            let children = parent.visible_children();
            if let Some(index) = children
                .iter()
                .position(|c| c.subtree.ptr_eq(self.subtree) && c.offset.bytes == start)
            {
                return Some((parent, children, index));
            }
            let next = children.iter().find(|c| {
                c.subtree.child_count() > 0
                    && c.offset.bytes <= start
                    && end <= (c.offset + c.subtree.total_size()).bytes
            })?;
            parent = Node::from_child(self.tree, *next);
        }
    }

    pub fn parent(&self) -> Option<Node<'tree>> {
        self.locate().map(|(parent, _, _)| parent)
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let (_, siblings, index) = self.locate()?;
        let child = *siblings.get(index + 1)?;
        Some(Node::from_child(self.tree, child))
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let (_, siblings, index) = self.locate()?;
        let child = *siblings.get(index.checked_sub(1)?)?;
        Some(Node::from_child(self.tree, child))
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let (_, siblings, index) = self.locate()?;
        siblings[index + 1..]
            .iter()
            .map(|c| Node::from_child(self.tree, *c))
            .find(|n| n.is_named())
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        let (_, siblings, index) = self.locate()?;
        siblings[..index]
            .iter()
            .rev()
            .map(|c| Node::from_child(self.tree, *c))
            .find(|n| n.is_named())
    }

    /// Nodes from `self` down to the smallest one spanning `start..end`.
    fn path_to_range(&self, start: usize, end: usize) -> Vec<Node<'tree>> {
        let mut path = vec![*self];
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if child.start_byte() <= start && end <= child.end_byte() {
                    if child.is_same(&node) {
                        break;
                    }
                    path.push(child);
                    node = child;
                    continue 'descend;
                }
            }
            return path;
        }
    }

    /// Smallest node spanning `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        self.path_to_range(start, end).pop()
    }

    /// Smallest named node spanning `start..end`.
    ///
    /// Falls back to ancestors above `self` when nothing below it is named.
    pub fn named_descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let path = self.path_to_range(start, end);
        if let Some(node) = path.iter().rev().find(|n| n.is_named()) {
            return Some(*node);
        }
        let mut node = self.parent()?;
        while !node.is_named() {
            node = node.parent()?;
        }
        Some(node)
    }

    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor::new(*self)
    }

    /// S-expression of this node and its named descendants, with field names.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        if !self.is_named() {
            out.push_str(&format!("(\"{}\")", self.kind()));
            return;
        }
        out.push('(');
        out.push_str(self.kind());
        for child in self.visible_children() {
            let node = Node::from_child(self.tree, child);
            if !node.is_named() {
                continue;
            }
            out.push(' ');
            if let Some(field) = child.field.and_then(|f| self.language().field_name_for_id(f)) {
                out.push_str(field);
                out.push_str(": ");
            }
            node.write_sexp(out);
        }
        out.push(')');
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.is_same(other)
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

fn collect_visible<'tree>(
    language: &Language,
    subtree: &'tree Subtree,
    offset: Length,
    inherited: Option<FieldId>,
    out: &mut Vec<Child<'tree>>,
) {
    let production = subtree.production().and_then(|p| language.production(p));
    let mut position = offset;
    let mut structural = 0;
    for child in subtree.children() {
        let field = if child.is_extra() {
            None
        } else {
            let own = production.and_then(|p| p.field_for_child(structural));
            structural += 1;
            own.or(inherited)
        };
        if child.is_error() || language.symbol_is_visible(child.symbol()) {
            out.push(Child {
                subtree: child,
                offset: position,
                field,
            });
        } else if child.child_count() > 0 {
            collect_visible(language, child, position, field, out);
        }
        position = position + child.total_size();
    }
}
