use crate::language::FieldId;
use crate::node::{Child, Node};

struct Frame<'tree> {
    children: Vec<Child<'tree>>,
    index: usize,
}

/// Stateful walker over the visible nodes of a tree.
///
/// The cursor never leaves the node it was created from: `goto_parent` at
/// that node returns `false`.
pub struct TreeCursor<'tree> {
    root: Node<'tree>,
    stack: Vec<Frame<'tree>>,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(root: Node<'tree>) -> Self {
        Self {
            root,
            stack: Vec::new(),
        }
    }

    fn current(&self) -> Option<&Child<'tree>> {
        let frame = self.stack.last()?;
        frame.children.get(frame.index)
    }

    pub fn node(&self) -> Node<'tree> {
        match self.current() {
            Some(child) => Node::from_child(self.root.tree(), *child),
            None => self.root,
        }
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.current()?.field
    }

    pub fn field_name(&self) -> Option<&'tree str> {
        let id = self.field_id()?;
        self.root.tree().language().field_name_for_id(id)
    }

    /// Levels below the starting node.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn goto_first_child(&mut self) -> bool {
        let children = self.node().visible_children();
        if children.is_empty() {
            return false;
        }
        self.stack.push(Frame { children, index: 0 });
        true
    }

    pub fn goto_last_child(&mut self) -> bool {
        let children = self.node().visible_children();
        let Some(index) = children.len().checked_sub(1) else {
            return false;
        };
        self.stack.push(Frame { children, index });
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        match self.stack.last_mut() {
            Some(frame) if frame.index + 1 < frame.children.len() => {
                frame.index += 1;
                true
            }
            _ => false,
        }
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        match self.stack.last_mut() {
            Some(frame) if frame.index > 0 => {
                frame.index -= 1;
                true
            }
            _ => false,
        }
    }

    /// Moves to the first child that extends past `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let tree = self.root.tree();
        let children = self.node().visible_children();
        let index = children
            .iter()
            .position(|c| Node::from_child(tree, *c).end_byte() > byte)?;
        self.stack.push(Frame { children, index });
        Some(index)
    }

    /// Restarts the walk at `node`.
    pub fn reset(&mut self, node: Node<'tree>) {
        self.root = node;
        self.stack.clear();
    }
}
