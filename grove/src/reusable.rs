use crate::subtree::Subtree;

#[derive(Clone, Debug)]
struct Entry {
    tree: Subtree,
    child_index: usize,
    byte_offset: usize,
}

/// Pre-order cursor over an old tree, yielding candidates for reuse.
///
/// The cursor only moves forward. `descend` steps into the first child of the
/// current subtree, `advance` moves past it to whatever follows.
#[derive(Clone, Debug, Default)]
pub struct ReusableNode {
    stack: Vec<Entry>,
}

impl ReusableNode {
    pub fn new(tree: Option<&Subtree>) -> Self {
        let mut node = Self::default();
        if let Some(tree) = tree {
            node.stack.push(Entry {
                tree: tree.clone(),
                child_index: 0,
                byte_offset: 0,
            });
        }
        node
    }

    pub fn tree(&self) -> Option<&Subtree> {
        self.stack.last().map(|e| &e.tree)
    }

    /// Start of the current subtree, including its padding.
    pub fn byte_offset(&self) -> usize {
        self.stack.last().map_or(usize::MAX, |e| e.byte_offset)
    }

    #[cfg(test)]
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Moves to the next subtree that is not inside the current one.
    pub fn advance(&mut self) {
        let Some(last) = self.stack.last() else {
            return;
        };
        let byte_offset = last.byte_offset + last.tree.total_bytes();
        loop {
            let Some(popped) = self.stack.pop() else {
                return;
            };
            let next_index = popped.child_index + 1;
            let Some(parent) = self.stack.last() else {
                return;
            };
            if let Some(next) = parent.tree.children().get(next_index) {
                let next = next.clone();
                self.stack.push(Entry {
                    tree: next,
                    child_index: next_index,
                    byte_offset,
                });
                return;
            }
        }
    }

    /// Steps into the first child; returns `false` at a leaf.
    pub fn descend(&mut self) -> bool {
        let Some(last) = self.stack.last() else {
            return false;
        };
        let Some(first) = last.tree.children().first() else {
            return false;
        };
        let entry = Entry {
            tree: first.clone(),
            child_index: 0,
            byte_offset: last.byte_offset,
        };
        self.stack.push(entry);
        true
    }

    pub fn advance_past_leaf(&mut self) {
        while self.descend() {}
        self.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::Length;
    use crate::lexer::Token;

    fn leaf(symbol: u16, text: &str) -> Subtree {
        let token = Token {
            symbol,
            padding: Length::of(b" "),
            size: Length::of(text.as_bytes()),
            lookahead_bytes: 1,
            extra: false,
            keyword: false,
        };
        Subtree::leaf(&token, 0, 0, false)
    }

    #[test]
    fn walks_in_pre_order() {
        let inner = Subtree::node(2, vec![leaf(5, "a"), leaf(6, "bc")], Some(1), 0, 0);
        let root = Subtree::node(1, vec![inner, leaf(7, "d")], Some(2), 0, 0);

        let mut node = ReusableNode::new(Some(&root));
        assert_eq!(node.byte_offset(), 0);
        assert!(node.descend());
        assert_eq!(node.tree().map(|t| t.symbol()), Some(2));
        assert!(node.descend());
        assert_eq!(node.tree().map(|t| t.symbol()), Some(5));
        assert!(!node.descend());

        node.advance();
        assert_eq!(node.tree().map(|t| t.symbol()), Some(6));
        assert_eq!(node.byte_offset(), 2);

        node.advance();
        assert_eq!(node.tree().map(|t| t.symbol()), Some(7));
        assert_eq!(node.byte_offset(), 5);

        node.advance();
        assert!(node.is_done());
        assert_eq!(node.byte_offset(), usize::MAX);
    }

    #[test]
    fn advance_past_leaf_skips_first_token() {
        let inner = Subtree::node(2, vec![leaf(5, "a"), leaf(6, "bc")], Some(1), 0, 0);
        let mut node = ReusableNode::new(Some(&inner));
        node.advance_past_leaf();
        assert_eq!(node.tree().map(|t| t.symbol()), Some(6));
    }
}
