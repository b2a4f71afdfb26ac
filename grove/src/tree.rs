use crate::cursor::TreeCursor;
use crate::edit::InputEdit;
use crate::language::Language;
use crate::length::Length;
use crate::node::Node;
use crate::subtree::{Edit, Subtree};
use std::fmt;

/// The result of a parse: an immutable syntax tree plus its language.
///
/// Cloning is cheap; clones share all nodes. [`Tree::edit`] rewrites only the
/// spine of nodes touched by the edit.
#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language) -> Self {
        Self { root, language }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, &self.root, Length::ZERO)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Raw root subtree, including the end token.
    pub fn root_subtree(&self) -> &Subtree {
        &self.root
    }

    /// Records an edit of the source text so that the next parse can reuse
    /// the parts of this tree the edit did not touch.
    pub fn edit(&mut self, edit: &InputEdit) {
        log::debug!(
            "edit: {}..{} -> {}..{}",
            edit.start_byte,
            edit.old_end_byte,
            edit.start_byte,
            edit.new_end_byte
        );
        self.root = self.root.edit(&Edit {
            start: edit.start(),
            old_end: edit.old_end(),
            new_end: edit.new_end(),
        });
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    /// S-expression of the named nodes, e.g. `(list (number))`.
    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {}}}", self.to_sexp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::test_language::list_language;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn edit_marks_touched_nodes() {
        init_logger();
        let mut parser = Parser::new();
        parser.set_language(&list_language()).unwrap();
        let text = "1 2 3 4";
        let mut tree = parser.parse(text, None).unwrap();
        let old = tree.clone();

        let (edit, _) = InputEdit::replace(text, 6, 7, "44");
        tree.edit(&edit);
        let root = tree.root_node();
        assert!(root.has_changes());
        assert_eq!(root.end_byte(), 8);
        // The innermost list ends well before the edit and its lookahead.
        let first = root
            .child(0)
            .and_then(|n| n.child(0))
            .and_then(|n| n.child(0))
            .unwrap();
        assert_eq!(first.kind(), "list");
        assert!(!first.has_changes());
        // The old tree is untouched.
        assert!(!old.root_node().has_changes());
        assert_eq!(old.root_node().end_byte(), 7);
    }

    #[test]
    fn debug_shows_sexp() {
        let mut parser = Parser::new();
        parser.set_language(&list_language()).unwrap();
        let tree = parser.parse("7", None).unwrap();
        assert_eq!(format!("{:?}", tree), "{Tree (list (number))}");
    }
}
