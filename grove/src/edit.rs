use crate::length::{Length, Point};

/// Describes a single text replacement applied to a previously parsed document.
///
/// Byte offsets and points refer to the old text for `start` and `old_end`,
/// and to the new text for `new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Replaces `old_text[start..old_end]` with `new_text`.
    ///
    /// Returns the edit describing the change together with the resulting
    /// document, so callers don't have to compute points by hand.
    ///
    /// # Panics
    /// Panics if `start..old_end` is not a valid byte range of `old_text`.
    pub fn replace(old_text: &str, start: usize, old_end: usize, new_text: &str) -> (Self, String) {
        let prefix = Length::of(old_text[..start].as_bytes());
        let old_end_len = Length::of(old_text[..old_end].as_bytes());
        let new_end_len = prefix + Length::of(new_text.as_bytes());

        let mut text = String::with_capacity(old_text.len() - (old_end - start) + new_text.len());
        text.push_str(&old_text[..start]);
        text.push_str(new_text);
        text.push_str(&old_text[old_end..]);

        let edit = InputEdit {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: new_end_len.bytes,
            start_position: prefix.extent,
            old_end_position: old_end_len.extent,
            new_end_position: new_end_len.extent,
        };
        (edit, text)
    }

    /// Inserts `text` at byte offset `at`.
    pub fn insert(old_text: &str, at: usize, text: &str) -> (Self, String) {
        Self::replace(old_text, at, at, text)
    }

    /// Deletes `old_text[start..end]`.
    pub fn delete(old_text: &str, start: usize, end: usize) -> (Self, String) {
        Self::replace(old_text, start, end, "")
    }

    pub(crate) fn start(&self) -> Length {
        Length::new(self.start_byte, self.start_position)
    }

    pub(crate) fn old_end(&self) -> Length {
        Length::new(self.old_end_byte, self.old_end_position)
    }

    pub(crate) fn new_end(&self) -> Length {
        Length::new(self.new_end_byte, self.new_end_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_computes_points() {
        let old = "SELECT a\nFROM t";
        let (edit, new) = InputEdit::replace(old, 14, 15, "users\nx");
        assert_eq!(new, "SELECT a\nFROM users\nx");
        assert_eq!(edit.start_byte, 14);
        assert_eq!(edit.old_end_byte, 15);
        assert_eq!(edit.new_end_byte, 21);
        assert_eq!(edit.start_position, Point::new(1, 5));
        assert_eq!(edit.old_end_position, Point::new(1, 6));
        assert_eq!(edit.new_end_position, Point::new(2, 1));
    }

    #[test]
    fn insert_and_delete() {
        let (edit, new) = InputEdit::insert("ab", 1, "xy");
        assert_eq!(new, "axyb");
        assert_eq!(edit.old_end_byte, 1);
        assert_eq!(edit.new_end_byte, 3);

        let (edit, new) = InputEdit::delete("abcd", 1, 3);
        assert_eq!(new, "ad");
        assert_eq!(edit.new_end_byte, 1);
        assert_eq!(edit.old_end_position, Point::new(0, 3));
    }
}
