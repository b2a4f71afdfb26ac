use std::ops::{Add, Sub};

/// A 0-based row/column position in source text.
///
/// `column` counts bytes from the start of the row, like tree-sitter points.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    /// 0-based row number.
    pub row: usize,
    /// 0-based byte offset within the row.
    pub column: usize,
}

impl Point {
    /// Creates a new `Point`.
    #[inline]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// An extent of text measured both in bytes and in rows/columns.
///
/// Subtrees store their padding and size as `Length`s relative to where they
/// start, so an edit only has to touch the nodes it overlaps.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Hash)]
pub struct Length {
    pub bytes: usize,
    pub extent: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: 0,
        extent: Point { row: 0, column: 0 },
    };

    #[inline]
    pub const fn new(bytes: usize, extent: Point) -> Self {
        Self { bytes, extent }
    }

    /// Measures `text`.
    pub fn of(text: &[u8]) -> Self {
        let mut len = Length::ZERO;
        for &b in text {
            len.advance(b);
        }
        len
    }

    /// Advance by consuming a byte `b`.
    #[inline]
    pub fn advance(&mut self, b: u8) {
        if b == b'\n' {
            self.extent.row += 1;
            self.extent.column = 0;
        } else {
            self.extent.column += 1;
        }
        self.bytes += 1;
    }

    /// Like `self - other`, but clamps to zero when `other` is longer.
    pub fn saturating_sub(self, other: Length) -> Length {
        if self.bytes > other.bytes {
            self - other
        } else {
            Length::ZERO
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.bytes == 0
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, other: Length) -> Length {
        let extent = if other.extent.row > 0 {
            Point::new(self.extent.row + other.extent.row, other.extent.column)
        } else {
            Point::new(self.extent.row, self.extent.column + other.extent.column)
        };
        Length::new(self.bytes + other.bytes, extent)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, other: Length) -> Length {
        let extent = if self.extent.row > other.extent.row {
            Point::new(self.extent.row - other.extent.row, self.extent.column)
        } else {
            Point::new(0, self.extent.column.saturating_sub(other.extent.column))
        };
        Length::new(self.bytes.saturating_sub(other.bytes), extent)
    }
}

/// A half-open source range `[start, end)` in both coordinate systems.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    /// Is this range empty?
    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// Pretty-print for diagnostics (human-readable).
    #[inline]
    pub fn display(&self) -> String {
        format!(
            "range {}:{} to {}:{}",
            self.start_point.row, self.start_point.column, self.end_point.row, self.end_point.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_rows_and_columns() {
        let len = Length::of(b"ab\ncde\nf");
        assert_eq!(len.bytes, 8);
        assert_eq!(len.extent, Point::new(2, 1));
    }

    #[test]
    fn add_carries_rows() {
        let a = Length::of(b"abc");
        let b = Length::of(b"d\nef");
        let sum = a + b;
        assert_eq!(sum, Length::of(b"abcd\nef"));

        let c = Length::of(b"xy");
        assert_eq!(a + c, Length::of(b"abcxy"));
    }

    #[test]
    fn sub_inverts_add() {
        let a = Length::of(b"select\n  a");
        let b = Length::of(b",\nb c");
        assert_eq!((a + b) - a, b);
        assert_eq!((a + b) - b, Length::new(a.bytes, Point::new(1, 3)));
    }

    #[test]
    fn saturating_sub_clamps() {
        let a = Length::of(b"ab");
        let b = Length::of(b"abcd");
        assert_eq!(a.saturating_sub(b), Length::ZERO);
        assert_eq!(b.saturating_sub(a), Length::of(b"cd"));
    }
}
