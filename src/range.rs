//! Byte/point ranges and edit deltas shared by every layer.

use crate::source::BufferId;
use std::fmt;

/// A zero-based row/column position. Columns are measured in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Compute the position of `byte` in `source`.
    ///
    /// Offsets past the end of the source are clamped to the end.
    pub fn at_byte(source: &str, byte: usize) -> Self {
        let bytes = &source.as_bytes()[..byte.min(source.len())];
        let row = bytes.iter().filter(|&&b| b == b'\n').count();
        let line_start = bytes
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |newline| newline + 1);
        Self {
            row,
            column: bytes.len() - line_start,
        }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(point: Point) -> Self {
        tree_sitter::Point::new(point.row, point.column)
    }
}

/// A half-open byte span `[start_byte, end_byte)` with matching points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl TextRange {
    pub fn new(start_byte: usize, end_byte: usize, start_point: Point, end_point: Point) -> Self {
        Self {
            start_byte,
            end_byte,
            start_point,
            end_point,
        }
    }

    /// Build a range from byte offsets, deriving points from `source`.
    pub fn from_bytes(source: &str, start_byte: usize, end_byte: usize) -> Self {
        Self::new(
            start_byte,
            end_byte,
            Point::at_byte(source, start_byte),
            Point::at_byte(source, end_byte),
        )
    }

    /// Build a range from byte offsets on a single line (row 0).
    ///
    /// Handy when points are irrelevant to the caller.
    pub fn bytes(start_byte: usize, end_byte: usize) -> Self {
        Self::new(
            start_byte,
            end_byte,
            Point::new(0, start_byte),
            Point::new(0, end_byte),
        )
    }

    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.end_byte <= self.start_byte
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains(&self, other: &TextRange) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// The overlapping part of two ranges, if any bytes are shared.
    pub fn intersection(&self, other: &TextRange) -> Option<TextRange> {
        let (start_byte, start_point) = if self.start_byte >= other.start_byte {
            (self.start_byte, self.start_point)
        } else {
            (other.start_byte, other.start_point)
        };
        let (end_byte, end_point) = if self.end_byte <= other.end_byte {
            (self.end_byte, self.end_point)
        } else {
            (other.end_byte, other.end_point)
        };

        (start_byte < end_byte).then_some(TextRange::new(
            start_byte, end_byte, start_point, end_point,
        ))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_byte, self.end_byte)
    }
}

impl From<tree_sitter::Range> for TextRange {
    fn from(range: tree_sitter::Range) -> Self {
        Self::new(
            range.start_byte,
            range.end_byte,
            range.start_point.into(),
            range.end_point.into(),
        )
    }
}

impl From<TextRange> for tree_sitter::Range {
    fn from(range: TextRange) -> Self {
        tree_sitter::Range {
            start_byte: range.start_byte,
            end_byte: range.end_byte,
            start_point: range.start_point.into(),
            end_point: range.end_point.into(),
        }
    }
}

/// Sort ranges by start, merge overlapping ones and drop empty ones.
///
/// Parsers require included ranges to be ordered and disjoint.
pub fn normalize_ranges(mut ranges: Vec<TextRange>) -> Vec<TextRange> {
    ranges.retain(|range| !range.is_empty());
    ranges.sort_by_key(|range| (range.start_byte, range.end_byte));

    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start_byte < last.end_byte => {
                if range.end_byte > last.end_byte {
                    last.end_byte = range.end_byte;
                    last.end_point = range.end_point;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Restrict `range` to the parts covered by `scope`.
///
/// An empty scope means "whole source" and returns the range unchanged.
pub fn clip_to_scope(range: &TextRange, scope: &[TextRange]) -> Vec<TextRange> {
    if scope.is_empty() {
        return if range.is_empty() {
            Vec::new()
        } else {
            vec![*range]
        };
    }
    scope
        .iter()
        .filter_map(|allowed| allowed.intersection(range))
        .collect()
}

/// Whether `range` lies inside `scope`. An empty scope covers everything.
pub fn scope_contains(scope: &[TextRange], range: &TextRange) -> bool {
    scope.is_empty() || scope.iter().any(|allowed| allowed.contains(range))
}

/// A single edit to the source, reported by the owning buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub buffer: BufferId,
    pub changedtick: u64,
    pub start_byte: usize,
    pub start_point: Point,
    pub old_end_byte: usize,
    pub old_end_point: Point,
    pub new_end_byte: usize,
    pub new_end_point: Point,
}

impl EditDelta {
    /// The region the edit replaced, in pre-edit coordinates.
    pub fn old_range(&self) -> TextRange {
        TextRange::new(
            self.start_byte,
            self.old_end_byte,
            self.start_point,
            self.old_end_point,
        )
    }

    /// The region the replacement occupies, in post-edit coordinates.
    pub fn new_range(&self) -> TextRange {
        TextRange::new(
            self.start_byte,
            self.new_end_byte,
            self.start_point,
            self.new_end_point,
        )
    }
}

impl From<&EditDelta> for tree_sitter::InputEdit {
    fn from(delta: &EditDelta) -> Self {
        tree_sitter::InputEdit {
            start_byte: delta.start_byte,
            old_end_byte: delta.old_end_byte,
            new_end_byte: delta.new_end_byte,
            start_position: delta.start_point.into(),
            old_end_position: delta.old_end_point.into(),
            new_end_position: delta.new_end_point.into(),
        }
    }
}
