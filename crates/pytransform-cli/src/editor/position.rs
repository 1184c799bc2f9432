//! Line/column positions and ranges over document text.
//!
//! Lines are separated by `\n`; columns count Unicode scalar values, so a
//! position never splits a character.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Zero-based line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, in characters.
    pub column: usize,
}

impl Position {
    /// Builds a position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Byte offset of this position within `text`, if it lies inside it.
    #[must_use]
    pub fn offset_in(self, text: &str) -> Option<usize> {
        let mut line_start = 0;
        for _ in 0..self.line {
            line_start += text.get(line_start..)?.find('\n')? + 1;
        }
        let line = text.get(line_start..)?;
        let line = line.split('\n').next().unwrap_or_default();
        if self.column == line.chars().count() {
            return Some(line_start + line.len());
        }
        line.char_indices()
            .nth(self.column)
            .map(|(index, _)| line_start + index)
    }
}

/// Half-open range `start..end` between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl TextRange {
    /// Builds a range.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range spanning all of `text`, from `(0, 0)` to the end of its last
    /// line.
    #[must_use]
    pub fn covering(text: &str) -> Self {
        let last_line = text.rsplit('\n').next().unwrap_or_default();
        let line = text.matches('\n').count();
        Self::new(
            Position::default(),
            Position::new(line, last_line.chars().count()),
        )
    }

    /// Whether the range selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The same span with `start` before `end`; a selection dragged
    /// backwards keeps its anchor as `start`.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.start > self.end {
            Self::new(self.end, self.start)
        } else {
            self
        }
    }

    /// Byte offsets of the range within `text`, if both ends lie inside it
    /// and are ordered.
    #[must_use]
    pub fn byte_span(&self, text: &str) -> Option<(usize, usize)> {
        let start = self.start.offset_in(text)?;
        let end = self.end.offset_in(text)?;
        (start <= end).then_some((start, end))
    }
}

impl fmt::Display for TextRange {
    /// Renders the one-based `L:C-L:C` form accepted by [`FromStr`].
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}-{}:{}",
            self.start.line + 1,
            self.start.column + 1,
            self.end.line + 1,
            self.end.column + 1
        )
    }
}

/// Errors raised when parsing a range from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid range '{input}': expected LINE:COLUMN-LINE:COLUMN with one-based numbers")]
pub struct RangeParseError {
    input: String,
}

impl FromStr for TextRange {
    type Err = RangeParseError;

    /// Parses one-based `L:C-L:C`, as editors display positions.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || RangeParseError {
            input: input.to_owned(),
        };
        let (start, end) = input.trim().split_once('-').ok_or_else(error)?;
        let start = parse_position(start).ok_or_else(error)?;
        let end = parse_position(end).ok_or_else(error)?;
        Ok(Self::new(start, end))
    }
}

fn parse_position(input: &str) -> Option<Position> {
    let (line, column) = input.split_once(':')?;
    let line: usize = line.trim().parse().ok()?;
    let column: usize = column.trim().parse().ok()?;
    Some(Position::new(line.checked_sub(1)?, column.checked_sub(1)?))
}
