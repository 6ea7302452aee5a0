//! Position map for one source file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ast::Pos;

/// Maps a [`Pos`] to a human-addressable [`Position`].
///
/// `lines` holds the byte offset at which each line starts; the first entry is
/// always `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    pub filename: String,
    #[serde(default)]
    pub lines: Vec<u32>,
}

impl SourceMap {
    /// A map that knows the file name but no line structure.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            lines: vec![0],
        }
    }

    pub fn from_source(filename: impl Into<String>, source: &str) -> Self {
        let mut lines = vec![0];
        lines.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            filename: filename.into(),
            lines,
        }
    }

    /// Whether `lines` starts at offset `0` and is sorted.
    pub fn is_well_formed(&self) -> bool {
        self.lines.first() == Some(&0) && self.lines.windows(2).all(|w| w[0] <= w[1])
    }

    /// `Pos` of the given 1-based line and column, the inverse of [`position`](Self::position).
    pub fn pos(&self, line: usize, column: usize) -> Pos {
        match self.lines.get(line.wrapping_sub(1)) {
            Some(start) if column > 0 => Pos(start + column as u32),
            _ => Pos::NONE,
        }
    }

    pub fn position(&self, pos: Pos) -> Position {
        if !pos.is_valid() {
            return Position {
                filename: self.filename.clone(),
                line: 0,
                column: 0,
            };
        }
        let offset = pos.0 - 1;
        // Index of the last line starting at or before the offset.
        let line = match self.lines.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.lines.get(line).copied().unwrap_or(0);
        Position {
            filename: self.filename.clone(),
            line: line + 1,
            column: offset.saturating_sub(start) as usize + 1,
        }
    }
}

/// Resolved source position. `line == 0` means the position is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub filename: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.filename.is_empty(), self.is_valid()) {
            (false, true) => write!(f, "{}:{}:{}", self.filename, self.line, self.column),
            (true, true) => write!(f, "{}:{}", self.line, self.column),
            (false, false) => write!(f, "{}", self.filename),
            (true, false) => write!(f, "-"),
        }
    }
}
