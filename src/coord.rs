//! Grid coordinates and their textual `A1`..`J10` form.
//!
//! Rows are letters starting at `A`, columns are numbers starting at `1`.
//! Parsing is case-insensitive and ignores surrounding whitespace; `Display`
//! always renders the canonical upper-case form.

use alloc::string::ToString;
use core::fmt;
use core::str::FromStr;

use crate::common::BoardError;
use crate::config::BOARD_SIZE;

/// A cell on the `BOARD_SIZE`×`BOARD_SIZE` grid. Always in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Build a coordinate from zero-based row and column.
    pub fn new(row: usize, col: usize) -> Result<Self, BoardError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(BoardError::InvalidCoordinate(Self::label(row, col)));
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    /// Row-major cell index in `0..BOARD_SIZE * BOARD_SIZE`.
    pub fn index(&self) -> usize {
        self.row() * BOARD_SIZE + self.col()
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::new(idx / BOARD_SIZE, idx % BOARD_SIZE).ok()
    }

    /// Step `n` cells right (`vertical == false`) or down. `None` past the edge.
    pub fn step(&self, n: usize, vertical: bool) -> Option<Self> {
        let (r, c) = if vertical {
            (self.row() + n, self.col())
        } else {
            (self.row(), self.col() + n)
        };
        Self::new(r, c).ok()
    }

    /// Every cell of the grid in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE * BOARD_SIZE).filter_map(Self::from_index)
    }

    fn label(row: usize, col: usize) -> alloc::string::String {
        let mut s = alloc::string::String::new();
        if row < 26 {
            s.push((b'A' + row as u8) as char);
        } else {
            s.push('?');
        }
        s.push_str(&(col + 1).to_string());
        s
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.row) as char, self.col as usize + 1)
    }
}

impl FromStr for Coord {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BoardError::InvalidCoordinate(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let col: usize = digits.parse().map_err(|_| invalid())?;
        if col == 0 {
            return Err(invalid());
        }
        let row = (letter as u8 - b'A') as usize;
        Coord::new(row, col - 1).map_err(|_| invalid())
    }
}

#[cfg(feature = "std")]
impl serde::Serialize for Coord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
