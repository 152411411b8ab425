//! Ship definitions and placement on the grid.

use crate::bitboard::BitBoard;
use crate::common::BoardError;
use crate::config::BOARD_SIZE;
use crate::coord::Coord;

/// Cell set sized for the standard grid.
pub type Grid = BitBoard<u128, BOARD_SIZE>;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipType {
    name: &'static str,
    length: usize,
}

impl ShipType {
    /// Create a new ship type.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// A ship placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    ship_type: ShipType,
    orientation: Orientation,
    origin: Coord,
    cells: Grid,
}

impl Ship {
    /// Place a ship with its bow at `origin`, extending right or down.
    pub fn new(
        ship_type: ShipType,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<Self, BoardError> {
        let vertical = orientation == Orientation::Vertical;
        let mut cells = Grid::new();
        for i in 0..ship_type.length() {
            let cell = origin.step(i, vertical).ok_or(BoardError::ShipOutOfBounds)?;
            cells.insert(cell);
        }
        Ok(Ship {
            ship_type,
            orientation,
            origin,
            cells,
        })
    }

    pub fn ship_type(&self) -> ShipType {
        self.ship_type
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Cells covered by the ship.
    pub fn cells(&self) -> Grid {
        self.cells
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(coord)
    }
}
