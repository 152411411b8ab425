//! Board-level errors shared by coordinates, ships and fleet boards.

use alloc::string::String;

/// Errors returned by coordinate parsing and fleet placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate text could not be parsed or lies outside the grid.
    InvalidCoordinate(String),
    /// Ship index does not name a ship of the fleet.
    InvalidShipIndex(usize),
    /// Attempted to place a ship that is already placed.
    ShipAlreadyPlaced,
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// Ship would extend past the edge of the grid.
    ShipOutOfBounds,
    /// Random placement gave up after too many attempts.
    UnableToPlaceShip,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::InvalidCoordinate(raw) => write!(f, "Invalid coordinate {:?}", raw),
            BoardError::InvalidShipIndex(idx) => write!(f, "No ship with index {}", idx),
            BoardError::ShipAlreadyPlaced => write!(f, "Ship is already placed on the board"),
            BoardError::ShipOverlaps => write!(f, "Ship placement overlaps with another ship"),
            BoardError::ShipOutOfBounds => write!(f, "Ship placement is out of bounds"),
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
