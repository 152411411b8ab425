//! Fleet boards: the read-only ship layout a game resolves shots against.
//!
//! The round engine only ever talks to the [`ShipBoard`] trait. [`FleetBoard`]
//! is the stock implementation over the standard [`FLEET`].

use core::fmt;
use rand::Rng;

use crate::common::BoardError;
use crate::config::{BOARD_SIZE, FLEET, NUM_SHIPS};
use crate::coord::Coord;
use crate::ship::{Grid, Orientation, Ship};

/// Index of a ship within its board, `0..ship_count()`.
pub type ShipId = usize;

/// Board-query capability consumed by the round engine.
pub trait ShipBoard: Send + Sync {
    /// Ship occupying `coord`, if any.
    fn has_ship_at(&self, coord: Coord) -> Option<ShipId>;

    /// Number of cells of `ship`; zero for an unknown or unplaced ship.
    fn ship_length(&self, ship: ShipId) -> usize;

    /// Display name of `ship`.
    fn ship_name(&self, ship: ShipId) -> &str;

    /// Number of ships the board defines.
    fn ship_count(&self) -> usize;
}

/// Ship placements for the standard fleet.
#[derive(Clone, PartialEq, Eq)]
pub struct FleetBoard {
    ships: [Option<Ship>; NUM_SHIPS],
    occupied: Grid,
}

impl FleetBoard {
    /// Create an empty board (no ships placed).
    pub fn new() -> Self {
        FleetBoard {
            ships: [None; NUM_SHIPS],
            occupied: Grid::new(),
        }
    }

    /// Board with every ship of the fleet placed at random.
    pub fn random<R: Rng>(rng: &mut R) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for i in 0..NUM_SHIPS {
            let (origin, orientation) = board.random_placement(rng, i)?;
            board.place(i, origin, orientation)?;
        }
        Ok(board)
    }

    /// Union of every placed ship's cells.
    pub fn occupied(&self) -> Grid {
        self.occupied
    }

    pub fn ship(&self, index: usize) -> Option<&Ship> {
        self.ships.get(index).and_then(Option::as_ref)
    }

    /// `true` once every ship of the fleet is on the board.
    pub fn is_complete(&self) -> bool {
        self.ships.iter().all(Option::is_some)
    }

    /// Place fleet ship `index` with its bow at `origin`.
    pub fn place(
        &mut self,
        index: usize,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), BoardError> {
        let slot = self
            .ships
            .get(index)
            .ok_or(BoardError::InvalidShipIndex(index))?;
        if slot.is_some() {
            return Err(BoardError::ShipAlreadyPlaced);
        }
        let ship = Ship::new(FLEET[index], origin, orientation)?;
        if !(self.occupied & ship.cells()).is_empty() {
            return Err(BoardError::ShipOverlaps);
        }
        self.occupied |= ship.cells();
        self.ships[index] = Some(ship);
        Ok(())
    }

    /// Returns a random non-overlapping origin and orientation for ship `index`.
    pub fn random_placement<R: Rng>(
        &self,
        rng: &mut R,
        index: usize,
    ) -> Result<(Coord, Orientation), BoardError> {
        let def = FLEET.get(index).ok_or(BoardError::InvalidShipIndex(index))?;
        for _ in 0..100 {
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orient {
                Orientation::Vertical => (BOARD_SIZE - def.length(), BOARD_SIZE - 1),
                Orientation::Horizontal => (BOARD_SIZE - 1, BOARD_SIZE - def.length()),
            };
            let origin = Coord::new(rng.random_range(0..=max_r), rng.random_range(0..=max_c))?;
            let ship = Ship::new(*def, origin, orient)?;
            if (self.occupied & ship.cells()).is_empty() {
                return Ok((origin, orient));
            }
        }
        Err(BoardError::UnableToPlaceShip)
    }
}

impl Default for FleetBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipBoard for FleetBoard {
    fn has_ship_at(&self, coord: Coord) -> Option<ShipId> {
        if !self.occupied.contains(coord) {
            return None;
        }
        self.ships
            .iter()
            .position(|s| s.is_some_and(|s| s.contains(coord)))
    }

    fn ship_length(&self, ship: ShipId) -> usize {
        self.ship(ship).map_or(0, |s| s.ship_type().length())
    }

    fn ship_name(&self, ship: ShipId) -> &str {
        FLEET.get(ship).map_or("", |def| def.name())
    }

    fn ship_count(&self) -> usize {
        NUM_SHIPS
    }
}

impl fmt::Debug for FleetBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FleetBoard {{ occupied: {:?}, ships: {:?} }}", self.occupied, self.ships)
    }
}
