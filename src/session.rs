//! A match between two players and the boards they brought to it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::board::ShipBoard;
use crate::error::{Error, Result};
use crate::registry::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GameId(u64);

impl GameId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for GameId {
    fn from(raw: u64) -> Self {
        GameId(raw)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// Seat 0 is the player who sent the game request, seat 1 the one who
/// accepted it. Boards are read-only once placed.
#[derive(Clone)]
pub struct GameSession {
    id: GameId,
    players: [PlayerId; 2],
    boards: [Option<Arc<dyn ShipBoard>>; 2],
}

impl GameSession {
    pub fn new(id: GameId, a: PlayerId, b: PlayerId) -> Self {
        Self {
            id,
            players: [a, b],
            boards: [None, None],
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub fn seat_of(&self, player: PlayerId) -> Result<usize> {
        self.players
            .iter()
            .position(|p| *p == player)
            .ok_or(Error::NotInGame(player))
    }

    pub fn opponent_of(&self, player: PlayerId) -> Result<PlayerId> {
        let seat = self.seat_of(player)?;
        Ok(self.players[1 - seat])
    }

    /// Hand over a seat's board. Each seat places exactly once.
    pub fn place(&mut self, seat: usize, board: Arc<dyn ShipBoard>) -> Result<()> {
        let slot = self
            .boards
            .get_mut(seat)
            .ok_or(Error::Internal("seat index out of range"))?;
        if slot.is_some() {
            return Err(Error::FleetAlreadyPlaced(self.players[seat]));
        }
        *slot = Some(board);
        Ok(())
    }

    pub fn has_board(&self, seat: usize) -> bool {
        self.boards.get(seat).is_some_and(Option::is_some)
    }

    pub fn fleets_ready(&self) -> bool {
        self.boards.iter().all(Option::is_some)
    }

    pub fn board(&self, seat: usize) -> Result<&Arc<dyn ShipBoard>> {
        self.boards
            .get(seat)
            .and_then(Option::as_ref)
            .ok_or(Error::FleetsNotReady(self.id))
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("players", &self.players)
            .field("placed", &[self.has_board(0), self.has_board(1)])
            .finish()
    }
}
