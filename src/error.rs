//! Error taxonomy for the lobby and gameplay core.
//!
//! Every failure is returned to the immediate caller. [`Error::kind`] tells the
//! outer layer how to react: reject the action, re-render, or resynchronise.

use std::fmt;

use crate::common::BoardError;
use crate::coord::Coord;
use crate::registry::{PlayerId, PlayerStatus};
use crate::session::GameId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; reject the action.
    Validation,
    /// Well-formed but not allowed in the current state; re-render.
    Conflict,
    /// Unknown player, game, request or round; the client is stale.
    NotFound,
    /// Broken internal invariant. Only the offending operation is aborted.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Board(BoardError),
    InvalidName { name: String, reason: &'static str },
    EmptyFleet,
    IncompleteFleet,

    DuplicateName(String),
    SelfRequest(PlayerId),
    PlayerUnavailable { player: PlayerId, status: PlayerStatus },
    AlreadySeated { player: PlayerId, game: GameId },
    GameInProgress(GameId),
    FleetAlreadyPlaced(PlayerId),
    FleetsNotReady(GameId),
    RoundExists { game: GameId, round: u32 },
    PreviousRoundOpen { game: GameId, round: u32 },
    AlreadyAimed(Coord),
    AlreadyFired(Coord),
    QuotaExceeded { quota: usize },
    NoShotsAimed,
    AlreadySubmitted { round: u32 },
    RoundResolved { round: u32 },
    GameOver(GameId),
    ShuttingDown,

    PlayerNotFound(PlayerId),
    NameNotFound(String),
    RequestNotFound(PlayerId),
    NoOpponent(PlayerId),
    GameNotFound(GameId),
    NotInGame(PlayerId),
    RoundNotFound { game: GameId, round: u32 },

    Internal(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Board(_)
            | Error::InvalidName { .. }
            | Error::EmptyFleet
            | Error::IncompleteFleet => ErrorKind::Validation,
            Error::DuplicateName(_)
            | Error::SelfRequest(_)
            | Error::PlayerUnavailable { .. }
            | Error::AlreadySeated { .. }
            | Error::GameInProgress(_)
            | Error::FleetAlreadyPlaced(_)
            | Error::FleetsNotReady(_)
            | Error::RoundExists { .. }
            | Error::PreviousRoundOpen { .. }
            | Error::AlreadyAimed(_)
            | Error::AlreadyFired(_)
            | Error::QuotaExceeded { .. }
            | Error::NoShotsAimed
            | Error::AlreadySubmitted { .. }
            | Error::RoundResolved { .. }
            | Error::GameOver(_)
            | Error::ShuttingDown => ErrorKind::Conflict,
            Error::PlayerNotFound(_)
            | Error::NameNotFound(_)
            | Error::RequestNotFound(_)
            | Error::NoOpponent(_)
            | Error::GameNotFound(_)
            | Error::NotInGame(_)
            | Error::RoundNotFound { .. } => ErrorKind::NotFound,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<BoardError> for Error {
    fn from(err: BoardError) -> Self {
        Error::Board(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Board(e) => write!(f, "{}", e),
            Error::InvalidName { name, reason } => write!(f, "Invalid name {:?}: {}", name, reason),
            Error::EmptyFleet => write!(f, "Board has no ships"),
            Error::IncompleteFleet => write!(f, "Not every ship of the fleet is placed"),
            Error::DuplicateName(name) => write!(f, "Name {:?} is already taken", name),
            Error::SelfRequest(p) => write!(f, "{} cannot challenge themselves", p),
            Error::PlayerUnavailable { player, status } => {
                write!(f, "{} is not available (status {:?})", player, status)
            }
            Error::AlreadySeated { player, game } => {
                write!(f, "{} is already playing {}", player, game)
            }
            Error::GameInProgress(g) => write!(f, "{} is still in progress", g),
            Error::FleetAlreadyPlaced(p) => write!(f, "{} already placed a fleet", p),
            Error::FleetsNotReady(g) => write!(f, "Fleets for {} are not placed yet", g),
            Error::RoundExists { game, round } => {
                write!(f, "Round {} of {} already exists", round, game)
            }
            Error::PreviousRoundOpen { game, round } => {
                write!(f, "Round {} of {} is not resolved yet", round, game)
            }
            Error::AlreadyAimed(c) => write!(f, "Already aiming at {}", c),
            Error::AlreadyFired(c) => write!(f, "Already fired at {} in an earlier round", c),
            Error::QuotaExceeded { quota } => write!(f, "Shot quota of {} already used", quota),
            Error::NoShotsAimed => write!(f, "No shots aimed"),
            Error::AlreadySubmitted { round } => write!(f, "Already fired in round {}", round),
            Error::RoundResolved { round } => write!(f, "Round {} is already resolved", round),
            Error::GameOver(g) => write!(f, "{} is over", g),
            Error::ShuttingDown => write!(f, "Server is shutting down"),
            Error::PlayerNotFound(p) => write!(f, "Unknown player {}", p),
            Error::NameNotFound(name) => write!(f, "No player named {:?}", name),
            Error::RequestNotFound(p) => write!(f, "No pending game request for {}", p),
            Error::NoOpponent(p) => write!(f, "{} has no opponent", p),
            Error::GameNotFound(g) => write!(f, "Unknown game {}", g),
            Error::NotInGame(p) => write!(f, "{} is not seated in a game", p),
            Error::RoundNotFound { game, round } => write!(f, "No round {} in {}", round, game),
            Error::Internal(what) => write!(f, "Internal invariant violated: {}", what),
        }
    }
}

impl std::error::Error for Error {}
