#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bitboard;
mod board;
mod common;
mod config;
mod coord;
mod ship;

#[cfg(feature = "std")]
pub mod bot;
#[cfg(feature = "std")]
mod coordinator;
#[cfg(feature = "std")]
mod error;
#[cfg(feature = "std")]
mod lobby;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
mod quota;
#[cfg(feature = "std")]
mod registry;
#[cfg(feature = "std")]
mod round;
#[cfg(feature = "std")]
mod server;
#[cfg(feature = "std")]
mod session;
#[cfg(feature = "std")]
mod signal;

pub use bitboard::{BitBoard, Cells};
pub use board::{FleetBoard, ShipBoard, ShipId};
pub use common::BoardError;
pub use config::{BOARD_SIZE, DEFAULT_LONG_POLL_TIMEOUT, FLEET, NUM_SHIPS};
pub use coord::Coord;
pub use ship::{Grid, Orientation, Ship, ShipType};

#[cfg(feature = "std")]
pub use config::Config;
#[cfg(feature = "std")]
pub use coordinator::GameplayCoordinator;
#[cfg(feature = "std")]
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "std")]
pub use lobby::{
    GameRequest, Lobby, LobbyEntry, LobbySnapshot, NoticeReason, Pairing, RequestNotice,
};
#[cfg(feature = "std")]
pub use logging::{init_logging, parse_level, LOG_ENV};
#[cfg(feature = "std")]
pub use quota::{FixedQuota, ShipStatus, ShipWeights, ShotQuota};
#[cfg(feature = "std")]
pub use registry::{NameRules, NameValidator, Player, PlayerId, PlayerRegistry, PlayerStatus};
#[cfg(feature = "std")]
pub use round::{
    FireOutcome, GameEndHook, GameView, Outcome, RoundEngine, RoundReport, RoundStatus,
    ShipHits,
};
#[cfg(feature = "std")]
pub use server::{GameServer, Polled};
#[cfg(feature = "std")]
pub use session::{GameId, GameSession};
#[cfg(feature = "std")]
pub use signal::{ChangeSignal, Observed};
