//! Process-level owner of the lobby and every running game.
//!
//! The HTTP layer holds one [`GameServer`] and calls straight into it. There is
//! no global state: build one with [`GameServer::new`], share it behind an
//! `Arc`, and [`reset`](GameServer::reset) or
//! [`shutdown`](GameServer::shutdown) it explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde::Serialize;

use crate::board::ShipBoard;
use crate::config::Config;
use crate::coord::Coord;
use crate::coordinator::GameplayCoordinator;
use crate::error::{Error, Result};
use crate::lobby::{Lobby, LobbySnapshot, Pairing, RequestNotice};
use crate::quota::ShotQuota;
use crate::registry::{PlayerId, PlayerStatus};
use crate::round::{FireOutcome, GameView};

/// State returned by a long poll, whether it woke on a change or timed out.
#[derive(Debug, Clone, Serialize)]
pub struct Polled<T> {
    pub version: u64,
    pub timed_out: bool,
    pub state: T,
}

pub struct GameServer {
    config: Config,
    lobby: Lobby,
    games: Arc<GameplayCoordinator>,
    closed: AtomicBool,
}

impl GameServer {
    /// Server using the configured ship-weight quota.
    pub fn new(config: Config) -> Self {
        let quota = Arc::new(config.shot_weights.clone());
        Self::with_quota(config, quota)
    }

    pub fn with_quota(config: Config, quota: Arc<dyn ShotQuota>) -> Self {
        let games = Arc::new(GameplayCoordinator::new(quota));
        let lobby = Lobby::new(Arc::new(config.name_rules.clone()), games.clone());
        Self {
            config,
            lobby,
            games,
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn games(&self) -> &GameplayCoordinator {
        &self.games
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::ShuttingDown)
        } else {
            Ok(())
        }
    }

    pub fn join(&self, name: &str) -> Result<PlayerId> {
        self.ensure_open()?;
        self.lobby.join(name)
    }

    pub fn leave(&self, player: PlayerId) -> Result<()> {
        self.ensure_open()?;
        self.lobby.leave(player)
    }

    pub fn send_game_request(&self, sender: PlayerId, target: PlayerId) -> Result<()> {
        self.ensure_open()?;
        self.lobby.send_game_request(sender, target)
    }

    pub fn accept_game_request(&self, receiver: PlayerId) -> Result<Pairing> {
        self.ensure_open()?;
        self.lobby.accept_game_request(receiver)
    }

    pub fn decline_game_request(&self, receiver: PlayerId) -> Result<()> {
        self.ensure_open()?;
        self.lobby.decline_game_request(receiver)
    }

    pub fn cancel_game_request(&self, sender: PlayerId) -> Result<()> {
        self.ensure_open()?;
        self.lobby.cancel_game_request(sender)
    }

    pub fn take_decline_notification(&self, player: PlayerId) -> Option<RequestNotice> {
        self.lobby.take_decline_notification(player)
    }

    pub fn get_status(&self, player: PlayerId) -> Result<PlayerStatus> {
        self.lobby.get_status(player)
    }

    /// Long-poll the lobby. Returns the current snapshot once the lobby
    /// version moves past `known` or the timeout elapses.
    pub async fn poll_lobby(
        &self,
        player: PlayerId,
        known: Option<u64>,
        timeout: Option<Duration>,
    ) -> Result<Polled<LobbySnapshot>> {
        self.lobby.get_status(player)?;
        let timeout = timeout.unwrap_or(self.config.long_poll_timeout);
        let observed = self.lobby.await_change(known, timeout).await;
        let snapshot = self.lobby.snapshot(player)?;
        Ok(Polled {
            version: snapshot.version,
            timed_out: observed.timed_out,
            state: snapshot,
        })
    }

    pub fn place_fleet(&self, player: PlayerId, board: Arc<dyn ShipBoard>) -> Result<()> {
        self.ensure_open()?;
        self.games.place_fleet(player, board)
    }

    /// Aim at a cell given in `A1` form.
    pub fn aim(&self, player: PlayerId, coord: &str) -> Result<()> {
        self.ensure_open()?;
        let coord: Coord = coord.parse()?;
        self.games.aim(player, coord)
    }

    pub fn unaim(&self, player: PlayerId, coord: &str) -> Result<bool> {
        self.ensure_open()?;
        let coord: Coord = coord.parse()?;
        self.games.unaim(player, coord)
    }

    /// Fire the aimed salvo. When this resolves the final round, both players
    /// go back to AVAILABLE in the lobby.
    pub fn fire(&self, player: PlayerId) -> Result<FireOutcome> {
        self.ensure_open()?;
        self.games.fire(player)
    }

    /// Concede the running game without leaving the lobby.
    pub fn forfeit(&self, player: PlayerId) -> Result<()> {
        self.ensure_open()?;
        let engine = self.games.engine_for(player)?;
        if !engine.forfeit(player)? {
            return Err(Error::GameOver(engine.id()));
        }
        Ok(())
    }

    pub fn shots_available(&self, player: PlayerId) -> Result<usize> {
        let game = self.games.game_of(player)?;
        self.games.shots_available(game, player)
    }

    pub fn view(&self, player: PlayerId) -> Result<GameView> {
        self.games.view(player)
    }

    /// Long-poll `player`'s game. Same contract as [`poll_lobby`](Self::poll_lobby).
    pub async fn poll_game(
        &self,
        player: PlayerId,
        known: Option<u64>,
        timeout: Option<Duration>,
    ) -> Result<Polled<GameView>> {
        let engine = self.games.engine_for(player)?;
        let timeout = timeout.unwrap_or(self.config.long_poll_timeout);
        let observed = engine.await_change(known, timeout).await;
        let view = engine.view(player)?;
        Ok(Polled {
            version: view.version,
            timed_out: observed.timed_out,
            state: view,
        })
    }

    /// Give up the seat of a finished game.
    pub fn return_to_lobby(&self, player: PlayerId) -> Result<()> {
        self.lobby.get_status(player)?;
        self.games.release(player)
    }

    /// Forget every player and game and wake all waiters.
    pub fn reset(&self) {
        self.lobby.reset();
        info!("server state reset");
    }

    /// Reset and refuse further mutations.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.reset();
        info!("server shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
