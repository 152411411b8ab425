//! Maps game ids and seated players to their [`RoundEngine`]s.
//!
//! The coordinator's own lock only guards the lookup tables. It is released
//! before any engine operation runs, so games never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::board::ShipBoard;
use crate::coord::Coord;
use crate::error::{Error, Result};
use crate::quota::ShotQuota;
use crate::registry::PlayerId;
use crate::round::{FireOutcome, GameEndHook, GameView, RoundEngine};
use crate::session::{GameId, GameSession};
use crate::signal::Observed;

#[derive(Default)]
struct Tables {
    games: HashMap<GameId, Arc<RoundEngine>>,
    seats: HashMap<PlayerId, GameId>,
    next_id: u64,
}

impl Tables {
    /// Drop `player`'s seat, and the game itself once nobody sits in it.
    fn unseat(&mut self, player: PlayerId) -> Option<GameId> {
        let game = self.seats.remove(&player)?;
        if !self.seats.values().any(|g| *g == game) {
            self.games.remove(&game);
            debug!("{} collected", game);
        }
        Some(game)
    }
}

pub struct GameplayCoordinator {
    tables: Mutex<Tables>,
    quota: Arc<dyn ShotQuota>,
    on_end: OnceLock<GameEndHook>,
}

impl GameplayCoordinator {
    pub fn new(quota: Arc<dyn ShotQuota>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
            quota,
            on_end: OnceLock::new(),
        }
    }

    /// Register the callback every game opened from now on runs when it
    /// ends. Only the first registration takes effect.
    pub fn on_game_end(&self, hook: GameEndHook) {
        if self.on_end.set(hook).is_err() {
            warn!("game end hook already registered, ignoring");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seat `a` and `b` in a fresh game. A seat left over from a finished game
    /// is released first; a seat in a running game is a conflict.
    pub fn open_game(&self, a: PlayerId, b: PlayerId) -> Result<GameId> {
        let mut tables = self.lock();
        for player in [a, b] {
            if let Some(game) = tables.seats.get(&player).copied() {
                let running = tables
                    .games
                    .get(&game)
                    .is_some_and(|e| !e.outcome().is_over());
                if running {
                    return Err(Error::AlreadySeated { player, game });
                }
            }
        }
        tables.unseat(a);
        tables.unseat(b);
        let id = GameId::from(tables.next_id);
        tables.next_id += 1;
        let mut engine = RoundEngine::new(GameSession::new(id, a, b), self.quota.clone());
        if let Some(hook) = self.on_end.get() {
            engine = engine.with_end_hook(hook.clone());
        }
        tables.games.insert(id, Arc::new(engine));
        tables.seats.insert(a, id);
        tables.seats.insert(b, id);
        info!("{} opened for {} and {}", id, a, b);
        Ok(id)
    }

    pub fn game(&self, id: GameId) -> Result<Arc<RoundEngine>> {
        self.lock()
            .games
            .get(&id)
            .cloned()
            .ok_or(Error::GameNotFound(id))
    }

    pub fn game_of(&self, player: PlayerId) -> Result<GameId> {
        self.lock()
            .seats
            .get(&player)
            .copied()
            .ok_or(Error::NotInGame(player))
    }

    /// Engine of the game `player` is seated in.
    pub fn engine_for(&self, player: PlayerId) -> Result<Arc<RoundEngine>> {
        let tables = self.lock();
        let game = tables.seats.get(&player).ok_or(Error::NotInGame(player))?;
        tables
            .games
            .get(game)
            .cloned()
            .ok_or(Error::GameNotFound(*game))
    }

    pub fn get_opponent_id(&self, player: PlayerId) -> Result<PlayerId> {
        self.engine_for(player)?.opponent_of(player)
    }

    pub fn place_fleet(&self, player: PlayerId, board: Arc<dyn ShipBoard>) -> Result<()> {
        self.engine_for(player)?.place_fleet(player, board)
    }

    /// Open round `number` of `game` and hand back the game's engine.
    pub fn create_round(&self, game: GameId, number: u32) -> Result<Arc<RoundEngine>> {
        let engine = self.game(game)?;
        engine.create_round(number)?;
        Ok(engine)
    }

    pub fn aim(&self, player: PlayerId, coord: Coord) -> Result<()> {
        self.engine_for(player)?.aim(player, coord)
    }

    pub fn unaim(&self, player: PlayerId, coord: Coord) -> Result<bool> {
        self.engine_for(player)?.unaim(player, coord)
    }

    pub fn fire(&self, player: PlayerId) -> Result<FireOutcome> {
        self.engine_for(player)?.fire(player)
    }

    pub fn shots_available(&self, game: GameId, player: PlayerId) -> Result<usize> {
        self.game(game)?.shots_available(player)
    }

    pub fn view(&self, player: PlayerId) -> Result<GameView> {
        self.engine_for(player)?.view(player)
    }

    pub fn version(&self, game: GameId) -> Result<u64> {
        Ok(self.game(game)?.version())
    }

    pub async fn await_change(
        &self,
        game: GameId,
        known: Option<u64>,
        timeout: Duration,
    ) -> Result<Observed> {
        let engine = self.game(game)?;
        Ok(engine.await_change(known, timeout).await)
    }

    /// Forfeit `player`'s running game. Returns the game and opponent when a
    /// running game was ended.
    pub fn forfeit(&self, player: PlayerId) -> Result<Option<(GameId, PlayerId)>> {
        self.end_running(player, RoundEngine::forfeit)
    }

    /// Like [`forfeit`](Self::forfeit) but skips the end hook. The lobby calls
    /// this under its own lock.
    pub(crate) fn concede(&self, player: PlayerId) -> Result<Option<(GameId, PlayerId)>> {
        self.end_running(player, RoundEngine::concede)
    }

    fn end_running(
        &self,
        player: PlayerId,
        end: fn(&RoundEngine, PlayerId) -> Result<bool>,
    ) -> Result<Option<(GameId, PlayerId)>> {
        let engine = match self.engine_for(player) {
            Ok(engine) => engine,
            Err(Error::NotInGame(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        if end(&engine, player)? {
            Ok(Some((engine.id(), engine.opponent_of(player)?)))
        } else {
            Ok(None)
        }
    }

    /// Leave the seat. Running games must be forfeited first.
    pub fn release(&self, player: PlayerId) -> Result<()> {
        let mut tables = self.lock();
        let Some(game) = tables.seats.get(&player).copied() else {
            return Ok(());
        };
        if tables
            .games
            .get(&game)
            .is_some_and(|e| !e.outcome().is_over())
        {
            return Err(Error::GameInProgress(game));
        }
        tables.unseat(player);
        Ok(())
    }

    pub fn active_games(&self) -> usize {
        self.lock().games.len()
    }

    /// Drop every game, waking anyone long-polling on one.
    pub fn reset(&self) {
        let engines: Vec<_> = {
            let mut tables = self.lock();
            tables.seats.clear();
            tables.games.drain().map(|(_, e)| e).collect()
        };
        for engine in engines {
            engine.wake();
        }
    }
}
