//! Simultaneous salvo rounds for one game.
//!
//! A [`RoundEngine`] is the only owner of its game's mutable state. Every
//! operation takes the per-game lock for its whole check-and-mutate sequence
//! and bumps the game's [`ChangeSignal`] once, after the mutation is complete.
//! In particular the "both players fired" check and the resolution that
//! follows happen under one lock acquisition, so whichever `fire` arrives
//! second resolves the round and the other one cannot.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::board::{ShipBoard, ShipId};
use crate::coord::Coord;
use crate::error::{Error, Result};
use crate::quota::{ShipStatus, ShotQuota};
use crate::registry::PlayerId;
use crate::session::{GameId, GameSession};
use crate::ship::Grid;
use crate::signal::{ChangeSignal, Observed};

/// How a game stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Won { winner: PlayerId, loser: PlayerId },
    /// Both fleets went down in the same round.
    Draw,
    Forfeited { winner: PlayerId, quitter: PlayerId },
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            Outcome::Won { winner, .. } | Outcome::Forfeited { winner, .. } => Some(*winner),
            Outcome::InProgress | Outcome::Draw => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Resolved,
}

/// Hit count against one named ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipHits {
    pub ship: String,
    pub hits: usize,
}

/// One player's view of a resolved round.
///
/// Hits are aggregated per ship: the report never says which of the shots
/// landed, so an unsunk ship's cells are not revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: u32,
    /// Cells this player fired at.
    pub shots: Vec<Coord>,
    /// Enemy ships hit this round.
    pub hits: Vec<ShipHits>,
    /// Enemy ships sunk this round.
    pub sunk: Vec<String>,
    /// Own ships hit this round.
    pub damage_taken: Vec<ShipHits>,
    /// Own ships lost this round.
    pub lost: Vec<String>,
    /// Enemy ships sunk so far.
    pub ships_sunk: usize,
    /// Own ships lost so far.
    pub ships_lost: usize,
}

impl RoundReport {
    /// Hits scored on the named enemy ship this round.
    pub fn hits_on(&self, ship: &str) -> usize {
        lookup(&self.hits, ship)
    }

    /// Hits taken by the named own ship this round.
    pub fn damage_to(&self, ship: &str) -> usize {
        lookup(&self.damage_taken, ship)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|h| h.hits).sum()
    }
}

fn lookup(tally: &[ShipHits], ship: &str) -> usize {
    tally.iter().find(|h| h.ship == ship).map_or(0, |h| h.hits)
}

/// What a successful `fire` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The opponent has not fired yet; the round stays open.
    Waiting { round: u32 },
    /// This call completed the round and resolved it.
    Resolved { round: u32, outcome: Outcome },
}

/// Snapshot of a game from one participant's side.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub game: GameId,
    pub me: PlayerId,
    pub opponent: PlayerId,
    pub version: u64,
    pub fleet_placed: bool,
    pub fleets_ready: bool,
    pub round: Option<u32>,
    pub round_status: Option<RoundStatus>,
    pub aimed: Vec<Coord>,
    pub submitted: bool,
    pub opponent_submitted: bool,
    pub shots_available: usize,
    pub fleet: Vec<ShipStatus>,
    pub reports: Vec<RoundReport>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
struct Salvo {
    aimed: BTreeSet<Coord>,
    submitted: bool,
}

#[derive(Debug, Clone)]
struct Round {
    number: u32,
    salvos: [Salvo; 2],
    reports: Option<[RoundReport; 2]>,
}

impl Round {
    fn new(number: u32) -> Self {
        Self {
            number,
            salvos: Default::default(),
            reports: None,
        }
    }

    fn status(&self) -> RoundStatus {
        if self.reports.is_some() {
            RoundStatus::Resolved
        } else {
            RoundStatus::Open
        }
    }
}

struct Hit {
    ship: ShipId,
    sunk: bool,
}

/// Damage taken by one fleet, kept apart from the read-only board.
#[derive(Debug, Clone, Default)]
struct DamageLedger {
    hits: Vec<usize>,
    cells: Grid,
}

impl DamageLedger {
    fn record(&mut self, board: &dyn ShipBoard, coord: Coord) -> Option<Hit> {
        let ship = board.has_ship_at(coord)?;
        if ship >= board.ship_count() || !self.cells.insert(coord) {
            return None;
        }
        if self.hits.len() < board.ship_count() {
            self.hits.resize(board.ship_count(), 0);
        }
        self.hits[ship] += 1;
        Some(Hit {
            ship,
            sunk: self.hits[ship] == board.ship_length(ship),
        })
    }

    fn hits_on(&self, ship: ShipId) -> usize {
        self.hits.get(ship).copied().unwrap_or(0)
    }

    fn is_sunk(&self, board: &dyn ShipBoard, ship: ShipId) -> bool {
        let len = board.ship_length(ship);
        len > 0 && self.hits_on(ship) >= len
    }

    fn sunk_count(&self, board: &dyn ShipBoard) -> usize {
        (0..board.ship_count())
            .filter(|&s| self.is_sunk(board, s))
            .count()
    }

    fn all_sunk(&self, board: &dyn ShipBoard) -> bool {
        board.ship_count() > 0 && self.sunk_count(board) == board.ship_count()
    }

    fn fleet_status(&self, board: &dyn ShipBoard) -> Vec<ShipStatus> {
        (0..board.ship_count())
            .map(|s| ShipStatus {
                name: board.ship_name(s).to_string(),
                length: board.ship_length(s),
                hits: self.hits_on(s),
                sunk: self.is_sunk(board, s),
            })
            .collect()
    }
}

struct GameState {
    session: GameSession,
    /// Damage taken, by seat.
    damage: [DamageLedger; 2],
    /// Cells fired at in resolved rounds, by shooter seat.
    fired: [Grid; 2],
    rounds: Vec<Round>,
    outcome: Outcome,
}

impl GameState {
    fn ensure_playing(&self) -> Result<()> {
        if self.outcome.is_over() {
            return Err(Error::GameOver(self.session.id()));
        }
        if !self.session.fleets_ready() {
            return Err(Error::FleetsNotReady(self.session.id()));
        }
        Ok(())
    }

    fn open_round(&mut self, number: u32) -> Result<()> {
        let game = self.session.id();
        self.ensure_playing()?;
        if self.rounds.iter().any(|r| r.number == number) {
            return Err(Error::RoundExists { game, round: number });
        }
        if let Some(last) = self.rounds.last() {
            if last.reports.is_none() {
                return Err(Error::PreviousRoundOpen {
                    game,
                    round: last.number,
                });
            }
        }
        let expected = self.rounds.last().map_or(1, |r| r.number + 1);
        if number != expected {
            return Err(Error::RoundNotFound {
                game,
                round: number.saturating_sub(1),
            });
        }
        self.rounds.push(Round::new(number));
        debug!("{} round {} open", game, number);
        Ok(())
    }

    fn current_mut(&mut self) -> Result<&mut Round> {
        let game = self.session.id();
        let round = self
            .rounds
            .last_mut()
            .ok_or(Error::FleetsNotReady(game))?;
        if round.reports.is_some() {
            return Err(Error::RoundResolved {
                round: round.number,
            });
        }
        Ok(round)
    }

    fn fleet_status(&self, seat: usize) -> Result<Vec<ShipStatus>> {
        let board = self.session.board(seat)?;
        Ok(self.damage[seat].fleet_status(board.as_ref()))
    }

    /// Apply both frozen salvos, write the reports and adjudicate.
    fn resolve(&mut self) -> Result<()> {
        let idx = self
            .rounds
            .len()
            .checked_sub(1)
            .ok_or(Error::Internal("no round to resolve"))?;
        if self.rounds[idx].reports.is_some() {
            return Err(Error::Internal("round resolved twice"));
        }
        let number = self.rounds[idx].number;
        let shots: [Vec<Coord>; 2] =
            [0, 1].map(|seat| self.rounds[idx].salvos[seat].aimed.iter().copied().collect());
        let boards = [self.session.board(0)?.clone(), self.session.board(1)?.clone()];

        // Indexed by the seat that owns the ship.
        let mut tally: [Vec<usize>; 2] = [0, 1].map(|seat| vec![0; boards[seat].ship_count()]);
        let mut newly_sunk: [Vec<ShipId>; 2] = Default::default();
        for shooter in 0..2 {
            let target = 1 - shooter;
            for &coord in &shots[shooter] {
                self.fired[shooter].insert(coord);
                if let Some(hit) = self.damage[target].record(boards[target].as_ref(), coord) {
                    if let Some(n) = tally[target].get_mut(hit.ship) {
                        *n += 1;
                    }
                    if hit.sunk {
                        newly_sunk[target].push(hit.ship);
                    }
                }
            }
        }

        let lost = [0, 1].map(|seat| self.damage[seat].sunk_count(boards[seat].as_ref()));
        let reports = [0, 1].map(|me| {
            let them = 1 - me;
            RoundReport {
                round: number,
                shots: shots[me].clone(),
                hits: ship_hits(&tally[them], boards[them].as_ref()),
                sunk: ship_names(&newly_sunk[them], boards[them].as_ref()),
                damage_taken: ship_hits(&tally[me], boards[me].as_ref()),
                lost: ship_names(&newly_sunk[me], boards[me].as_ref()),
                ships_sunk: lost[them],
                ships_lost: lost[me],
            }
        });
        self.rounds[idx].reports = Some(reports);

        let down = [0, 1].map(|seat| self.damage[seat].all_sunk(boards[seat].as_ref()));
        let [a, b] = self.session.players();
        self.outcome = match down {
            [true, true] => Outcome::Draw,
            [true, false] => Outcome::Won { winner: b, loser: a },
            [false, true] => Outcome::Won { winner: a, loser: b },
            [false, false] => Outcome::InProgress,
        };
        debug!(
            "{} round {} resolved: {} / {} ships lost",
            self.session.id(),
            number,
            lost[0],
            lost[1]
        );
        if self.outcome.is_over() {
            info!("{} finished: {:?}", self.session.id(), self.outcome);
            Ok(())
        } else {
            self.open_round(number + 1)
        }
    }
}

fn ship_hits(tally: &[usize], board: &dyn ShipBoard) -> Vec<ShipHits> {
    tally
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .map(|(ship, &hits)| ShipHits {
            ship: board.ship_name(ship).to_string(),
            hits,
        })
        .collect()
}

fn ship_names(ships: &[ShipId], board: &dyn ShipBoard) -> Vec<String> {
    ships.iter().map(|&s| board.ship_name(s).to_string()).collect()
}

/// Called with the game's id once the game ends, after the game lock is
/// released.
pub type GameEndHook = Arc<dyn Fn(GameId) + Send + Sync>;

/// Owner of one game's rounds and its change feed.
pub struct RoundEngine {
    id: GameId,
    players: [PlayerId; 2],
    quota: Arc<dyn ShotQuota>,
    state: Mutex<GameState>,
    signal: ChangeSignal,
    on_end: Option<GameEndHook>,
}

impl std::fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine")
            .field("id", &self.id)
            .field("players", &self.players)
            .finish_non_exhaustive()
    }
}

impl RoundEngine {
    pub fn new(session: GameSession, quota: Arc<dyn ShotQuota>) -> Self {
        Self {
            id: session.id(),
            players: session.players(),
            quota,
            state: Mutex::new(GameState {
                session,
                damage: Default::default(),
                fired: [Grid::new(); 2],
                rounds: Vec::new(),
                outcome: Outcome::InProgress,
            }),
            signal: ChangeSignal::new(),
            on_end: None,
        }
    }

    /// Run `hook` when this game ends by a final round or a forfeit.
    pub fn with_end_hook(mut self, hook: GameEndHook) -> Self {
        self.on_end = Some(hook);
        self
    }

    fn ended(&self) {
        if let Some(hook) = &self.on_end {
            hook(self.id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the game lock and bump the signal if it succeeds.
    fn commit<R>(&self, f: impl FnOnce(&mut GameState) -> Result<R>) -> Result<R> {
        let mut state = self.lock();
        let out = f(&mut state)?;
        self.signal.bump();
        Ok(out)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub fn opponent_of(&self, player: PlayerId) -> Result<PlayerId> {
        match self.players {
            [a, b] if a == player => Ok(b),
            [a, b] if b == player => Ok(a),
            _ => Err(Error::NotInGame(player)),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.lock().outcome
    }

    /// Number of the latest round, open or resolved.
    pub fn current_round(&self) -> Option<u32> {
        self.lock().rounds.last().map(|r| r.number)
    }

    pub fn round_status(&self, number: u32) -> Result<RoundStatus> {
        self.lock()
            .rounds
            .iter()
            .find(|r| r.number == number)
            .map(Round::status)
            .ok_or(Error::RoundNotFound {
                game: self.id,
                round: number,
            })
    }

    /// Hand over `player`'s board. The second placement opens round 1.
    pub fn place_fleet(&self, player: PlayerId, board: Arc<dyn ShipBoard>) -> Result<()> {
        let count = board.ship_count();
        if count == 0 {
            return Err(Error::EmptyFleet);
        }
        if (0..count).any(|s| board.ship_length(s) == 0) {
            return Err(Error::IncompleteFleet);
        }
        self.commit(|st| {
            let seat = st.session.seat_of(player)?;
            if st.outcome.is_over() {
                return Err(Error::GameOver(st.session.id()));
            }
            st.session.place(seat, board)?;
            debug!("{} placed a fleet in {}", player, st.session.id());
            if st.session.fleets_ready() {
                st.open_round(1)?;
                info!("{} started", st.session.id());
            }
            Ok(())
        })
    }

    /// Open round `number`. Only the round after the last resolved one can be
    /// created, and only while the game is running.
    pub fn create_round(&self, number: u32) -> Result<()> {
        self.commit(|st| st.open_round(number))
    }

    /// Shots `player` may aim this round, from their own fleet's state.
    pub fn shots_available(&self, player: PlayerId) -> Result<usize> {
        let st = self.lock();
        let seat = st.session.seat_of(player)?;
        Ok(self.quota.shots(&st.fleet_status(seat)?))
    }

    pub fn aim(&self, player: PlayerId, coord: Coord) -> Result<()> {
        let quota = &*self.quota;
        self.commit(|st| {
            let seat = st.session.seat_of(player)?;
            st.ensure_playing()?;
            let allowance = quota.shots(&st.fleet_status(seat)?);
            let fired_before = st.fired[seat].contains(coord);
            let round = st.current_mut()?;
            let number = round.number;
            let salvo = &mut round.salvos[seat];
            if salvo.submitted {
                return Err(Error::AlreadySubmitted { round: number });
            }
            if salvo.aimed.contains(&coord) {
                return Err(Error::AlreadyAimed(coord));
            }
            if fired_before {
                return Err(Error::AlreadyFired(coord));
            }
            if salvo.aimed.len() >= allowance {
                return Err(Error::QuotaExceeded { quota: allowance });
            }
            salvo.aimed.insert(coord);
            Ok(())
        })
    }

    /// Take `coord` back out of this round's salvo. Returns whether it was
    /// aimed; an absent cell is not an error.
    pub fn unaim(&self, player: PlayerId, coord: Coord) -> Result<bool> {
        self.commit(|st| {
            let seat = st.session.seat_of(player)?;
            st.ensure_playing()?;
            let round = st.current_mut()?;
            let number = round.number;
            let salvo = &mut round.salvos[seat];
            if salvo.submitted {
                return Err(Error::AlreadySubmitted { round: number });
            }
            Ok(salvo.aimed.remove(&coord))
        })
    }

    /// Lock in this round's salvo. The second player to fire resolves the
    /// round in the same critical section.
    pub fn fire(&self, player: PlayerId) -> Result<FireOutcome> {
        let fired = self.commit(|st| {
            let seat = st.session.seat_of(player)?;
            st.ensure_playing()?;
            let round = st.current_mut()?;
            let number = round.number;
            let salvo = &mut round.salvos[seat];
            if salvo.submitted {
                return Err(Error::AlreadySubmitted { round: number });
            }
            if salvo.aimed.is_empty() {
                return Err(Error::NoShotsAimed);
            }
            salvo.submitted = true;
            if !round.salvos.iter().all(|s| s.submitted) {
                debug!("{} fired in {} round {}, waiting", player, st.session.id(), number);
                return Ok(FireOutcome::Waiting { round: number });
            }
            st.resolve()?;
            Ok(FireOutcome::Resolved {
                round: number,
                outcome: st.outcome,
            })
        })?;
        if let FireOutcome::Resolved { outcome, .. } = fired {
            if outcome.is_over() {
                self.ended();
            }
        }
        Ok(fired)
    }

    /// End a running game in the opponent's favour. Returns `false` when the
    /// game was already over.
    pub fn forfeit(&self, player: PlayerId) -> Result<bool> {
        let ended = self.concede(player)?;
        if ended {
            self.ended();
        }
        Ok(ended)
    }

    /// [`forfeit`](Self::forfeit) without the end hook, for callers that
    /// already hold the lobby lock and settle the lobby themselves.
    pub(crate) fn concede(&self, player: PlayerId) -> Result<bool> {
        let opponent = self.opponent_of(player)?;
        let mut st = self.lock();
        if st.outcome.is_over() {
            return Ok(false);
        }
        st.outcome = Outcome::Forfeited {
            winner: opponent,
            quitter: player,
        };
        info!("{} forfeited {}", player, self.id);
        self.signal.bump();
        Ok(true)
    }

    pub fn view(&self, player: PlayerId) -> Result<GameView> {
        let st = self.lock();
        let seat = st.session.seat_of(player)?;
        let round = st.rounds.last();
        let fleet = st.fleet_status(seat).unwrap_or_default();
        Ok(GameView {
            game: self.id,
            me: player,
            opponent: self.players[1 - seat],
            version: self.signal.version(),
            fleet_placed: st.session.has_board(seat),
            fleets_ready: st.session.fleets_ready(),
            round: round.map(|r| r.number),
            round_status: round.map(Round::status),
            aimed: round
                .map(|r| r.salvos[seat].aimed.iter().copied().collect())
                .unwrap_or_default(),
            submitted: round.is_some_and(|r| r.salvos[seat].submitted),
            opponent_submitted: round.is_some_and(|r| r.salvos[1 - seat].submitted),
            shots_available: if fleet.is_empty() {
                0
            } else {
                self.quota.shots(&fleet)
            },
            fleet,
            reports: st
                .rounds
                .iter()
                .filter_map(|r| r.reports.as_ref().map(|reps| reps[seat].clone()))
                .collect(),
            outcome: st.outcome,
        })
    }

    pub fn version(&self) -> u64 {
        self.signal.version()
    }

    pub async fn await_change(&self, known: Option<u64>, timeout: Duration) -> Observed {
        self.signal.await_change(known, timeout).await
    }

    /// Bump without mutating, used to release waiters on reset.
    pub(crate) fn wake(&self) {
        self.signal.bump();
    }
}
