//! Matchmaking state machine.
//!
//! ```text
//! AVAILABLE ──send_game_request──▶ REQUESTING        (target ──▶ PENDING_RESPONSE)
//! REQUESTING ──declined / cancelled / target left──▶ AVAILABLE
//! PENDING_RESPONSE ──accept──▶ IN_GAME               (sender ──▶ IN_GAME, same step)
//! PENDING_RESPONSE ──decline──▶ AVAILABLE            (sender ──▶ AVAILABLE)
//! IN_GAME ──game ends──▶ AVAILABLE
//! ```
//!
//! All lobby state sits behind one lock. Each successful mutation bumps the
//! lobby [`ChangeSignal`] once, before the lock is released. The lobby
//! registers a game end hook with the [`GameplayCoordinator`], so a game that
//! ends through any path sends its players back to AVAILABLE.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::info;
use serde::Serialize;

use crate::coordinator::GameplayCoordinator;
use crate::error::{Error, Result};
use crate::registry::{NameValidator, Player, PlayerId, PlayerRegistry, PlayerStatus};
use crate::session::GameId;
use crate::signal::{ChangeSignal, Observed};

/// An unanswered invitation. At most one per sender and one per receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRequest {
    pub sender: PlayerId,
    pub receiver: PlayerId,
    pub created_at: Instant,
}

/// Returned by an accepted request so the caller can route both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub game: GameId,
    pub sender: PlayerId,
    pub receiver: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeReason {
    /// The receiver declined.
    Declined,
    /// The sender withdrew the request.
    Cancelled,
    /// The counterpart left the lobby.
    Left,
}

/// Why a request this player was part of went away. Delivered at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestNotice {
    pub from: PlayerId,
    pub from_name: String,
    pub reason: NoticeReason,
}

/// One row of the lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyEntry {
    pub id: PlayerId,
    pub name: String,
    pub status: PlayerStatus,
}

/// What a lobby page needs to render for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbySnapshot {
    pub version: u64,
    pub status: PlayerStatus,
    pub opponent: Option<PlayerId>,
    pub players: Vec<LobbyEntry>,
}

struct LobbyState {
    registry: PlayerRegistry,
    /// Keyed by receiver.
    requests: HashMap<PlayerId, GameRequest>,
    games: HashMap<PlayerId, GameId>,
    notices: HashMap<PlayerId, RequestNotice>,
}

impl LobbyState {
    fn status(&self, player: PlayerId) -> Result<PlayerStatus> {
        Ok(self.registry.get(player)?.status)
    }

    fn request_from(&self, sender: PlayerId) -> Option<GameRequest> {
        self.requests.values().find(|r| r.sender == sender).copied()
    }

    fn take_request_from(&mut self, sender: PlayerId) -> Option<GameRequest> {
        let req = self.request_from(sender)?;
        self.requests.remove(&req.receiver)
    }

    fn notify(&mut self, to: PlayerId, from: PlayerId, reason: NoticeReason) {
        let from_name = self
            .registry
            .get(from)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.notices.insert(
            to,
            RequestNotice {
                from,
                from_name,
                reason,
            },
        );
    }

    /// Close `req`, sending both sides back to AVAILABLE. `closed_by` is the
    /// side that acted; the other side gets the notice.
    fn close_request(
        &mut self,
        req: GameRequest,
        closed_by: PlayerId,
        reason: NoticeReason,
    ) -> Result<()> {
        self.requests.remove(&req.receiver);
        let other = if closed_by == req.sender {
            req.receiver
        } else {
            req.sender
        };
        for p in [req.sender, req.receiver] {
            self.registry.set_status(p, PlayerStatus::Available)?;
        }
        self.notify(other, closed_by, reason);
        Ok(())
    }

    /// Send everyone still seated in `game` back to AVAILABLE. Returns how
    /// many players moved.
    fn finish_game(&mut self, game: GameId) -> usize {
        let seated: Vec<PlayerId> = self
            .games
            .iter()
            .filter(|(_, g)| **g == game)
            .map(|(p, _)| *p)
            .collect();
        let mut moved = 0;
        for p in seated {
            self.games.remove(&p);
            if self.registry.set_status(p, PlayerStatus::Available).is_ok() {
                moved += 1;
            }
        }
        moved
    }

    fn opponent(&self, player: PlayerId, games: &GameplayCoordinator) -> Result<Option<PlayerId>> {
        Ok(match self.status(player)? {
            PlayerStatus::Requesting => self.request_from(player).map(|r| r.receiver),
            PlayerStatus::PendingResponse => self.requests.get(&player).map(|r| r.sender),
            PlayerStatus::InGame => games.get_opponent_id(player).ok(),
            PlayerStatus::Available => None,
        })
    }
}

/// Lobby state and its change feed, shared with the game end hook.
struct Shared {
    state: Mutex<LobbyState>,
    signal: ChangeSignal,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LobbyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn end_game(&self, game: GameId) -> usize {
        let mut st = self.lock();
        let moved = st.finish_game(game);
        if moved > 0 {
            info!("{} over, {} player(s) back in the lobby", game, moved);
            self.signal.bump();
        }
        moved
    }
}

pub struct Lobby {
    shared: Arc<Shared>,
    games: Arc<GameplayCoordinator>,
}

impl Lobby {
    pub fn new(validator: Arc<dyn NameValidator>, games: Arc<GameplayCoordinator>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(LobbyState {
                registry: PlayerRegistry::new(validator),
                requests: HashMap::new(),
                games: HashMap::new(),
                notices: HashMap::new(),
            }),
            signal: ChangeSignal::new(),
        });
        let weak = Arc::downgrade(&shared);
        games.on_game_end(Arc::new(move |game: GameId| {
            if let Some(shared) = weak.upgrade() {
                shared.end_game(game);
            }
        }));
        Self { shared, games }
    }

    fn lock(&self) -> MutexGuard<'_, LobbyState> {
        self.shared.lock()
    }

    /// Run `f` under the lobby lock and bump the version if it succeeds.
    fn commit<R>(&self, f: impl FnOnce(&mut LobbyState) -> Result<R>) -> Result<R> {
        let mut state = self.lock();
        let out = f(&mut state)?;
        self.shared.signal.bump();
        Ok(out)
    }

    pub fn join(&self, name: &str) -> Result<PlayerId> {
        self.commit(|st| {
            let id = st.registry.join(name)?;
            info!("{} joined as {:?}", id, st.registry.get(id)?.name);
            Ok(id)
        })
    }

    /// Remove `player`, closing any request they were part of and forfeiting
    /// a running game.
    pub fn leave(&self, player: PlayerId) -> Result<()> {
        let games = &self.games;
        self.commit(|st| {
            match st.status(player)? {
                PlayerStatus::Available => {}
                PlayerStatus::Requesting => {
                    if let Some(req) = st.request_from(player) {
                        st.close_request(req, player, NoticeReason::Left)?;
                    }
                }
                PlayerStatus::PendingResponse => {
                    if let Some(req) = st.requests.get(&player).copied() {
                        st.close_request(req, player, NoticeReason::Left)?;
                    }
                }
                PlayerStatus::InGame => {
                    if let Some((game, opponent)) = games.concede(player)? {
                        info!("{} left {}, {} wins by forfeit", player, game, opponent);
                        st.notify(opponent, player, NoticeReason::Left);
                    }
                    if let Some(game) = st.games.get(&player).copied() {
                        st.finish_game(game);
                    }
                }
            }
            games.release(player)?;
            st.notices.remove(&player);
            let gone = st.registry.leave(player)?;
            info!("{} ({:?}) left", player, gone.name);
            Ok(())
        })
    }

    pub fn send_game_request(&self, sender: PlayerId, target: PlayerId) -> Result<()> {
        self.commit(|st| {
            if sender == target {
                return Err(Error::SelfRequest(sender));
            }
            for p in [sender, target] {
                let status = st.status(p)?;
                if status != PlayerStatus::Available {
                    return Err(Error::PlayerUnavailable { player: p, status });
                }
            }
            st.requests.insert(
                target,
                GameRequest {
                    sender,
                    receiver: target,
                    created_at: Instant::now(),
                },
            );
            st.registry.set_status(sender, PlayerStatus::Requesting)?;
            st.registry.set_status(target, PlayerStatus::PendingResponse)?;
            info!("{} challenged {}", sender, target);
            Ok(())
        })
    }

    /// Accept the pending request: open the game and move both players to
    /// IN_GAME in one step.
    pub fn accept_game_request(&self, receiver: PlayerId) -> Result<Pairing> {
        let games = &self.games;
        self.commit(|st| {
            st.registry.get(receiver)?;
            let req = st
                .requests
                .get(&receiver)
                .copied()
                .ok_or(Error::RequestNotFound(receiver))?;
            let game = games.open_game(req.sender, receiver)?;
            st.requests.remove(&receiver);
            for p in [req.sender, receiver] {
                st.registry.set_status(p, PlayerStatus::InGame)?;
                st.games.insert(p, game);
            }
            Ok(Pairing {
                game,
                sender: req.sender,
                receiver,
            })
        })
    }

    pub fn decline_game_request(&self, receiver: PlayerId) -> Result<()> {
        self.commit(|st| {
            st.registry.get(receiver)?;
            let req = st
                .requests
                .get(&receiver)
                .copied()
                .ok_or(Error::RequestNotFound(receiver))?;
            st.close_request(req, receiver, NoticeReason::Declined)?;
            info!("{} declined {}", receiver, req.sender);
            Ok(())
        })
    }

    /// Withdraw the request `sender` has outstanding.
    pub fn cancel_game_request(&self, sender: PlayerId) -> Result<()> {
        self.commit(|st| {
            st.registry.get(sender)?;
            let req = st
                .take_request_from(sender)
                .ok_or(Error::RequestNotFound(sender))?;
            st.close_request(req, sender, NoticeReason::Cancelled)
        })
    }

    /// Return the players of a finished `game` to AVAILABLE. Returns how many
    /// players moved; bumps only if someone did. Games opened through this
    /// lobby call it on their own when they end.
    pub fn end_game(&self, game: GameId) -> usize {
        self.shared.end_game(game)
    }

    pub fn get_status(&self, player: PlayerId) -> Result<PlayerStatus> {
        self.lock().status(player)
    }

    pub fn get_player(&self, player: PlayerId) -> Result<Player> {
        self.lock().registry.get(player).cloned()
    }

    pub fn get_player_by_name(&self, name: &str) -> Result<Player> {
        self.lock().registry.get_by_name(name).cloned()
    }

    /// Counterpart of `player`'s request or game.
    pub fn get_opponent(&self, player: PlayerId) -> Result<PlayerId> {
        self.lock()
            .opponent(player, &self.games)?
            .ok_or(Error::NoOpponent(player))
    }

    /// Everyone but `viewer` and players in a game, in join order.
    pub fn list_available_to(&self, viewer: PlayerId) -> Result<Vec<LobbyEntry>> {
        let st = self.lock();
        st.registry.get(viewer)?;
        Ok(listing(&st, viewer))
    }

    /// Pop the pending notice for `player`. A second call returns `None`.
    pub fn take_decline_notification(&self, player: PlayerId) -> Option<RequestNotice> {
        self.lock().notices.remove(&player)
    }

    /// Status, counterpart and listing for `player`, read under one lock.
    pub fn snapshot(&self, player: PlayerId) -> Result<LobbySnapshot> {
        let st = self.lock();
        let status = st.status(player)?;
        Ok(LobbySnapshot {
            version: self.shared.signal.version(),
            status,
            opponent: st.opponent(player, &self.games)?,
            players: listing(&st, player),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().registry.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.shared.signal.version()
    }

    pub async fn await_change(&self, known: Option<u64>, timeout: Duration) -> Observed {
        self.shared.signal.await_change(known, timeout).await
    }

    /// Drop every player, request, notice and game. The coordinator is reset
    /// under the lobby lock so no pairing lands in between.
    pub fn reset(&self) {
        let mut st = self.lock();
        st.registry.clear();
        st.requests.clear();
        st.games.clear();
        st.notices.clear();
        self.games.reset();
        self.shared.signal.bump();
    }
}

fn listing(st: &LobbyState, viewer: PlayerId) -> Vec<LobbyEntry> {
    st.registry
        .iter()
        .filter(|p| p.id != viewer && p.status != PlayerStatus::InGame)
        .map(|p| LobbyEntry {
            id: p.id,
            name: p.name.clone(),
            status: p.status,
        })
        .collect()
}
