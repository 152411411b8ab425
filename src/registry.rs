//! Players present in the lobby and the uniqueness of their names.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};

/// Opaque player identity. Ids are never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(u64);

impl PlayerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(raw: u64) -> Self {
        PlayerId(raw)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Where a player stands in the matchmaking state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Available,
    /// Sent a game request that is still unanswered.
    Requesting,
    /// Received a game request and has not answered it.
    PendingResponse,
    InGame,
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub status: PlayerStatus,
}

/// Format check for display names. Uniqueness is the registry's job.
pub trait NameValidator: Send + Sync {
    /// Return the normalised name or the reason it is rejected.
    fn normalize(&self, raw: &str) -> Result<String>;
}

/// Stock name rules: trimmed, `min_len..=max_len` characters, letters, digits
/// and spaces only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRules {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_len: 20,
        }
    }
}

impl NameValidator for NameRules {
    fn normalize(&self, raw: &str) -> Result<String> {
        let name = raw.trim();
        let reject = |reason: &'static str| Error::InvalidName {
            name: name.to_string(),
            reason,
        };
        let len = name.chars().count();
        if len == 0 {
            return Err(reject("name is empty"));
        }
        if len < self.min_len {
            return Err(reject("name is too short"));
        }
        if len > self.max_len {
            return Err(reject("name is too long"));
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == ' ') {
            return Err(reject("only letters, digits and spaces are allowed"));
        }
        Ok(name.to_string())
    }
}

/// Players keyed by id, iterated in join order.
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
    names: HashMap<String, PlayerId>,
    next_id: u64,
    validator: Arc<dyn NameValidator>,
}

impl PlayerRegistry {
    pub fn new(validator: Arc<dyn NameValidator>) -> Self {
        Self {
            players: BTreeMap::new(),
            names: HashMap::new(),
            next_id: 1,
            validator,
        }
    }

    /// Register a new AVAILABLE player under `name`.
    pub fn join(&mut self, name: &str) -> Result<PlayerId> {
        let name = self.validator.normalize(name)?;
        if self.names.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.names.insert(name.clone(), id);
        self.players.insert(
            id,
            Player {
                id,
                name,
                status: PlayerStatus::Available,
            },
        );
        Ok(id)
    }

    /// Remove a player and free their name.
    pub fn leave(&mut self, id: PlayerId) -> Result<Player> {
        let player = self.players.remove(&id).ok_or(Error::PlayerNotFound(id))?;
        self.names.remove(&player.name);
        Ok(player)
    }

    pub fn get(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(Error::PlayerNotFound(id))
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Player> {
        let name = name.trim();
        self.names
            .get(name)
            .and_then(|id| self.players.get(id))
            .ok_or_else(|| Error::NameNotFound(name.to_string()))
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub(crate) fn set_status(&mut self, id: PlayerId, status: PlayerStatus) -> Result<()> {
        let player = self.players.get_mut(&id).ok_or(Error::PlayerNotFound(id))?;
        player.status = status;
        Ok(())
    }

    /// Players in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Drop every player. Ids handed out before stay retired.
    pub fn clear(&mut self) {
        self.players.clear();
        self.names.clear();
    }
}
