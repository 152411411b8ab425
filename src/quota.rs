//! Shot allowance per round, derived from the shooter's own surviving fleet.

use serde::Serialize;

/// Damage state of one ship as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipStatus {
    pub name: String,
    pub length: usize,
    pub hits: usize,
    pub sunk: bool,
}

/// Policy mapping a player's own fleet to the number of cells they may aim at.
///
/// Implementations must never grow the allowance when one more ship sinks.
pub trait ShotQuota: Send + Sync {
    fn shots(&self, fleet: &[ShipStatus]) -> usize;
}

/// Each afloat ship contributes its weight; unlisted ships contribute
/// `default_weight`. Weights below 1 are treated as 1 so every sinking costs
/// at least one shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipWeights {
    pub weights: Vec<(String, usize)>,
    pub default_weight: usize,
}

impl ShipWeights {
    pub fn weight_of(&self, ship: &str) -> usize {
        self.weights
            .iter()
            .find(|(name, _)| name == ship)
            .map_or(self.default_weight, |(_, w)| *w)
            .max(1)
    }
}

impl Default for ShipWeights {
    /// Carrier counts double: six shots for the full standard fleet.
    fn default() -> Self {
        Self {
            weights: vec![("Carrier".to_string(), 2)],
            default_weight: 1,
        }
    }
}

impl ShotQuota for ShipWeights {
    fn shots(&self, fleet: &[ShipStatus]) -> usize {
        fleet
            .iter()
            .filter(|s| !s.sunk)
            .map(|s| self.weight_of(&s.name))
            .sum()
    }
}

/// The same allowance every round while any ship is afloat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuota(pub usize);

impl ShotQuota for FixedQuota {
    fn shots(&self, fleet: &[ShipStatus]) -> usize {
        if fleet.iter().any(|s| !s.sunk) {
            self.0
        } else {
            0
        }
    }
}
