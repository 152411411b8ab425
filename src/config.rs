use crate::ship::ShipType;

pub const BOARD_SIZE: usize = 10;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipType; NUM_SHIPS] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Default wait applied to long polls that do not pass their own timeout.
pub const DEFAULT_LONG_POLL_TIMEOUT: core::time::Duration = core::time::Duration::from_secs(30);

#[cfg(feature = "std")]
pub use self::server_config::Config;

#[cfg(feature = "std")]
mod server_config {
    use std::time::Duration;

    use crate::quota::ShipWeights;
    use crate::registry::NameRules;

    /// Runtime settings for a [`GameServer`](crate::GameServer).
    #[derive(Debug, Clone)]
    pub struct Config {
        /// Wait used by `poll_lobby`/`poll_game` when the caller passes `None`.
        pub long_poll_timeout: Duration,
        /// Display-name format rules.
        pub name_rules: NameRules,
        /// Shot allowance table used unless another quota policy is injected.
        pub shot_weights: ShipWeights,
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                long_poll_timeout: super::DEFAULT_LONG_POLL_TIMEOUT,
                name_rules: NameRules::default(),
                shot_weights: ShipWeights::default(),
            }
        }
    }

    impl Config {
        pub fn with_long_poll_timeout(mut self, timeout: Duration) -> Self {
            self.long_poll_timeout = timeout;
            self
        }
    }
}
