//! Match configuration.
//!
//! Callers describe a match with a `MatchConfig` and hand it to
//! `MatchBuilder`. Board geometry (three lanes, three support slots) is
//! fixed by the rules and not configurable.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Creature lanes per player.
pub const LANE_COUNT: usize = 3;

/// Support slots per player.
pub const SUPPORT_SLOT_COUNT: usize = 3;

/// Tunable match parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Life points each player starts with.
    pub starting_life: i64,

    /// Cards dealt to each player before turn 1. Hands start empty by default.
    pub starting_hand_size: usize,

    /// Seat that takes turn 1 (and may not attack on it).
    pub first_player: PlayerId,

    /// Seed for deck shuffles and effect randomness.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            starting_life: 8000,
            starting_hand_size: 0,
            first_player: PlayerId::new(0),
            seed: 42,
        }
    }
}

impl MatchConfig {
    #[must_use]
    pub fn with_starting_life(mut self, life: i64) -> Self {
        self.starting_life = life;
        self
    }

    #[must_use]
    pub fn with_starting_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }

    #[must_use]
    pub fn with_first_player(mut self, player: PlayerId) -> Self {
        self.first_player = player;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.starting_life, 8000);
        assert_eq!(config.starting_hand_size, 0);
        assert_eq!(config.first_player, PlayerId::new(0));
    }

    #[test]
    fn test_builder_pattern() {
        let config = MatchConfig::default()
            .with_starting_life(200)
            .with_starting_hand_size(5)
            .with_first_player(PlayerId::new(1))
            .with_seed(7);

        assert_eq!(config.starting_life, 200);
        assert_eq!(config.starting_hand_size, 5);
        assert_eq!(config.first_player, PlayerId::new(1));
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"starting_life": 4000}"#).unwrap();
        assert_eq!(config.starting_life, 4000);
        assert_eq!(config.starting_hand_size, 0);
    }
}
