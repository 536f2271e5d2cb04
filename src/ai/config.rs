//! AI opponent configuration.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Lowest accepted skill level.
pub const MIN_SKILL: u8 = 1;

/// Highest accepted skill level.
pub const MAX_SKILL: u8 = 10;

/// AI opponent parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Skill level, clamped to 1-10.
    /// Higher values play more often and choose more greedily.
    pub skill: u8,

    /// Seat the AI plays.
    pub player: PlayerId,

    /// Seed for the AI's decision stream.
    /// Same seed and same game produce the same decisions.
    pub seed: u64,

    /// End the turn when the pipeline finishes.
    pub end_turn: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            skill: 5,
            player: PlayerId::new(1),
            seed: 7,
            end_turn: true,
        }
    }
}

impl AiConfig {
    #[must_use]
    pub fn new(skill: u8, player: PlayerId) -> Self {
        Self {
            skill: skill.clamp(MIN_SKILL, MAX_SKILL),
            player,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_end_turn(mut self, end_turn: bool) -> Self {
        self.end_turn = end_turn;
        self
    }

    /// Skill level after clamping, for configs built by hand or deserialized.
    #[must_use]
    pub fn skill(&self) -> u8 {
        self.skill.clamp(MIN_SKILL, MAX_SKILL)
    }

    /// Probability of taking part in each pipeline step.
    #[must_use]
    pub fn participation(&self) -> f64 {
        0.35 + 0.065 * f64::from(self.skill())
    }

    /// Chance of picking a random candidate instead of a scored one.
    /// 1.0 at skill 1, 0.0 at skill 10.
    #[must_use]
    pub fn randomness(&self) -> f64 {
        f64::from(MAX_SKILL - self.skill()) / f64::from(MAX_SKILL - MIN_SKILL)
    }

    /// How many of the best-scored candidates a scored pick chooses from.
    #[must_use]
    pub fn top_candidates(&self) -> usize {
        match self.skill() {
            8..=10 => 1,
            5..=7 => 2,
            _ => 3,
        }
    }
}
