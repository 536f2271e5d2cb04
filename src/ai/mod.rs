//! AI opponent.
//!
//! - `AiConfig`: Skill level and derived probabilities
//! - `AiPlayer`: Runs a turn through `BattleEngine` actions
//! - `scoring`: Pure board evaluation (attack targets, lanes, modes, traps)
//! - `TurnPacer`: Hook for pauses between sub-actions
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use lane_duel::ai::{AiConfig, AiPlayer, NoPacing};
//! use lane_duel::cards::{CardDefinition, CardId, CardRegistry};
//! use lane_duel::core::{MatchBuilder, MatchConfig, PlayerId};
//! use lane_duel::effects::EffectRegistry;
//! use lane_duel::rules::BattleEngine;
//!
//! let mut cards = CardRegistry::new();
//! cards
//!     .register(CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40))
//!     .unwrap();
//! let state = MatchBuilder::new(&cards, MatchConfig::default())
//!     .with_deck(PlayerId(0), vec![CardId::new(1); 10])
//!     .with_deck(PlayerId(1), vec![CardId::new(1); 10])
//!     .build()
//!     .unwrap();
//! let mut engine = BattleEngine::new(state, Arc::new(EffectRegistry::new()));
//!
//! let mut ai = AiPlayer::new(AiConfig::new(7, PlayerId(0)));
//! ai.take_turn(&mut engine, &mut NoPacing);
//! assert_eq!(engine.state().active_player, PlayerId(1));
//! ```

pub mod config;
pub mod pacing;
pub mod player;
pub mod scoring;

pub use config::{AiConfig, MAX_SKILL, MIN_SKILL};
pub use pacing::{AiStep, NoPacing, TurnPacer};
pub use player::AiPlayer;
