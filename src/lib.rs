//! # lane-duel
//!
//! Rules engine and AI opponent for a two-player, lane-based card game.
//!
//! Each player has three creature lanes, three support slots, a hand, a
//! deck and a discard pile. Players take turns drawing, playing creatures
//! and spells, activating effects and attacking across lanes until one
//! player's life points reach zero.
//!
//! ## Design Principles
//!
//! 1. **One Owner**: A match is one `GameState` owned by one `BattleEngine`.
//!    Humans and the AI both change it only through engine actions.
//!
//! 2. **Validate, Then Mutate**: Every action checks all of its rules
//!    before touching state. A rejected action leaves no trace.
//!
//! 3. **Untrusted Data, Trusted Interpreter**: Card abilities are
//!    declarative `EffectDefinition` trees. Missing or faulty effects
//!    degrade to a logged warning.
//!
//! ## Modules
//!
//! - `core`: Ids, players, configuration, RNG, event log, game state, setup
//! - `cards`: Card definitions, runtime card instances, the card registry
//! - `zones`: Zone transfer and board removal (destroy, bounce, discard)
//! - `effects`: Effect data, resolver, handlers and lingering active effects
//! - `rules`: `BattleEngine`, actions, combat math
//! - `ai`: Skill-scaled AI opponent

pub mod ai;
pub mod cards;
pub mod core;
pub mod effects;
pub mod rules;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    EventKind, EventLog, GameEvent, GameRng, GameState, InstanceId, MatchBuilder, MatchConfig, Phase,
    PlayerId, PlayerState,
};

pub use crate::cards::{Card, CardDefinition, CardId, CardRegistry, CardType, EffectType, Mode};

pub use crate::effects::{EffectDefinition, EffectId, EffectRegistry, EffectResolver, EventData, Trigger};

pub use crate::rules::{ActionError, Activation, AttackOutcome, BattleEngine, GameResult, PlayOptions, PlayerAction};

pub use crate::ai::{AiConfig, AiPlayer};
