//! Game rules: validation, turn flow and combat.
//!
//! `BattleEngine` is the single entry point for changing a match. It
//! validates each action against the current `GameState`, applies it,
//! logs it and runs any triggered effects.
//!
//! - `PlayerAction`: Actions as data, for enumeration and replay
//! - `ActionError`: Why an action was rejected
//! - `combat`: Damage exchange between two creatures

pub mod action;
pub mod combat;
pub mod engine;
pub mod error;

pub use action::{PlayOptions, PlayerAction};
pub use combat::Exchange;
pub use engine::{Activation, AttackOutcome, BattleEngine, GameResult, Outcome};
pub use error::ActionError;
