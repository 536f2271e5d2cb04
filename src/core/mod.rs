//! Core engine types: instance ids, players, state, log, RNG, configuration.
//!
//! Everything else in the crate reads and writes `GameState`; the other
//! types here identify things inside it.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod log;
pub mod state;
pub mod setup;

pub use entity::InstanceId;
pub use player::{PlayerId, PlayerPair};
pub use rng::GameRng;
pub use config::{MatchConfig, LANE_COUNT, SUPPORT_SLOT_COUNT};
pub use log::{EntityRef, EventKind, EventLog, GameEvent};
pub use state::{GameState, Phase, PlayerState};
pub use setup::{MatchBuilder, SetupError};
