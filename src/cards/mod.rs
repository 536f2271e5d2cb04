//! Card model: definitions, instances, and registry.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions (shared by all copies)
//! - `CardDefinition`: Static card data
//! - `Card`: One copy in a match, with a unique `InstanceId`
//! - `CardKind`: Closed set of card types with their mutable state
//! - `CardRegistry`: Definition lookup and instantiation

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{CardDefinition, CardId, CardType, CreatureProfile, EffectType, Keyword, Rarity};
pub use instance::{Card, CardKind, CreatureState, Mode, SpellState, SupportTarget};
pub use registry::{CardDataError, CardRegistry};
