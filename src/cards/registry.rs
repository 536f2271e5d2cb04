//! Card registry for definition lookup.
//!
//! The `CardRegistry` stores every card definition available to a match
//! and stamps out runtime copies for decks.

use rustc_hash::FxHashMap;

use super::definition::{CardDefinition, CardId, CardType};
use super::instance::Card;
use crate::core::InstanceId;

/// Problems with card data.
#[derive(Debug, thiserror::Error)]
pub enum CardDataError {
    #[error("card {0} is defined twice")]
    Duplicate(CardId),

    #[error("creature card {0} has no creature stats")]
    MissingCreatureStats(CardId),

    #[error("malformed card data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Registry of card definitions.
///
/// ```
/// use lane_duel::cards::{CardRegistry, CardDefinition, CardId};
///
/// let mut registry = CardRegistry::new();
/// registry
///     .register(CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40))
///     .unwrap();
///
/// let found = registry.get(CardId::new(1)).unwrap();
/// assert_eq!(found.name, "Wolf");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, CardDataError> {
        let definitions: Vec<CardDefinition> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for def in definitions {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Register a card definition.
    pub fn register(&mut self, card: CardDefinition) -> Result<(), CardDataError> {
        if self.cards.contains_key(&card.id) {
            return Err(CardDataError::Duplicate(card.id));
        }
        if card.card_type == CardType::Creature && card.creature.is_none() {
            return Err(CardDataError::MissingCreatureStats(card.id));
        }
        self.cards.insert(card.id, card);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    /// Create a runtime copy of a registered card.
    #[must_use]
    pub fn instantiate(&self, id: CardId, instance: InstanceId) -> Option<Card> {
        self.get(id)?.instantiate(instance)
    }
}
