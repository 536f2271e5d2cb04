//! Card definitions - static card data.
//!
//! `CardDefinition` holds what every copy of a card shares: name, cost,
//! rarity, type, effect reference and (for creatures) printed stats.
//! Per-copy state (current stats, flags, face-down status) lives in
//! [`Card`](super::Card), produced by [`CardDefinition::instantiate`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::instance::{Card, CardKind, CreatureState, SpellState};
use crate::core::InstanceId;
use crate::effects::EffectId;

/// Identifier of a card definition, shared by all copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl CardId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// The closed set of card types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    Creature,
    Action,
    Support,
    Trap,
}

impl CardType {
    /// Cards of this type live in support slots when on the field.
    #[must_use]
    pub const fn uses_support_slot(self) -> bool {
        !matches!(self, CardType::Creature)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Whether an effect is spent after one use or keeps working.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    OneTime,
    Continuous,
}

/// A keyword ability such as "GUARD" or "SWIFT".
///
/// Keywords are data: the engine stores, adds and removes them, and
/// effect filters can match on them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyword(pub String);

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Keyword {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Printed stats of a creature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureProfile {
    pub attack: i32,
    pub defense: i32,
    pub hp: i32,
    #[serde(default)]
    pub affinity: Option<String>,
    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 2]>,
    /// MAX cards leave the game entirely when destroyed.
    #[serde(default)]
    pub is_max: bool,
}

/// Static card definition.
///
/// ```
/// use lane_duel::cards::{CardDefinition, CardId, CardType};
///
/// let drake = CardDefinition::creature(CardId::new(1), "Ember Drake", 120, 40, 90)
///     .with_cost(3)
///     .with_affinity("FIRE");
///
/// assert_eq!(drake.card_type, CardType::Creature);
/// assert_eq!(drake.creature.as_ref().unwrap().attack, 120);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub card_type: CardType,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect_id: Option<EffectId>,
    #[serde(default)]
    pub effect_type: Option<EffectType>,
    /// Present exactly when `card_type` is `Creature`.
    #[serde(default)]
    pub creature: Option<CreatureProfile>,
}

impl CardDefinition {
    fn base(id: CardId, name: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id,
            name: name.into(),
            card_type,
            cost: 0,
            rarity: Rarity::default(),
            description: String::new(),
            effect_id: None,
            effect_type: None,
            creature: None,
        }
    }

    /// A creature with printed attack, defense and hit points.
    #[must_use]
    pub fn creature(id: CardId, name: impl Into<String>, attack: i32, defense: i32, hp: i32) -> Self {
        let mut def = Self::base(id, name, CardType::Creature);
        def.creature = Some(CreatureProfile {
            attack,
            defense,
            hp,
            ..CreatureProfile::default()
        });
        def
    }

    #[must_use]
    pub fn action(id: CardId, name: impl Into<String>) -> Self {
        Self::base(id, name, CardType::Action)
    }

    #[must_use]
    pub fn support(id: CardId, name: impl Into<String>) -> Self {
        Self::base(id, name, CardType::Support)
    }

    #[must_use]
    pub fn trap(id: CardId, name: impl Into<String>) -> Self {
        Self::base(id, name, CardType::Trap)
    }

    #[must_use]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect_id: impl Into<EffectId>, effect_type: EffectType) -> Self {
        self.effect_id = Some(effect_id.into());
        self.effect_type = Some(effect_type);
        self
    }

    /// Set the creature affinity. No-op for non-creatures.
    #[must_use]
    pub fn with_affinity(mut self, affinity: impl Into<String>) -> Self {
        if let Some(profile) = self.creature.as_mut() {
            profile.affinity = Some(affinity.into());
        }
        self
    }

    /// Add a printed keyword. No-op for non-creatures.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<Keyword>) -> Self {
        if let Some(profile) = self.creature.as_mut() {
            profile.keywords.push(keyword.into());
        }
        self
    }

    /// Mark a creature as a MAX card. No-op for non-creatures.
    #[must_use]
    pub fn as_max(mut self) -> Self {
        if let Some(profile) = self.creature.as_mut() {
            profile.is_max = true;
        }
        self
    }

    /// Create a runtime copy of this card.
    ///
    /// Returns `None` for a creature definition missing its profile.
    #[must_use]
    pub fn instantiate(&self, instance: InstanceId) -> Option<Card> {
        let kind = match self.card_type {
            CardType::Creature => CardKind::Creature(CreatureState::from_profile(self.creature.as_ref()?)),
            CardType::Action => CardKind::Action(SpellState::default()),
            CardType::Support => CardKind::Support(SpellState::default()),
            CardType::Trap => CardKind::Trap(SpellState::default()),
        };

        Some(Card {
            id: self.id,
            instance,
            name: self.name.clone(),
            cost: self.cost,
            rarity: self.rarity,
            description: self.description.clone(),
            effect_id: self.effect_id.clone(),
            effect_type: self.effect_type,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_builder() {
        let def = CardDefinition::creature(CardId::new(7), "Golem", 50, 80, 120)
            .with_cost(4)
            .with_rarity(Rarity::Rare)
            .with_keyword("GUARD")
            .as_max();

        let profile = def.creature.as_ref().unwrap();
        assert_eq!(def.cost, 4);
        assert_eq!(def.rarity, Rarity::Rare);
        assert_eq!(profile.keywords.as_slice(), &[Keyword::new("GUARD")]);
        assert!(profile.is_max);
    }

    #[test]
    fn test_creature_only_modifiers_ignore_spells() {
        let def = CardDefinition::support(CardId::new(2), "Banner")
            .with_affinity("FIRE")
            .with_keyword("GUARD")
            .as_max();
        assert!(def.creature.is_none());
        assert!(def.card_type.uses_support_slot());
    }

    #[test]
    fn test_instantiate_creature() {
        let def = CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40)
            .with_effect("howl", EffectType::OneTime);
        let card = def.instantiate(InstanceId(5)).unwrap();

        assert_eq!(card.instance, InstanceId(5));
        assert_eq!(card.effect_id, Some(EffectId::new("howl")));
        let creature = card.creature().unwrap();
        assert_eq!(creature.attack, 60);
        assert_eq!(creature.base_attack, 60);
        assert_eq!(creature.hp, 40);
        assert_eq!(creature.max_hp, 40);
    }

    #[test]
    fn test_instantiate_creature_without_profile_fails() {
        let mut def = CardDefinition::creature(CardId::new(1), "Broken", 1, 1, 1);
        def.creature = None;
        assert!(def.instantiate(InstanceId(1)).is_none());
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "id": 12,
            "name": "Ambush",
            "card_type": "TRAP",
            "effect_id": "ambush",
            "effect_type": "ONE_TIME"
        }"#;
        let def: CardDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.card_type, CardType::Trap);
        assert_eq!(def.effect_type, Some(EffectType::OneTime));
        assert_eq!(def.rarity, Rarity::Common);
    }
}
