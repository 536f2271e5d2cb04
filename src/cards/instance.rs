//! Card instances - runtime card state.
//!
//! A `Card` is one physical copy in a match. It repeats the identity
//! fields of its definition and carries type-specific mutable state in
//! [`CardKind`]: combat stats and per-turn flags for creatures, face-down
//! and activation state for action/support/trap cards.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::{CardId, CardType, CreatureProfile, EffectType, Keyword, Rarity};
use crate::core::{InstanceId, PlayerId};
use crate::effects::EffectId;

/// Creature stance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Attack,
    Defense,
}

impl Mode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Mode::Attack => Mode::Defense,
            Mode::Defense => Mode::Attack,
        }
    }
}

/// Mutable state of a creature copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureState {
    pub base_attack: i32,
    pub base_defense: i32,
    pub attack: i32,
    pub defense: i32,
    pub max_hp: i32,
    pub hp: i32,
    pub mode: Mode,
    pub face_down: bool,
    pub affinity: Option<String>,
    pub keywords: SmallVec<[Keyword; 2]>,
    pub is_max: bool,
    pub has_attacked: bool,
    pub has_changed_mode: bool,
    pub has_activated_effect: bool,
    pub effect_consumed: bool,
}

impl CreatureState {
    /// Fresh state from printed stats.
    #[must_use]
    pub fn from_profile(profile: &CreatureProfile) -> Self {
        let hp = profile.hp.max(0);
        Self {
            base_attack: profile.attack,
            base_defense: profile.defense,
            attack: profile.attack,
            defense: profile.defense,
            max_hp: hp,
            hp,
            mode: Mode::Attack,
            face_down: false,
            affinity: profile.affinity.clone(),
            keywords: profile.keywords.clone(),
            is_max: profile.is_max,
            has_attacked: false,
            has_changed_mode: false,
            has_activated_effect: false,
            effect_consumed: false,
        }
    }

    /// Shift current attack/defense. Neither drops below 0.
    ///
    /// Returns the change actually applied after clamping.
    pub fn apply_stat_delta(&mut self, atk: i32, def: i32) -> (i32, i32) {
        let (attack, defense) = (self.attack, self.defense);
        self.attack = (self.attack + atk).max(0);
        self.defense = (self.defense + def).max(0);
        (self.attack - attack, self.defense - defense)
    }

    /// Lose hit points, floored at 0. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).clamp(0, self.max_hp);
        before - self.hp
    }

    /// Regain hit points, capped at max. Returns the amount healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).clamp(0, self.max_hp);
        self.hp - before
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    /// Add a keyword. Returns false if it was already present.
    pub fn add_keyword(&mut self, keyword: Keyword) -> bool {
        if self.has_keyword(&keyword) {
            return false;
        }
        self.keywords.push(keyword);
        true
    }

    /// Remove a keyword. Returns false if it was absent.
    pub fn remove_keyword(&mut self, keyword: &Keyword) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|k| k != keyword);
        self.keywords.len() != before
    }

    /// Clear the once-per-turn flags.
    pub fn reset_turn_flags(&mut self) {
        self.has_attacked = false;
        self.has_changed_mode = false;
        self.has_activated_effect = false;
    }

    /// Back to printed stats with full HP and no per-turn state.
    pub fn reset_to_base(&mut self) {
        self.attack = self.base_attack;
        self.defense = self.base_defense;
        self.hp = self.max_hp;
        self.mode = Mode::Attack;
        self.face_down = false;
        self.reset_turn_flags();
    }
}

/// Where a targeted support card is pointed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTarget {
    pub player: PlayerId,
    pub lane: Option<usize>,
    pub instance: Option<InstanceId>,
}

/// Mutable state of an action, support or trap copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellState {
    pub face_down: bool,
    pub is_active: bool,
    pub target: Option<SupportTarget>,
}

/// Type-specific state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardKind {
    Creature(CreatureState),
    Action(SpellState),
    Support(SpellState),
    Trap(SpellState),
}

/// One copy of a card in a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub instance: InstanceId,
    pub name: String,
    pub cost: u32,
    pub rarity: Rarity,
    pub description: String,
    pub effect_id: Option<EffectId>,
    pub effect_type: Option<EffectType>,
    pub kind: CardKind,
}

impl Card {
    #[must_use]
    pub fn card_type(&self) -> CardType {
        match self.kind {
            CardKind::Creature(_) => CardType::Creature,
            CardKind::Action(_) => CardType::Action,
            CardKind::Support(_) => CardType::Support,
            CardKind::Trap(_) => CardType::Trap,
        }
    }

    #[must_use]
    pub fn is_creature(&self) -> bool {
        matches!(self.kind, CardKind::Creature(_))
    }

    #[must_use]
    pub fn creature(&self) -> Option<&CreatureState> {
        match &self.kind {
            CardKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn creature_mut(&mut self) -> Option<&mut CreatureState> {
        match &mut self.kind {
            CardKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    /// Action/support/trap state.
    #[must_use]
    pub fn spell(&self) -> Option<&SpellState> {
        match &self.kind {
            CardKind::Action(s) | CardKind::Support(s) | CardKind::Trap(s) => Some(s),
            CardKind::Creature(_) => None,
        }
    }

    pub fn spell_mut(&mut self) -> Option<&mut SpellState> {
        match &mut self.kind {
            CardKind::Action(s) | CardKind::Support(s) | CardKind::Trap(s) => Some(s),
            CardKind::Creature(_) => None,
        }
    }

    #[must_use]
    pub fn is_face_down(&self) -> bool {
        match &self.kind {
            CardKind::Creature(c) => c.face_down,
            CardKind::Action(s) | CardKind::Support(s) | CardKind::Trap(s) => s.face_down,
        }
    }

    pub fn set_face_down(&mut self, face_down: bool) {
        match &mut self.kind {
            CardKind::Creature(c) => c.face_down = face_down,
            CardKind::Action(s) | CardKind::Support(s) | CardKind::Trap(s) => s.face_down = face_down,
        }
    }

    /// Clear field-only state when the card goes back to hand or deck.
    pub fn reset_for_reuse(&mut self) {
        match &mut self.kind {
            CardKind::Creature(c) => c.reset_to_base(),
            CardKind::Action(s) | CardKind::Support(s) | CardKind::Trap(s) => *s = SpellState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;

    fn wolf() -> Card {
        CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40)
            .instantiate(InstanceId(1))
            .unwrap()
    }

    #[test]
    fn test_damage_and_heal_are_clamped() {
        let mut card = wolf();
        let creature = card.creature_mut().unwrap();

        assert_eq!(creature.take_damage(25), 25);
        assert_eq!(creature.hp, 15);
        assert_eq!(creature.heal(100), 25);
        assert_eq!(creature.hp, 40);
        assert_eq!(creature.take_damage(500), 40);
        assert_eq!(creature.hp, 0);
        assert!(creature.is_destroyed());
        assert_eq!(creature.take_damage(-10), 0);
    }

    #[test]
    fn test_stat_delta_floors_at_zero() {
        let mut card = wolf();
        let creature = card.creature_mut().unwrap();
        assert_eq!(creature.apply_stat_delta(-100, 5), (-60, 5));
        assert_eq!(creature.attack, 0);
        assert_eq!(creature.defense, 25);
        assert_eq!(creature.base_attack, 60);
    }

    #[test]
    fn test_keywords_are_a_set() {
        let mut card = wolf();
        let creature = card.creature_mut().unwrap();
        assert!(creature.add_keyword(Keyword::new("SWIFT")));
        assert!(!creature.add_keyword(Keyword::new("SWIFT")));
        assert!(creature.remove_keyword(&Keyword::new("SWIFT")));
        assert!(!creature.remove_keyword(&Keyword::new("SWIFT")));
    }

    #[test]
    fn test_reset_for_reuse() {
        let mut card = wolf();
        {
            let creature = card.creature_mut().unwrap();
            creature.apply_stat_delta(30, 0);
            creature.take_damage(10);
            creature.mode = Mode::Defense;
            creature.has_attacked = true;
        }
        card.set_face_down(true);
        card.reset_for_reuse();

        let creature = card.creature().unwrap();
        assert_eq!(creature.attack, 60);
        assert_eq!(creature.hp, 40);
        assert_eq!(creature.mode, Mode::Attack);
        assert!(!creature.has_attacked);
        assert!(!card.is_face_down());
    }

    #[test]
    fn test_spell_accessors() {
        let mut card = CardDefinition::trap(CardId::new(2), "Net")
            .instantiate(InstanceId(2))
            .unwrap();
        assert_eq!(card.card_type(), CardType::Trap);
        assert!(card.creature().is_none());

        card.set_face_down(true);
        assert!(card.spell().unwrap().face_down);
        card.spell_mut().unwrap().is_active = true;
        card.reset_for_reuse();
        assert_eq!(card.spell(), Some(&SpellState::default()));
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(Mode::Attack.toggled(), Mode::Defense);
        assert_eq!(Mode::Defense.toggled(), Mode::Attack);
    }
}
