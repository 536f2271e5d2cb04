//! The capability façade effect handlers work through.
//!
//! Handlers never touch `GameState` directly for mutation. `EffectUtils`
//! exposes creature queries, stat and HP changes, draws and discards,
//! keyword and mode changes, active-effect registration and logging, all
//! relative to the effect's owner and source. Creatures destroyed along
//! the way are collected so the resolver can fire their `ON_DESTROY`
//! effects afterwards.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::active::{self, ActiveEffect, ActiveScope, StatModifier};
use super::condition::ConditionContext;
use super::definition::{Duration, EffectDefinition, PlayerSelector, Scope, Selector};
use super::handlers::EffectError;
use crate::cards::{CardId, Keyword, Mode};
use crate::core::{EntityRef, EventKind, GameRng, GameState, InstanceId, PlayerId};
use crate::zones::{self, transfer, Destroyed, Zone};

/// Event-scoped context passed along with a trigger, such as the lane
/// being attacked or the creature a support card is aimed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub target_player: Option<PlayerId>,
    pub target_lane: Option<usize>,
    pub target_instance: Option<InstanceId>,
}

impl EventData {
    #[must_use]
    pub fn lane(player: PlayerId, lane: usize) -> Self {
        Self {
            target_player: Some(player),
            target_lane: Some(lane),
            target_instance: None,
        }
    }

    #[must_use]
    pub fn instance(instance: InstanceId) -> Self {
        Self {
            target_instance: Some(instance),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_player.is_none() && self.target_lane.is_none() && self.target_instance.is_none()
    }
}

/// The card an effect came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub card: CardId,
    pub instance: InstanceId,
}

/// A creature on the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatureSlot {
    pub player: PlayerId,
    pub lane: usize,
    pub instance: InstanceId,
}

/// Mutation façade handed to effect handlers.
pub struct EffectUtils<'a> {
    state: &'a mut GameState,
    effect: &'a EffectDefinition,
    owner: PlayerId,
    source: SourceRef,
    event: EventData,
    destroyed: Vec<Destroyed>,
}

impl<'a> EffectUtils<'a> {
    pub(crate) fn new(
        state: &'a mut GameState,
        effect: &'a EffectDefinition,
        owner: PlayerId,
        source: SourceRef,
        event: EventData,
    ) -> Self {
        Self {
            state,
            effect,
            owner,
            source,
            event,
            destroyed: Vec::new(),
        }
    }

    // === Context ===

    #[must_use]
    pub fn state(&self) -> &GameState {
        self.state
    }

    #[must_use]
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    #[must_use]
    pub fn source(&self) -> SourceRef {
        self.source
    }

    #[must_use]
    pub fn event(&self) -> EventData {
        self.event
    }

    #[must_use]
    pub fn effect(&self) -> &EffectDefinition {
        self.effect
    }

    pub fn rng(&mut self) -> &mut GameRng {
        &mut self.state.rng
    }

    #[must_use]
    pub fn condition_context(&self) -> ConditionContext {
        ConditionContext {
            owner: self.owner,
            source: Some(self.source.instance),
            target: self.target().map(|slot| slot.instance),
        }
    }

    pub(crate) fn into_destroyed(self) -> Vec<Destroyed> {
        self.destroyed
    }

    // === Queries ===

    fn creatures_of(&self, player: PlayerId) -> impl Iterator<Item = CreatureSlot> + '_ {
        self.state
            .player(player)
            .creatures()
            .map(move |(lane, card)| CreatureSlot {
                player,
                lane,
                instance: card.instance,
            })
    }

    #[must_use]
    pub fn allies(&self) -> Vec<CreatureSlot> {
        self.creatures_of(self.owner).collect()
    }

    #[must_use]
    pub fn enemies(&self) -> Vec<CreatureSlot> {
        self.creatures_of(self.owner.opponent()).collect()
    }

    #[must_use]
    pub fn all_creatures(&self) -> Vec<CreatureSlot> {
        PlayerId::both()
            .into_iter()
            .flat_map(|p| self.creatures_of(p).collect::<Vec<_>>())
            .collect()
    }

    #[must_use]
    pub fn filter_by_affinity(&self, slots: &[CreatureSlot], affinity: &str) -> Vec<CreatureSlot> {
        slots
            .iter()
            .copied()
            .filter(|slot| {
                self.creature_at(*slot)
                    .is_some_and(|c| c.affinity.as_deref() == Some(affinity))
            })
            .collect()
    }

    fn creature_at(&self, slot: CreatureSlot) -> Option<&crate::cards::CreatureState> {
        self.state
            .player(slot.player)
            .creature(slot.lane)
            .filter(|card| card.instance == slot.instance)?
            .creature()
    }

    fn locate(&self, instance: InstanceId) -> Option<CreatureSlot> {
        let (player, lane) = self.state.locate_creature(instance)?;
        Some(CreatureSlot { player, lane, instance })
    }

    /// The event-scoped target creature, if it is still on the field.
    #[must_use]
    pub fn target(&self) -> Option<CreatureSlot> {
        if let Some(instance) = self.event.target_instance {
            return self.locate(instance);
        }
        let (player, lane) = (self.event.target_player?, self.event.target_lane?);
        let card = self.state.player(player).creature(lane)?;
        Some(CreatureSlot {
            player,
            lane,
            instance: card.instance,
        })
    }

    /// Creatures a selector picks out.
    ///
    /// A `Source` selector yields nothing once the source has left the
    /// field. A `Target` selector with no target is an error.
    pub fn select(&self, selector: &Selector) -> Result<Vec<CreatureSlot>, EffectError> {
        let candidates = match selector.scope {
            Scope::Source => self.locate(self.source.instance).into_iter().collect(),
            Scope::Target => vec![self.target().ok_or(EffectError::MissingTarget)?],
            Scope::Allies => self.allies(),
            Scope::Enemies => self.enemies(),
            Scope::All => self.all_creatures(),
        };
        Ok(candidates
            .into_iter()
            .filter(|slot| self.creature_at(*slot).is_some_and(|c| selector.filter.matches(c)))
            .collect())
    }

    #[must_use]
    pub fn players(&self, selector: PlayerSelector) -> SmallVec<[PlayerId; 2]> {
        match selector {
            PlayerSelector::Owner => smallvec![self.owner],
            PlayerSelector::Opponent => smallvec![self.owner.opponent()],
            PlayerSelector::Both => smallvec![self.owner, self.owner.opponent()],
        }
    }

    // === Creature Mutation ===

    fn creature_mut(&mut self, slot: CreatureSlot) -> Result<&mut crate::cards::CreatureState, EffectError> {
        self.state
            .player_mut(slot.player)
            .creature_mut(slot.lane)
            .filter(|card| card.instance == slot.instance)
            .and_then(|card| card.creature_mut())
            .ok_or(EffectError::CreatureGone(slot.instance))
    }

    pub fn modify_stats(&mut self, slot: CreatureSlot, atk: i32, def: i32) -> Result<(), EffectError> {
        self.creature_mut(slot)?.apply_stat_delta(atk, def);
        Ok(())
    }

    /// Deal damage, destroying the creature if its HP reaches 0.
    ///
    /// Returns the damage actually dealt.
    pub fn damage(&mut self, slot: CreatureSlot, amount: i32) -> Result<i32, EffectError> {
        let creature = self.creature_mut(slot)?;
        let dealt = creature.take_damage(amount);
        let dead = creature.is_destroyed();
        self.log(format!("deals {dealt} damage"), Some(slot.instance));
        if dead {
            self.destroy(slot)?;
        }
        Ok(dealt)
    }

    pub fn heal(&mut self, slot: CreatureSlot, amount: i32) -> Result<i32, EffectError> {
        Ok(self.creature_mut(slot)?.heal(amount))
    }

    pub fn destroy(&mut self, slot: CreatureSlot) -> Result<(), EffectError> {
        let destroyed = zones::destroy_creature(self.state, slot.player, slot.lane)
            .ok_or(EffectError::CreatureGone(slot.instance))?;
        self.destroyed.push(destroyed);
        Ok(())
    }

    pub fn return_to_hand(&mut self, slot: CreatureSlot) -> Result<(), EffectError> {
        zones::return_to_hand(self.state, slot.player, slot.lane)
            .map(|_| ())
            .ok_or(EffectError::CreatureGone(slot.instance))
    }

    pub fn add_keyword(&mut self, slot: CreatureSlot, keyword: Keyword) -> Result<bool, EffectError> {
        Ok(self.creature_mut(slot)?.add_keyword(keyword))
    }

    pub fn remove_keyword(&mut self, slot: CreatureSlot, keyword: &Keyword) -> Result<bool, EffectError> {
        Ok(self.creature_mut(slot)?.remove_keyword(keyword))
    }

    pub fn set_mode(&mut self, slot: CreatureSlot, mode: Mode) -> Result<(), EffectError> {
        self.creature_mut(slot)?.mode = mode;
        Ok(())
    }

    // === Players ===

    /// Change life points. Reaching 0 or below ends the game.
    pub fn change_life(&mut self, player: PlayerId, delta: i64) {
        self.state.change_life(player, delta);
        self.log(format!("{player} life {delta:+}"), None);
    }

    /// Draw up to `count` cards. Returns how many were drawn.
    pub fn draw(&mut self, player: PlayerId, count: usize) -> usize {
        let mut drawn = 0;
        for _ in 0..count {
            let Some(top) = self.state.player(player).deck.front().map(|c| c.instance) else {
                break;
            };
            if transfer(self.state, player, top, Zone::Deck, Zone::Hand).is_some() {
                drawn += 1;
            }
        }
        if drawn > 0 {
            self.state.record(
                EventKind::Draw,
                Some(player),
                format!("{player} draws {drawn} from {}", self.effect.name),
                smallvec![EntityRef::Player { player }],
            );
        }
        drawn
    }

    /// Discard up to `count` random cards from hand. Returns how many.
    pub fn discard_random(&mut self, player: PlayerId, count: usize) -> usize {
        let mut discarded = 0;
        for _ in 0..count {
            let size = self.state.player(player).hand.len();
            if size == 0 {
                break;
            }
            let index = self.state.rng.gen_range_usize(0..size);
            let Some(instance) = self.state.player(player).hand.get(index).map(|c| c.instance) else {
                break;
            };
            if transfer(self.state, player, instance, Zone::Hand, Zone::Discard).is_some() {
                discarded += 1;
            }
        }
        if discarded > 0 {
            self.state.record(
                EventKind::Discard,
                Some(player),
                format!("{player} discards {discarded} from {}", self.effect.name),
                smallvec![EntityRef::Player { player }],
            );
        }
        discarded
    }

    // === Active Effects ===

    /// Register a lingering stat change or keyword grant.
    ///
    /// Returns how many creatures it modified immediately.
    pub fn register_active(
        &mut self,
        scope: ActiveScope,
        modifier: Option<StatModifier>,
        keyword: Option<Keyword>,
        duration: Duration,
    ) -> usize {
        let effect = ActiveEffect {
            effect_id: self.effect.id.clone(),
            name: self.effect.name.clone(),
            source_card: self.source.card,
            source_instance: self.source.instance,
            owner: self.owner,
            remaining_turns: duration.remaining_turns(),
            description: self.effect.description.clone(),
            scope,
            modifier,
            keyword,
            affected: Vec::new(),
        };
        active::register(self.state, effect)
    }

    // === Logging ===

    /// Log an effect event attributed to this effect and its source.
    pub fn log(&mut self, message: impl Into<String>, about: Option<InstanceId>) {
        let mut refs = smallvec![
            EntityRef::Effect {
                effect: self.effect.id.clone()
            },
            EntityRef::Card {
                card: self.source.card,
                instance: self.source.instance
            },
        ];
        if let Some(instance) = about {
            if let Some(card) = self.state.creature_by_instance(instance) {
                refs.push(EntityRef::Card {
                    card: card.id,
                    instance,
                });
            }
        }
        let message = format!("{}: {}", self.effect.name, message.into());
        self.state.record(EventKind::Effect, Some(self.owner), message, refs);
    }
}
