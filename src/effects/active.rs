//! Active effects - lingering modifiers tracked apart from their cards.
//!
//! Registering an `ActiveEffect` applies it to every creature it covers
//! right away. Creatures that arrive later are picked up by
//! [`apply_matching`], which the engine calls on play and on reveal.
//! Each effect remembers exactly what it changed on which instance, so
//! reverting is exact and a creature is never modified twice by the same
//! effect.

use serde::{Deserialize, Serialize};

use super::definition::{CreatureFilter, EffectId, Scope};
use crate::cards::{Card, CardId, Keyword};
use crate::core::{GameState, InstanceId, PlayerId, PlayerPair, PlayerState};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub atk: i32,
    pub def: i32,
}

/// Which creatures an active effect covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveScope {
    /// Every matching creature on the selected side(s), including later arrivals.
    Board { scope: Scope, filter: CreatureFilter },
    /// One creature instance.
    Instance(InstanceId),
}

/// One creature an effect has modified, with the change it made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affected {
    pub instance: InstanceId,
    pub applied: StatModifier,
    /// The keyword was absent and this effect granted it.
    #[serde(default)]
    pub keyword_added: bool,
}

/// A lingering buff, debuff or keyword grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect_id: EffectId,
    pub name: String,
    pub source_card: CardId,
    pub source_instance: InstanceId,
    pub owner: PlayerId,
    /// `None` lasts until removed.
    pub remaining_turns: Option<u32>,
    pub description: String,
    pub scope: ActiveScope,
    pub modifier: Option<StatModifier>,
    pub keyword: Option<Keyword>,
    pub affected: Vec<Affected>,
}

impl ActiveEffect {
    #[must_use]
    pub fn has_affected(&self, instance: InstanceId) -> bool {
        self.affected.iter().any(|a| a.instance == instance)
    }

    pub fn affected_ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.affected.iter().map(|a| a.instance)
    }

    /// Would this effect apply to `card`, controlled by `controller`?
    #[must_use]
    pub fn covers(&self, controller: PlayerId, card: &Card) -> bool {
        match &self.scope {
            ActiveScope::Instance(instance) => card.instance == *instance,
            ActiveScope::Board { scope, filter } => {
                let side_ok = match scope {
                    Scope::Allies => controller == self.owner,
                    Scope::Enemies => controller != self.owner,
                    Scope::All => true,
                    Scope::Source => card.instance == self.source_instance,
                    Scope::Target => false,
                };
                side_ok && card.creature().is_some_and(|c| filter.matches(c))
            }
        }
    }

    /// Apply to one card if not already applied. Returns true on change.
    fn apply_to(&mut self, card: &mut Card) -> bool {
        if self.has_affected(card.instance) {
            return false;
        }
        let Some(creature) = card.creature_mut() else {
            return false;
        };

        let mut applied = StatModifier::default();
        let mut changed = false;
        if let Some(m) = self.modifier {
            let (atk, def) = creature.apply_stat_delta(m.atk, m.def);
            applied = StatModifier { atk, def };
            changed = true;
        }
        let keyword_added = self
            .keyword
            .as_ref()
            .is_some_and(|keyword| creature.add_keyword(keyword.clone()));
        changed |= keyword_added;

        if changed {
            self.affected.push(Affected {
                instance: card.instance,
                applied,
                keyword_added,
            });
        }
        changed
    }

    /// Take over ownership of a keyword another effect granted to `instance`.
    fn adopt_keyword(&mut self, instance: InstanceId) {
        match self.affected.iter_mut().find(|a| a.instance == instance) {
            Some(affected) => affected.keyword_added = true,
            None => self.affected.push(Affected {
                instance,
                applied: StatModifier::default(),
                keyword_added: true,
            }),
        }
    }
}

/// Register an effect and apply it to the current boards.
///
/// Returns how many creatures it modified.
pub fn register(state: &mut GameState, mut effect: ActiveEffect) -> usize {
    let mut count = 0;
    for (controller, side) in state.players.iter_mut() {
        for card in side.lanes.iter_mut().flatten() {
            if effect.covers(controller, card) && effect.apply_to(card) {
                count += 1;
            }
        }
    }
    tracing::debug!(effect = %effect.effect_id, count, "registered active effect");
    state.active_effects.push(effect);
    count
}

/// Apply every already-active effect that covers the creature in `lane`.
///
/// Returns how many effects changed it.
pub fn apply_matching(state: &mut GameState, player: PlayerId, lane: usize) -> usize {
    let GameState {
        players,
        active_effects,
        ..
    } = state;
    let Some(card) = players[player].creature_mut(lane) else {
        return 0;
    };

    let mut count = 0;
    for effect in active_effects.iter_mut() {
        if effect.covers(player, card) && effect.apply_to(card) {
            count += 1;
        }
    }
    count
}

/// Undo everything `effect` did to creatures still on the field.
///
/// A granted keyword that another remaining effect also grants stays on
/// the creature and passes to that effect.
fn revert(players: &mut PlayerPair<PlayerState>, remaining: &mut [ActiveEffect], effect: &ActiveEffect) {
    for affected in &effect.affected {
        let card = players.iter_mut().find_map(|(controller, side)| {
            side.lanes
                .iter_mut()
                .flatten()
                .find(|c| c.instance == affected.instance)
                .map(|card| (controller, card))
        });
        let Some((controller, card)) = card else {
            continue;
        };

        let heir = match &effect.keyword {
            Some(keyword) if affected.keyword_added => remaining
                .iter()
                .position(|other| other.keyword.as_ref() == Some(keyword) && other.covers(controller, card)),
            _ => None,
        };
        let Some(creature) = card.creature_mut() else {
            continue;
        };
        creature.apply_stat_delta(-affected.applied.atk, -affected.applied.def);

        match (heir, &effect.keyword) {
            (Some(index), _) => remaining[index].adopt_keyword(affected.instance),
            (None, Some(keyword)) if affected.keyword_added => {
                creature.remove_keyword(keyword);
            }
            _ => {}
        }
    }
}

/// Remove and revert every effect granted by `source`.
pub fn remove_from_source(state: &mut GameState, source: InstanceId) -> Vec<ActiveEffect> {
    remove_where(state, |effect| effect.source_instance == source)
}

/// Remove and revert every effect matching `predicate`.
pub fn remove_where(
    state: &mut GameState,
    predicate: impl Fn(&ActiveEffect) -> bool,
) -> Vec<ActiveEffect> {
    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.active_effects)
        .into_iter()
        .partition(|effect| predicate(effect));
    state.active_effects = kept;
    for effect in &removed {
        revert(&mut state.players, &mut state.active_effects, effect);
    }
    removed
}

/// Count down the owner's timed effects. Expired ones are reverted and returned.
pub fn tick(state: &mut GameState, owner: PlayerId) -> Vec<ActiveEffect> {
    for effect in state.active_effects.iter_mut().filter(|e| e.owner == owner) {
        if let Some(turns) = effect.remaining_turns.as_mut() {
            *turns = turns.saturating_sub(1);
        }
    }
    remove_where(state, |effect| effect.owner == owner && effect.remaining_turns == Some(0))
}

/// Drop all bookkeeping for a creature that left the field.
///
/// Effects bound to that one instance go away entirely.
pub fn forget_instance(state: &mut GameState, instance: InstanceId) {
    state
        .active_effects
        .retain(|effect| effect.scope != ActiveScope::Instance(instance));
    for effect in &mut state.active_effects {
        effect.affected.retain(|a| a.instance != instance);
    }
}
