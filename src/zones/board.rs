//! Board upkeep for cards leaving the field.
//!
//! A creature leaving its lane takes its bookkeeping with it: effects it
//! granted are reverted, effects that were tracking it forget it, and any
//! support card targeting it is discarded. A support card leaving its slot
//! reverts the effects it granted.

use smallvec::smallvec;

use super::transfer::{transfer, Zone};
use crate::cards::CardId;
use crate::core::{EntityRef, EventKind, GameState, InstanceId, PlayerId};
use crate::effects::{active, EffectId};

/// A creature that was just destroyed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destroyed {
    pub owner: PlayerId,
    pub lane: usize,
    pub card: CardId,
    pub instance: InstanceId,
    pub effect_id: Option<EffectId>,
    /// MAX cards go to the removed pile instead of the discard.
    pub removed_from_game: bool,
}

/// Destroy the creature in `lane`.
///
/// Returns `None` if the lane is empty.
pub fn destroy_creature(state: &mut GameState, player: PlayerId, lane: usize) -> Option<Destroyed> {
    let card = state.player(player).creature(lane)?;
    let (card_id, instance, effect_id) = (card.id, card.instance, card.effect_id.clone());
    let name = card.name.clone();
    let is_max = card.creature().is_some_and(|c| c.is_max);

    let to = if is_max { Zone::Removed } else { Zone::Discard };
    transfer(state, player, instance, Zone::Lane(lane), to)?;

    let message = if is_max {
        format!("{name} is destroyed and removed from the game")
    } else {
        format!("{name} is destroyed")
    };
    state.record(
        EventKind::Destroy,
        Some(player),
        message,
        smallvec![
            EntityRef::Card { card: card_id, instance },
            EntityRef::Lane { player, lane },
        ],
    );
    leave_field(state, instance);

    Some(Destroyed {
        owner: player,
        lane,
        card: card_id,
        instance,
        effect_id,
        removed_from_game: is_max,
    })
}

/// Return the creature in `lane` to its owner's hand.
pub fn return_to_hand(state: &mut GameState, player: PlayerId, lane: usize) -> Option<InstanceId> {
    let card = state.player(player).creature(lane)?;
    let (card_id, instance, name) = (card.id, card.instance, card.name.clone());

    transfer(state, player, instance, Zone::Lane(lane), Zone::Hand)?;
    state.record(
        EventKind::Effect,
        Some(player),
        format!("{name} returns to hand"),
        smallvec![EntityRef::Card { card: card_id, instance }],
    );
    leave_field(state, instance);
    Some(instance)
}

/// Discard the card in a support slot, reverting effects it granted.
pub fn discard_support(state: &mut GameState, player: PlayerId, slot: usize) -> Option<InstanceId> {
    let card = state.player(player).support(slot)?;
    let (card_id, instance, name) = (card.id, card.instance, card.name.clone());

    transfer(state, player, instance, Zone::Support(slot), Zone::Discard)?;
    state.record(
        EventKind::Discard,
        Some(player),
        format!("{name} is discarded"),
        smallvec![
            EntityRef::Card { card: card_id, instance },
            EntityRef::Slot { player, slot },
        ],
    );
    let reverted = active::remove_from_source(state, instance);
    if !reverted.is_empty() {
        tracing::debug!(%instance, count = reverted.len(), "support left play, effects reverted");
    }
    Some(instance)
}

/// Discard every support card whose recorded target is `instance`.
///
/// Returns how many were discarded.
pub fn release_target(state: &mut GameState, instance: InstanceId) -> usize {
    let bound: Vec<(PlayerId, usize)> = PlayerId::both()
        .into_iter()
        .flat_map(|player| {
            state
                .player(player)
                .support_cards()
                .filter(|(_, card)| {
                    card.spell()
                        .and_then(|s| s.target.as_ref())
                        .is_some_and(|t| t.instance == Some(instance))
                })
                .map(move |(slot, _)| (player, slot))
                .collect::<Vec<_>>()
        })
        .collect();

    bound
        .into_iter()
        .filter(|&(player, slot)| discard_support(state, player, slot).is_some())
        .count()
}

fn leave_field(state: &mut GameState, instance: InstanceId) {
    active::remove_from_source(state, instance);
    active::forget_instance(state, instance);
    release_target(state, instance);
}
