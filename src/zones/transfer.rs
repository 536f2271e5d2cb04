//! Zone transfer: the one way a card changes location.
//!
//! `transfer` removes a card from its source zone and inserts it into the
//! destination in one step. It checks only that the card is where the
//! caller says it is and that the destination can take it (slot empty,
//! creatures in lanes, everything else in support slots). Game rules are
//! the caller's job.
//!
//! ## Ordering
//!
//! - Deck: inserted on top (front)
//! - Hand, discard, stack, removed: appended

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardId};
use crate::core::{GameState, InstanceId, PlayerId, LANE_COUNT, SUPPORT_SLOT_COUNT};

/// A card location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Deck,
    Hand,
    Lane(usize),
    Support(usize),
    Discard,
    /// Shared between both players.
    Stack,
    /// Removed from the game. Valid only as a destination.
    Removed,
}

impl Zone {
    /// Lane and support slots hold one card each.
    #[must_use]
    pub const fn is_slot(self) -> bool {
        matches!(self, Zone::Lane(_) | Zone::Support(_))
    }
}

/// Which card to move: the first copy of a definition, or one exact instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardRef {
    Definition(CardId),
    Instance(InstanceId),
}

impl CardRef {
    #[must_use]
    pub fn matches(self, card: &Card) -> bool {
        match self {
            CardRef::Definition(id) => card.id == id,
            CardRef::Instance(instance) => card.instance == instance,
        }
    }
}

impl From<CardId> for CardRef {
    fn from(id: CardId) -> Self {
        CardRef::Definition(id)
    }
}

impl From<InstanceId> for CardRef {
    fn from(instance: InstanceId) -> Self {
        CardRef::Instance(instance)
    }
}

/// Move a card between zones.
///
/// Returns the moved card's instance id, or `None` with nothing changed if
/// the card is not in `from` or `to` cannot take it.
///
/// Cards entering a hand or deck lose their field state (buffs, damage,
/// mode, face-down flag).
pub fn transfer(
    state: &mut GameState,
    player: PlayerId,
    card: impl Into<CardRef>,
    from: Zone,
    to: Zone,
) -> Option<InstanceId> {
    let card = card.into();
    if from == Zone::Removed || !destination_open(state, player, to) {
        return None;
    }

    let located = locate(state, player, card, from)?;
    let is_creature = peek(state, player, from, located)?.is_creature();
    match to {
        Zone::Lane(_) if !is_creature => return None,
        Zone::Support(_) if is_creature => return None,
        _ => {}
    }

    let mut moved = take(state, player, from, located)?;
    if matches!(to, Zone::Hand | Zone::Deck) {
        moved.reset_for_reuse();
    }
    let instance = moved.instance;
    place(state, player, to, moved);
    Some(instance)
}

fn destination_open(state: &GameState, player: PlayerId, to: Zone) -> bool {
    let side = state.player(player);
    match to {
        Zone::Lane(lane) => lane < LANE_COUNT && side.lanes[lane].is_none(),
        Zone::Support(slot) => slot < SUPPORT_SLOT_COUNT && side.supports[slot].is_none(),
        _ => true,
    }
}

fn pile(state: &GameState, player: PlayerId, zone: Zone) -> Option<&Vector<Card>> {
    let side = state.player(player);
    match zone {
        Zone::Deck => Some(&side.deck),
        Zone::Hand => Some(&side.hand),
        Zone::Discard => Some(&side.discard),
        Zone::Removed => Some(&side.removed),
        Zone::Stack => Some(&state.stack),
        Zone::Lane(_) | Zone::Support(_) => None,
    }
}

fn pile_mut(state: &mut GameState, player: PlayerId, zone: Zone) -> Option<&mut Vector<Card>> {
    if zone == Zone::Stack {
        return Some(&mut state.stack);
    }
    let side = state.player_mut(player);
    match zone {
        Zone::Deck => Some(&mut side.deck),
        Zone::Hand => Some(&mut side.hand),
        Zone::Discard => Some(&mut side.discard),
        Zone::Removed => Some(&mut side.removed),
        Zone::Stack | Zone::Lane(_) | Zone::Support(_) => None,
    }
}

/// Index of the card within a pile, or 0 for a slot that holds it.
fn locate(state: &GameState, player: PlayerId, card: CardRef, from: Zone) -> Option<usize> {
    let side = state.player(player);
    match from {
        Zone::Lane(lane) => side.creature(lane).filter(|c| card.matches(c)).map(|_| 0),
        Zone::Support(slot) => side.support(slot).filter(|c| card.matches(c)).map(|_| 0),
        _ => pile(state, player, from)?.iter().position(|c| card.matches(c)),
    }
}

fn peek(state: &GameState, player: PlayerId, from: Zone, index: usize) -> Option<&Card> {
    let side = state.player(player);
    match from {
        Zone::Lane(lane) => side.creature(lane),
        Zone::Support(slot) => side.support(slot),
        _ => pile(state, player, from)?.get(index),
    }
}

fn take(state: &mut GameState, player: PlayerId, from: Zone, index: usize) -> Option<Card> {
    match from {
        Zone::Lane(lane) => state.player_mut(player).lanes.get_mut(lane)?.take(),
        Zone::Support(slot) => state.player_mut(player).supports.get_mut(slot)?.take(),
        _ => {
            let pile = pile_mut(state, player, from)?;
            (index < pile.len()).then(|| pile.remove(index))
        }
    }
}

fn place(state: &mut GameState, player: PlayerId, to: Zone, card: Card) {
    let side = state.player_mut(player);
    match to {
        Zone::Lane(lane) => side.lanes[lane] = Some(card),
        Zone::Support(slot) => side.supports[slot] = Some(card),
        Zone::Deck => side.deck.push_front(card),
        Zone::Hand => side.hand.push_back(card),
        Zone::Discard => side.discard.push_back(card),
        Zone::Removed => side.removed.push_back(card),
        Zone::Stack => state.stack.push_back(card),
    }
}
