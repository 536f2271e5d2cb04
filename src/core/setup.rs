//! Match setup: decks in, ready-to-play `GameState` out.

use im::Vector;

use super::config::MatchConfig;
use super::log::{EntityRef, EventKind};
use super::player::{PlayerId, PlayerPair};
use super::state::GameState;
use crate::cards::{CardId, CardRegistry};

/// Problems building a match.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("deck for {player} lists unknown card {card}")]
    UnknownCard { player: PlayerId, card: CardId },
}

/// Builds the opening `GameState`.
///
/// Each deck list is instantiated with fresh instance ids, shuffled with
/// the match RNG, and the opening hands are dealt from the top.
///
/// ```
/// use lane_duel::cards::{CardDefinition, CardId, CardRegistry};
/// use lane_duel::core::{MatchBuilder, MatchConfig, Phase, PlayerId};
///
/// let mut registry = CardRegistry::new();
/// registry
///     .register(CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40))
///     .unwrap();
///
/// let state = MatchBuilder::new(&registry, MatchConfig::default().with_starting_hand_size(2))
///     .with_deck(PlayerId(0), vec![CardId::new(1); 6])
///     .with_deck(PlayerId(1), vec![CardId::new(1); 6])
///     .build()
///     .unwrap();
///
/// assert_eq!(state.player(PlayerId(0)).hand.len(), 2);
/// assert_eq!(state.player(PlayerId(0)).deck.len(), 4);
/// assert_eq!(state.phase, Phase::Draw);
/// ```
pub struct MatchBuilder<'a> {
    registry: &'a CardRegistry,
    config: MatchConfig,
    decks: PlayerPair<Vec<CardId>>,
}

impl<'a> MatchBuilder<'a> {
    #[must_use]
    pub fn new(registry: &'a CardRegistry, config: MatchConfig) -> Self {
        Self {
            registry,
            config,
            decks: PlayerPair::new(|_| Vec::new()),
        }
    }

    #[must_use]
    pub fn with_deck(mut self, player: PlayerId, deck: Vec<CardId>) -> Self {
        self.decks[player] = deck;
        self
    }

    pub fn build(self) -> Result<GameState, SetupError> {
        let mut state = GameState::new(&self.config);

        for player in PlayerId::both() {
            let mut cards = Vec::with_capacity(self.decks[player].len());
            for &card in &self.decks[player] {
                let instance = state.alloc_instance();
                let copy = self
                    .registry
                    .instantiate(card, instance)
                    .ok_or(SetupError::UnknownCard { player, card })?;
                cards.push(copy);
            }
            state.rng.shuffle(&mut cards);

            let deal = self.config.starting_hand_size.min(cards.len());
            let deck: Vector<_> = cards.into_iter().collect();
            let (hand, deck) = deck.split_at(deal);

            let side = state.player_mut(player);
            side.hand = hand;
            side.deck = deck;

            if deal > 0 {
                state.record(
                    EventKind::Draw,
                    Some(player),
                    format!("{player} draws an opening hand of {deal}"),
                    smallvec::smallvec![EntityRef::Player { player }],
                );
            }
        }

        let first = state.first_player;
        state.record(
            EventKind::TurnBoundary,
            Some(first),
            format!("Turn 1 begins, {first} to act"),
            smallvec::smallvec![EntityRef::Player { player: first }],
        );
        Ok(state)
    }
}
