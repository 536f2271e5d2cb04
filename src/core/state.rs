//! Game state: the authoritative match snapshot.
//!
//! ## PlayerState
//!
//! One side of the table:
//! - Life points
//! - Three creature lanes and three support slots
//! - Hand, deck (front is the top), discard pile, removed-from-game pile
//!
//! ## GameState
//!
//! Both players plus match progression:
//! - Turn, active player, phase, has-drawn flag
//! - Winner (set once, never overwritten)
//! - Active persistent effects
//! - The shared stack zone
//! - Event log and RNG
//!
//! Uses `im` persistent vectors so snapshots clone cheaply.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::config::{MatchConfig, LANE_COUNT, SUPPORT_SLOT_COUNT};
use super::entity::InstanceId;
use super::log::{EntityRef, EventKind, EventLog};
use super::player::{PlayerId, PlayerPair};
use super::rng::GameRng;
use crate::cards::Card;
use crate::effects::ActiveEffect;

/// Turn phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Draw,
    Main,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Draw => write!(f, "DRAW"),
            Phase::Main => write!(f, "MAIN"),
        }
    }
}

/// One player's side of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    /// May go negative; use [`display_life`](Self::display_life) for display.
    pub life: i64,
    pub lanes: [Option<Card>; LANE_COUNT],
    pub supports: [Option<Card>; SUPPORT_SLOT_COUNT],
    pub hand: Vector<Card>,
    /// Front is the top of the deck.
    pub deck: Vector<Card>,
    pub discard: Vector<Card>,
    /// Destroyed MAX cards. Nothing leaves this pile.
    pub removed: Vector<Card>,
}

impl PlayerState {
    #[must_use]
    pub fn new(id: PlayerId, life: i64) -> Self {
        Self {
            id,
            life,
            lanes: Default::default(),
            supports: Default::default(),
            hand: Vector::new(),
            deck: Vector::new(),
            discard: Vector::new(),
            removed: Vector::new(),
        }
    }

    /// Life clamped at 0.
    #[must_use]
    pub fn display_life(&self) -> i64 {
        self.life.max(0)
    }

    #[must_use]
    pub fn creature(&self, lane: usize) -> Option<&Card> {
        self.lanes.get(lane)?.as_ref()
    }

    pub fn creature_mut(&mut self, lane: usize) -> Option<&mut Card> {
        self.lanes.get_mut(lane)?.as_mut()
    }

    #[must_use]
    pub fn support(&self, slot: usize) -> Option<&Card> {
        self.supports.get(slot)?.as_ref()
    }

    pub fn support_mut(&mut self, slot: usize) -> Option<&mut Card> {
        self.supports.get_mut(slot)?.as_mut()
    }

    /// Occupied lanes with their creatures.
    pub fn creatures(&self) -> impl Iterator<Item = (usize, &Card)> {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(lane, slot)| slot.as_ref().map(|card| (lane, card)))
    }

    /// Occupied support slots with their cards.
    pub fn support_cards(&self) -> impl Iterator<Item = (usize, &Card)> {
        self.supports
            .iter()
            .enumerate()
            .filter_map(|(slot, card)| card.as_ref().map(|card| (slot, card)))
    }

    #[must_use]
    pub fn creature_count(&self) -> usize {
        self.lanes.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn has_creatures(&self) -> bool {
        self.lanes.iter().any(Option::is_some)
    }

    pub fn empty_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..LANE_COUNT).filter(|&lane| self.lanes[lane].is_none())
    }

    pub fn empty_support_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SUPPORT_SLOT_COUNT).filter(|&slot| self.supports[slot].is_none())
    }

    #[must_use]
    pub fn find_creature_lane(&self, instance: InstanceId) -> Option<usize> {
        self.creatures()
            .find(|(_, card)| card.instance == instance)
            .map(|(lane, _)| lane)
    }

    #[must_use]
    pub fn find_support_slot(&self, instance: InstanceId) -> Option<usize> {
        self.support_cards()
            .find(|(_, card)| card.instance == instance)
            .map(|(slot, _)| slot)
    }
}

/// Complete match state.
#[derive(Clone, Debug)]
pub struct GameState {
    pub players: PlayerPair<PlayerState>,
    /// Starts at 1.
    pub turn: u32,
    pub active_player: PlayerId,
    /// The player who moved first. Cannot attack on turn 1.
    pub first_player: PlayerId,
    pub phase: Phase,
    pub has_drawn: bool,
    /// Set once by [`declare_winner`](Self::declare_winner).
    pub winner: Option<PlayerId>,
    pub active_effects: Vec<ActiveEffect>,
    /// Shared zone, append-only.
    pub stack: Vector<Card>,
    pub log: EventLog,
    pub rng: GameRng,
    next_instance: InstanceId,
}

impl GameState {
    /// Empty boards and decks, turn 1, `DRAW` phase.
    #[must_use]
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            players: PlayerPair::new(|id| PlayerState::new(id, config.starting_life)),
            turn: 1,
            active_player: config.first_player,
            first_player: config.first_player,
            phase: Phase::Draw,
            has_drawn: false,
            winner: None,
            active_effects: Vec::new(),
            stack: Vector::new(),
            log: EventLog::new(),
            rng: GameRng::new(config.seed),
            next_instance: InstanceId::new(1),
        }
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    /// Hand out a fresh instance id.
    pub fn alloc_instance(&mut self) -> InstanceId {
        let id = self.next_instance;
        self.next_instance = id.next();
        id
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Record a winner. Only the first call has any effect.
    ///
    /// Returns true if this call set the winner.
    pub fn declare_winner(&mut self, player: PlayerId) -> bool {
        if self.winner.is_some() {
            return false;
        }
        self.winner = Some(player);
        self.record(
            EventKind::Win,
            Some(player),
            format!("{player} wins on turn {}", self.turn),
            smallvec::smallvec![EntityRef::Player { player }],
        );
        true
    }

    /// Change a player's life total and check for a winner.
    ///
    /// Life at or below 0 hands the win to the opponent.
    pub fn change_life(&mut self, player: PlayerId, delta: i64) {
        let life = {
            let state = self.player_mut(player);
            state.life += delta;
            state.life
        };
        if life <= 0 {
            self.declare_winner(player.opponent());
        }
    }

    /// Append a game event stamped with the current turn and phase.
    pub fn record(
        &mut self,
        kind: EventKind,
        actor: Option<PlayerId>,
        message: impl Into<String>,
        refs: SmallVec<[EntityRef; 3]>,
    ) -> u64 {
        let message = message.into();
        tracing::debug!(turn = self.turn, ?kind, "{message}");
        self.log.push(kind, message, self.turn, self.phase, actor, refs)
    }

    /// Find a creature on either board.
    #[must_use]
    pub fn locate_creature(&self, instance: InstanceId) -> Option<(PlayerId, usize)> {
        PlayerId::both().into_iter().find_map(|player| {
            self.player(player)
                .find_creature_lane(instance)
                .map(|lane| (player, lane))
        })
    }

    /// Find a support-zone card on either board.
    #[must_use]
    pub fn locate_support(&self, instance: InstanceId) -> Option<(PlayerId, usize)> {
        PlayerId::both().into_iter().find_map(|player| {
            self.player(player)
                .find_support_slot(instance)
                .map(|slot| (player, slot))
        })
    }

    #[must_use]
    pub fn creature_by_instance(&self, instance: InstanceId) -> Option<&Card> {
        let (player, lane) = self.locate_creature(instance)?;
        self.player(player).creature(lane)
    }

    pub fn creature_by_instance_mut(&mut self, instance: InstanceId) -> Option<&mut Card> {
        let (player, lane) = self.locate_creature(instance)?;
        self.player_mut(player).creature_mut(lane)
    }
}
