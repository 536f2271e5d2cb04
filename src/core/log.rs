//! Structured game event log.
//!
//! Every mutating engine action appends a `GameEvent`. Presentation and
//! replay layers read the log; the engine writes it whether or not anyone
//! is listening.
//!
//! Events carry:
//! - a sequence number (strictly increasing within a match)
//! - a wall-clock timestamp in milliseconds
//! - an `EventKind` tag and a human-readable message
//! - the turn, phase and acting player at the time of the event
//! - a few `EntityRef`s pointing at the cards, lanes, slots or effects involved

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::entity::InstanceId;
use super::player::PlayerId;
use super::state::Phase;
use crate::cards::CardId;
use crate::effects::EffectId;

/// What kind of thing happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Draw,
    Play,
    Activate,
    Attack,
    Damage,
    Destroy,
    Discard,
    Effect,
    ModeChange,
    Flip,
    TurnBoundary,
    Win,
    Warning,
}

/// Reference to an entity involved in an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityRef {
    Card { card: CardId, instance: InstanceId },
    Lane { player: PlayerId, lane: usize },
    Slot { player: PlayerId, slot: usize },
    Effect { effect: EffectId },
    Player { player: PlayerId },
}

/// A single logged event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub kind: EventKind,
    pub message: String,
    pub turn: u32,
    pub phase: Phase,
    pub actor: Option<PlayerId>,
    pub refs: SmallVec<[EntityRef; 3]>,
}

impl GameEvent {
    /// Does this event reference the given card instance?
    #[must_use]
    pub fn mentions_instance(&self, instance: InstanceId) -> bool {
        self.refs
            .iter()
            .any(|r| matches!(r, EntityRef::Card { instance: i, .. } if *i == instance))
    }
}

/// Append-only event log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vector<GameEvent>,
    next_sequence: u64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamping it with the next sequence number.
    ///
    /// Returns the assigned sequence number.
    pub fn push(
        &mut self,
        kind: EventKind,
        message: String,
        turn: u32,
        phase: Phase,
        actor: Option<PlayerId>,
        refs: SmallVec<[EntityRef; 3]>,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push_back(GameEvent {
            sequence,
            timestamp_ms: now_ms(),
            kind,
            message,
            turn,
            phase,
            actor,
            refs,
        });
        sequence
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Events of one kind, oldest first.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Events with a sequence number at or after `sequence`.
    pub fn since(&self, sequence: u64) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.sequence >= sequence)
    }

    /// Sequence number the next event will get.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
