//! Player actions as data.
//!
//! `PlayerAction` names one engine call with its arguments. The engine
//! lists the legal ones with `legal_actions` and runs any of them with
//! `apply`.

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, Mode};
use crate::effects::EventData;

/// How a creature enters its lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayOptions {
    pub face_down: bool,
    pub mode: Mode,
}

impl PlayOptions {
    #[must_use]
    pub fn face_down() -> Self {
        Self {
            face_down: true,
            mode: Mode::Attack,
        }
    }

    #[must_use]
    pub fn in_mode(mode: Mode) -> Self {
        Self { face_down: false, mode }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerAction {
    Draw,
    PlayCreature {
        lane: usize,
        card: CardId,
        #[serde(default)]
        options: PlayOptions,
    },
    PlaySupport {
        slot: usize,
        card: CardId,
    },
    ActivateSupport {
        slot: usize,
        #[serde(default)]
        event: EventData,
    },
    ActivateCreatureEffect {
        lane: usize,
        #[serde(default)]
        event: EventData,
    },
    ActivateTrap {
        slot: usize,
        #[serde(default)]
        event: EventData,
    },
    ToggleMode {
        lane: usize,
    },
    FlipFaceUp {
        lane: usize,
    },
    Attack {
        attacker: usize,
        target: usize,
    },
    EndTurn,
}

impl PlayerAction {
    /// Actions that only make sense on the acting player's own turn.
    #[must_use]
    pub fn is_turn_action(&self) -> bool {
        !matches!(self, PlayerAction::ActivateTrap { .. })
    }
}
