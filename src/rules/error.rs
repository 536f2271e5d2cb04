//! Illegal-action errors.
//!
//! Every engine action validates fully before it mutates anything, so an
//! `Err` always means the state is untouched.

use crate::cards::{CardId, CardType};
use crate::core::{Phase, PlayerId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("the game is over")]
    GameOver,

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("action needs the {expected} phase, current phase is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("lane {0} does not exist")]
    InvalidLane(usize),

    #[error("support slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("lane {0} is occupied")]
    LaneOccupied(usize),

    #[error("support slot {0} is occupied")]
    SlotOccupied(usize),

    #[error("lane {0} is empty")]
    EmptyLane(usize),

    #[error("support slot {0} is empty")]
    EmptySlot(usize),

    #[error("{0} is not in hand")]
    CardNotInHand(CardId),

    #[error("{found:?} card cannot be used here")]
    WrongCardType { found: CardType },

    #[error("card has no effect")]
    NoEffect,

    #[error("effect already used")]
    EffectSpent,

    #[error("creature already attacked this turn")]
    AlreadyAttacked,

    #[error("creature already changed mode this turn")]
    AlreadyChangedMode,

    #[error("the first player cannot attack on turn 1")]
    FirstTurnAttack,

    #[error("creature must be in attack mode")]
    NotAttackMode,

    #[error("card is face-down")]
    FaceDown,

    #[error("card is not face-down")]
    NotFaceDown,

    #[error("card is already active")]
    AlreadyActive,

    #[error("card is not a trap with an ON_DEFEND effect")]
    NotATrap,

    #[error("activation denied: {reason}")]
    ActivationDenied { reason: String },
}
