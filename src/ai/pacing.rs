//! Pacing hook between AI sub-actions.
//!
//! The AI turn runs synchronously. A presentation layer that wants the
//! opponent to "think" between moves implements `TurnPacer` and sleeps,
//! animates or yields there. Every step boundary falls between two
//! complete engine calls, so the game state is never seen mid-action.

use crate::rules::PlayerAction;

/// A point in the AI turn where a pause may be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiStep {
    /// Before the first action of the turn.
    TurnStart,
    /// After an action was applied.
    Acted(PlayerAction),
    /// Before ending the turn.
    TurnEnd,
}

pub trait TurnPacer {
    fn pause(&mut self, step: &AiStep);
}

/// No pauses.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPacing;

impl TurnPacer for NoPacing {
    fn pause(&mut self, _step: &AiStep) {}
}

impl<F> TurnPacer for F
where
    F: FnMut(&AiStep),
{
    fn pause(&mut self, step: &AiStep) {
        self(step);
    }
}
