//! Board-state predicates for `IF` branches and activation requirements.

use super::definition::{Condition, Quantity};
use crate::cards::Mode;
use crate::core::{GameState, InstanceId, PlayerId};

/// Who is asking, and about which cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionContext {
    pub owner: PlayerId,
    pub source: Option<InstanceId>,
    pub target: Option<InstanceId>,
}

impl ConditionContext {
    #[must_use]
    pub fn for_player(owner: PlayerId) -> Self {
        Self {
            owner,
            source: None,
            target: None,
        }
    }
}

/// Read a quantity off the board.
#[must_use]
pub fn measure(quantity: Quantity, state: &GameState, ctx: &ConditionContext) -> i64 {
    let own = state.player(ctx.owner);
    let opponent = state.player(ctx.owner.opponent());
    let creature_stat = |instance: Option<InstanceId>, stat: fn(&crate::cards::CreatureState) -> i32| {
        instance
            .and_then(|i| state.creature_by_instance(i))
            .and_then(|card| card.creature())
            .map_or(0, |c| i64::from(stat(c)))
    };

    match quantity {
        Quantity::OwnLife => own.life,
        Quantity::OpponentLife => opponent.life,
        Quantity::OwnCreatures => own.creature_count() as i64,
        Quantity::EnemyCreatures => opponent.creature_count() as i64,
        Quantity::EnemyAttackModeCreatures => opponent
            .creatures()
            .filter(|(_, card)| card.creature().is_some_and(|c| c.mode == Mode::Attack))
            .count() as i64,
        Quantity::OwnHandSize => own.hand.len() as i64,
        Quantity::OpponentHandSize => opponent.hand.len() as i64,
        Quantity::OwnDeckSize => own.deck.len() as i64,
        Quantity::SourceAttack => creature_stat(ctx.source, |c| c.attack),
        Quantity::TargetHp => creature_stat(ctx.target, |c| c.hp),
    }
}

/// Evaluate a condition tree.
#[must_use]
pub fn evaluate(condition: &Condition, state: &GameState, ctx: &ConditionContext) -> bool {
    match condition {
        Condition::Compare { quantity, op, value } => op.apply(measure(*quantity, state, ctx), *value),
        Condition::All { conditions } => conditions.iter().all(|c| evaluate(c, state, ctx)),
        Condition::Any { conditions } => conditions.iter().any(|c| evaluate(c, state, ctx)),
        Condition::Not { condition } => !evaluate(condition, state, ctx),
    }
}
