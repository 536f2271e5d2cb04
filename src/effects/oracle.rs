//! Activation checks and target options.
//!
//! The engine consults an `ActivationOracle` before every manual
//! activation and asks a `TargetProvider` for the legal choices of a
//! targeted effect. Both are traits so callers can plug in their own
//! rules; the defaults read each definition's declared `requirements`
//! and `target`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::{evaluate, ConditionContext};
use super::definition::{EffectId, TargetRequirement, TargetSide};
use super::registry::EffectRegistry;
use crate::core::{GameState, InstanceId, PlayerId};

/// Verdict of an activation check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationCheck {
    Allowed,
    Denied { reason: String },
}

impl ActivationCheck {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, ActivationCheck::Allowed)
    }
}

/// Decides whether an effect may be activated right now.
pub trait ActivationOracle {
    fn check(&self, effect: &EffectId, state: &GameState, player: PlayerId) -> ActivationCheck;
}

/// A legal choice for a targeted effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOption {
    pub player: PlayerId,
    pub lane: usize,
    pub instance: InstanceId,
    pub label: String,
}

/// Lists legal targets for a targeting requirement.
pub trait TargetProvider {
    fn options(&self, requirement: &TargetRequirement, state: &GameState, player: PlayerId) -> Vec<TargetOption>;
}

/// Targets are face-up or face-down creatures on the requested side(s)
/// that pass the requirement's filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoardTargetProvider;

impl TargetProvider for BoardTargetProvider {
    fn options(&self, requirement: &TargetRequirement, state: &GameState, player: PlayerId) -> Vec<TargetOption> {
        let sides = match requirement.side {
            TargetSide::Own => vec![player],
            TargetSide::Enemy => vec![player.opponent()],
            TargetSide::Any => vec![player, player.opponent()],
        };

        sides
            .iter()
            .flat_map(|&side| {
                state.player(side).creatures().filter_map(move |(lane, card)| {
                    let creature = card.creature()?;
                    requirement.filter.matches(creature).then(|| TargetOption {
                        player: side,
                        lane,
                        instance: card.instance,
                        label: format!("{} ({side}, lane {})", card.name, lane + 1),
                    })
                })
            })
            .collect()
    }
}

/// Checks a definition's declared requirements and that a targeted
/// effect has at least one target.
///
/// Unknown effect ids are allowed; the resolver reports them.
#[derive(Clone, Debug)]
pub struct RequirementOracle<T = BoardTargetProvider> {
    registry: Arc<EffectRegistry>,
    targets: T,
}

impl RequirementOracle {
    #[must_use]
    pub fn new(registry: Arc<EffectRegistry>) -> Self {
        Self {
            registry,
            targets: BoardTargetProvider,
        }
    }
}

impl<T: TargetProvider> RequirementOracle<T> {
    #[must_use]
    pub fn with_target_provider<U: TargetProvider>(self, targets: U) -> RequirementOracle<U> {
        RequirementOracle {
            registry: self.registry,
            targets,
        }
    }
}

impl<T: TargetProvider> ActivationOracle for RequirementOracle<T> {
    fn check(&self, effect: &EffectId, state: &GameState, player: PlayerId) -> ActivationCheck {
        let Some(definition) = self.registry.get(effect) else {
            return ActivationCheck::Allowed;
        };

        let ctx = ConditionContext::for_player(player);
        for requirement in &definition.requirements {
            if !evaluate(&requirement.condition, state, &ctx) {
                let reason = requirement
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("{} cannot be activated now", definition.name));
                return ActivationCheck::Denied { reason };
            }
        }

        if let Some(target) = &definition.target {
            if self.targets.options(target, state, player).is_empty() {
                return ActivationCheck::Denied {
                    reason: format!("{} has no valid target", definition.name),
                };
            }
        }

        ActivationCheck::Allowed
    }
}

impl<F> ActivationOracle for F
where
    F: Fn(&EffectId, &GameState, PlayerId) -> ActivationCheck,
{
    fn check(&self, effect: &EffectId, state: &GameState, player: PlayerId) -> ActivationCheck {
        self(effect, state, player)
    }
}
