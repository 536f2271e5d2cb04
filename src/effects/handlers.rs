//! Effect handlers and the declarative action interpreter.
//!
//! Every registered effect id maps to an `EffectHandler`. By default that
//! is the `Interpreter`, which walks the definition's action tree. Callers
//! can swap in their own handler for any id; plain closures work too.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::active::{ActiveScope, StatModifier};
use super::condition::evaluate;
use super::definition::{Duration, EffectAction, EffectDefinition, EffectId, Selector};
use super::registry::EffectRegistry;
use super::utils::EffectUtils;
use crate::cards::Keyword;
use crate::core::InstanceId;

/// A fault inside an effect handler.
///
/// Caught at the resolver boundary; never propagated to the engine action
/// that triggered the effect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect needs a target but none is on the field")]
    MissingTarget,

    #[error("creature {0} is no longer on the field")]
    CreatureGone(InstanceId),

    #[error("{0}")]
    Failed(String),
}

/// Concrete logic for one effect.
pub trait EffectHandler {
    fn handle(&self, effect: &EffectDefinition, utils: &mut EffectUtils<'_>) -> Result<(), EffectError>;
}

impl<F> EffectHandler for F
where
    F: Fn(&EffectDefinition, &mut EffectUtils<'_>) -> Result<(), EffectError>,
{
    fn handle(&self, effect: &EffectDefinition, utils: &mut EffectUtils<'_>) -> Result<(), EffectError> {
        self(effect, utils)
    }
}

/// Runs a definition's declarative actions in order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Interpreter;

impl EffectHandler for Interpreter {
    fn handle(&self, effect: &EffectDefinition, utils: &mut EffectUtils<'_>) -> Result<(), EffectError> {
        run(&effect.actions, utils)
    }
}

fn run(actions: &[EffectAction], utils: &mut EffectUtils<'_>) -> Result<(), EffectError> {
    for action in actions {
        run_action(action, utils)?;
    }
    Ok(())
}

fn run_action(action: &EffectAction, utils: &mut EffectUtils<'_>) -> Result<(), EffectError> {
    match action {
        EffectAction::ModifyStats {
            selector,
            atk,
            def,
            duration,
        } => {
            let modifier = StatModifier { atk: *atk, def: *def };
            if duration.is_lingering() {
                linger(utils, selector, Some(modifier), None, *duration)?;
            } else {
                for slot in utils.select(selector)? {
                    utils.modify_stats(slot, *atk, *def)?;
                }
            }
        }
        EffectAction::Damage { selector, amount } => {
            for slot in utils.select(selector)? {
                utils.damage(slot, *amount)?;
            }
        }
        EffectAction::Heal { selector, amount } => {
            for slot in utils.select(selector)? {
                utils.heal(slot, *amount)?;
            }
        }
        EffectAction::ChangeLife { player, amount } => {
            for p in utils.players(*player) {
                utils.change_life(p, *amount);
            }
        }
        EffectAction::Draw { player, count } => {
            for p in utils.players(*player) {
                utils.draw(p, *count);
            }
        }
        EffectAction::Discard { player, count } => {
            for p in utils.players(*player) {
                utils.discard_random(p, *count);
            }
        }
        EffectAction::Destroy { selector } => {
            for slot in utils.select(selector)? {
                utils.destroy(slot)?;
            }
        }
        EffectAction::ReturnToHand { selector } => {
            for slot in utils.select(selector)? {
                utils.return_to_hand(slot)?;
            }
        }
        EffectAction::AddKeyword {
            selector,
            keyword,
            duration,
        } => {
            if duration.is_lingering() {
                linger(utils, selector, None, Some(keyword.clone()), *duration)?;
            } else {
                for slot in utils.select(selector)? {
                    utils.add_keyword(slot, keyword.clone())?;
                }
            }
        }
        EffectAction::RemoveKeyword { selector, keyword } => {
            for slot in utils.select(selector)? {
                utils.remove_keyword(slot, keyword)?;
            }
        }
        EffectAction::SetMode { selector, mode } => {
            for slot in utils.select(selector)? {
                utils.set_mode(slot, *mode)?;
            }
        }
        EffectAction::If {
            condition,
            then,
            otherwise,
        } => {
            let ctx = utils.condition_context();
            let branch = if evaluate(condition, utils.state(), &ctx) {
                then
            } else {
                otherwise
            };
            run(branch, utils)?;
        }
    }
    Ok(())
}

/// Register an active effect: board-wide for group scopes, one per
/// selected creature otherwise.
fn linger(
    utils: &mut EffectUtils<'_>,
    selector: &Selector,
    modifier: Option<StatModifier>,
    keyword: Option<Keyword>,
    duration: Duration,
) -> Result<(), EffectError> {
    if selector.scope.is_group() {
        let scope = ActiveScope::Board {
            scope: selector.scope,
            filter: selector.filter.clone(),
        };
        utils.register_active(scope, modifier, keyword, duration);
        return Ok(());
    }
    for slot in utils.select(selector)? {
        utils.register_active(ActiveScope::Instance(slot.instance), modifier, keyword.clone(), duration);
    }
    Ok(())
}

pub type SharedHandler = Arc<dyn EffectHandler + Send + Sync>;

/// Effect id to handler.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: FxHashMap<EffectId, SharedHandler>,
}

impl HandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An `Interpreter` for every effect in the registry.
    #[must_use]
    pub fn for_registry(registry: &EffectRegistry) -> Self {
        let interpreter: SharedHandler = Arc::new(Interpreter);
        let handlers = registry
            .ids()
            .map(|id| (id.clone(), Arc::clone(&interpreter)))
            .collect();
        Self { handlers }
    }

    /// Install or replace the handler for `id`.
    pub fn register(&mut self, id: impl Into<EffectId>, handler: impl EffectHandler + Send + Sync + 'static) {
        self.handlers.insert(id.into(), Arc::new(handler));
    }

    /// Install or replace a closure handler for `id`.
    pub fn register_fn<F>(&mut self, id: impl Into<EffectId>, handler: F)
    where
        F: Fn(&EffectDefinition, &mut EffectUtils<'_>) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.handlers.insert(id.into(), Arc::new(handler));
    }

    pub fn remove(&mut self, id: &EffectId) -> Option<SharedHandler> {
        self.handlers.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &EffectId) -> Option<&SharedHandler> {
        self.handlers.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EffectId) -> bool {
        self.handlers.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
