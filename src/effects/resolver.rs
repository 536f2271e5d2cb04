//! Effect resolution - running triggered effects against game state.
//!
//! The engine calls [`EffectResolver::resolve`] at every event point with
//! whatever effect id the card carries. Trigger matching happens here,
//! not at the call sites.
//!
//! ## Failure model
//!
//! Nothing in here fails the calling action:
//! - Unknown effect id or missing handler: warning, no mutation
//! - Trigger mismatch: skipped silently
//! - Handler error: warning with the effect id, changes made so far stay
//!
//! Creatures destroyed during resolution fire their `ON_DESTROY` effects
//! afterwards, up to [`MAX_RESOLUTION_DEPTH`] levels deep.

use std::sync::Arc;

use smallvec::smallvec;

use super::definition::{EffectId, Trigger};
use super::handlers::{EffectError, HandlerTable};
use super::registry::EffectRegistry;
use super::utils::{EffectUtils, EventData, SourceRef};
use crate::core::{EntityRef, EventKind, GameState, PlayerId};
use crate::zones::Destroyed;

/// How deep `ON_DESTROY` chains may go.
pub const MAX_RESOLUTION_DEPTH: usize = 8;

/// One resolver invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveRequest {
    pub effect_id: Option<EffectId>,
    pub trigger: Trigger,
    pub owner: PlayerId,
    pub source: SourceRef,
    pub event: EventData,
}

/// What happened to a resolve request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The handler ran to completion.
    Resolved,
    /// No effect id, or the definition's trigger did not match.
    Skipped,
    /// The id has no definition or no handler.
    Missing,
    /// The handler returned an error. Changes made before the error stay.
    Failed(EffectError),
    /// The `ON_DESTROY` chain went too deep.
    TooDeep,
}

impl Resolution {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved)
    }
}

/// Sent to the observer whenever an effect visibly resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectNotice {
    pub effect_id: EffectId,
    pub name: String,
    pub trigger: Trigger,
    pub owner: PlayerId,
    pub source: SourceRef,
}

pub type EffectObserver = Arc<dyn Fn(&EffectNotice) + Send + Sync>;

/// Looks up definitions and handlers and runs them.
#[derive(Clone)]
pub struct EffectResolver {
    registry: Arc<EffectRegistry>,
    handlers: HandlerTable,
    observer: Option<EffectObserver>,
}

impl EffectResolver {
    /// A resolver with an interpreter handler for every registered effect.
    #[must_use]
    pub fn new(registry: Arc<EffectRegistry>) -> Self {
        let handlers = HandlerTable::for_registry(&registry);
        Self {
            registry,
            handlers,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&EffectNotice) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    #[must_use]
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    #[must_use]
    pub fn shared_registry(&self) -> Arc<EffectRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerTable {
        &mut self.handlers
    }

    /// Resolve one triggered effect.
    pub fn resolve(&self, state: &mut GameState, request: &ResolveRequest) -> Resolution {
        self.resolve_at_depth(state, request, 0)
    }

    /// Fire `ON_DESTROY` for creatures destroyed outside effect resolution,
    /// such as in combat.
    pub fn resolve_destroyed(&self, state: &mut GameState, destroyed: Vec<Destroyed>) {
        self.cascade(state, destroyed, 0);
    }

    fn resolve_at_depth(&self, state: &mut GameState, request: &ResolveRequest, depth: usize) -> Resolution {
        let Some(effect_id) = &request.effect_id else {
            return Resolution::Skipped;
        };

        if depth >= MAX_RESOLUTION_DEPTH {
            tracing::warn!(effect = %effect_id, depth, "effect chain too deep, stopping");
            warn_event(state, request.owner, effect_id, format!("Effect chain too deep at {effect_id}"));
            return Resolution::TooDeep;
        }

        let Some(definition) = self.registry.get(effect_id) else {
            tracing::warn!(effect = %effect_id, "missing effect definition");
            warn_event(state, request.owner, effect_id, format!("Missing effect {effect_id}"));
            return Resolution::Missing;
        };

        if !definition.trigger.matches(request.trigger) {
            return Resolution::Skipped;
        }

        let Some(handler) = self.handlers.get(effect_id) else {
            tracing::warn!(effect = %effect_id, "no handler for effect");
            warn_event(state, request.owner, effect_id, format!("No handler for effect {effect_id}"));
            return Resolution::Missing;
        };

        let mut utils = EffectUtils::new(state, definition, request.owner, request.source, request.event);
        let outcome = handler.handle(definition, &mut utils);
        let destroyed = utils.into_destroyed();

        let resolution = match outcome {
            Ok(()) => {
                state.record(
                    EventKind::Effect,
                    Some(request.owner),
                    format!("{} resolves", definition.name),
                    smallvec![
                        EntityRef::Effect {
                            effect: effect_id.clone()
                        },
                        EntityRef::Card {
                            card: request.source.card,
                            instance: request.source.instance
                        },
                    ],
                );
                if let Some(observer) = &self.observer {
                    observer(&EffectNotice {
                        effect_id: effect_id.clone(),
                        name: definition.name.clone(),
                        trigger: request.trigger,
                        owner: request.owner,
                        source: request.source,
                    });
                }
                Resolution::Resolved
            }
            Err(err) => {
                tracing::warn!(effect = %effect_id, error = %err, "effect handler failed");
                warn_event(state, request.owner, effect_id, format!("{} failed: {err}", definition.name));
                Resolution::Failed(err)
            }
        };

        self.cascade(state, destroyed, depth + 1);
        resolution
    }

    fn cascade(&self, state: &mut GameState, destroyed: Vec<Destroyed>, depth: usize) {
        for gone in destroyed {
            let request = ResolveRequest {
                effect_id: gone.effect_id.clone(),
                trigger: Trigger::OnDestroy,
                owner: gone.owner,
                source: SourceRef {
                    card: gone.card,
                    instance: gone.instance,
                },
                event: EventData::lane(gone.owner, gone.lane),
            };
            self.resolve_at_depth(state, &request, depth);
        }
    }
}

impl std::fmt::Debug for EffectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectResolver")
            .field("effects", &self.registry.len())
            .field("handlers", &self.handlers)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

fn warn_event(state: &mut GameState, owner: PlayerId, effect: &EffectId, message: String) {
    state.record(
        EventKind::Warning,
        Some(owner),
        message,
        smallvec![EntityRef::Effect {
            effect: effect.clone()
        }],
    );
}
