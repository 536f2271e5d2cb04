//! Effect system: data-defined card abilities.
//!
//! - `EffectDefinition`: Declarative effect data (trigger + action tree)
//! - `EffectRegistry`: Definitions keyed by `EffectId`
//! - `HandlerTable` / `EffectHandler`: Concrete logic per effect id
//! - `EffectUtils`: The façade handlers mutate state through
//! - `EffectResolver`: Trigger matching, handler dispatch, fault containment
//! - `ActiveEffect`: Lingering modifiers and their exact reversal
//! - `ActivationOracle` / `TargetProvider`: Pre-activation checks
//!
//! ## Design Philosophy
//!
//! Effect data is untrusted; the interpreter is trusted. A missing or
//! broken effect degrades to a logged warning and never fails the engine
//! action that triggered it.

pub mod active;
pub mod condition;
pub mod definition;
pub mod handlers;
pub mod oracle;
pub mod registry;
pub mod resolver;
pub mod utils;

pub use active::{ActiveEffect, ActiveScope, Affected, StatModifier};
pub use condition::{evaluate, measure, ConditionContext};
pub use definition::{
    Comparison, Condition, CreatureFilter, Duration, EffectAction, EffectDefinition, EffectId,
    PlayerSelector, Quantity, Requirement, Scope, Selector, TargetRequirement, TargetSide, Trigger,
};
pub use handlers::{EffectError, EffectHandler, HandlerTable, Interpreter, SharedHandler};
pub use oracle::{
    ActivationCheck, ActivationOracle, BoardTargetProvider, RequirementOracle, TargetOption,
    TargetProvider,
};
pub use registry::{EffectDataError, EffectRegistry};
pub use resolver::{
    EffectNotice, EffectObserver, EffectResolver, Resolution, ResolveRequest, MAX_RESOLUTION_DEPTH,
};
pub use utils::{CreatureSlot, EffectUtils, EventData, SourceRef};
