//! Effect registry: definitions keyed by effect id.

use rustc_hash::FxHashMap;

use super::definition::{EffectDefinition, EffectId};

/// Problems with effect data.
#[derive(Debug, thiserror::Error)]
pub enum EffectDataError {
    #[error("effect {0} is defined twice")]
    Duplicate(EffectId),

    #[error("malformed effect data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Static mapping from effect id to definition.
#[derive(Clone, Debug, Default)]
pub struct EffectRegistry {
    effects: FxHashMap<EffectId, EffectDefinition>,
}

impl EffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, EffectDataError> {
        let definitions: Vec<EffectDefinition> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for def in definitions {
            registry.register(def)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, effect: EffectDefinition) -> Result<(), EffectDataError> {
        if self.effects.contains_key(&effect.id) {
            return Err(EffectDataError::Duplicate(effect.id));
        }
        self.effects.insert(effect.id.clone(), effect);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.effects.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EffectId) -> bool {
        self.effects.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EffectId> {
        self.effects.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }
}
