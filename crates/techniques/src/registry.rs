//! Strategy registry
//!
//! Insertion-ordered named registration. Duplicate names are rejected at
//! registration time, so a wiring mistake is a startup configuration error,
//! never a mid-turn one.

use std::sync::Arc;
use thiserror::Error;

use crate::contract::Technique;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("strategy '{0}' is already registered")]
    Duplicate(String),
}

pub struct TechniqueRegistry {
    techniques: Vec<Arc<dyn Technique>>,
}

impl TechniqueRegistry {
    pub fn new() -> Self {
        Self {
            techniques: Vec::new(),
        }
    }

    /// Register a strategy
    pub fn register<T: Technique + 'static>(&mut self, technique: T) -> Result<(), RegistryError> {
        self.register_boxed(Arc::new(technique))
    }

    /// Register a shared strategy
    pub fn register_boxed(&mut self, technique: Arc<dyn Technique>) -> Result<(), RegistryError> {
        if self.has(technique.name()) {
            return Err(RegistryError::Duplicate(technique.name().to_string()));
        }
        self.techniques.push(technique);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.techniques.iter().any(|t| t.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Technique>> {
        self.techniques.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.techniques.iter().map(|t| t.name().to_string()).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn Technique>> {
        self.techniques.iter()
    }
}

impl Default for TechniqueRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::{GeneralSupportTechnique, GroundingTechnique};

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TechniqueRegistry::new();
        assert!(registry.is_empty());

        registry.register(GeneralSupportTechnique::new()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.has("general_support"));
        assert!(registry.get("general_support").is_some());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = TechniqueRegistry::new();
        registry.register(GroundingTechnique::new()).unwrap();
        let err = registry.register(GroundingTechnique::new()).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "grounding"));
    }
}
