//! Built-in intervention strategies
//!
//! Template-based and deterministic: template choice is derived from the
//! turn count, never from randomness, so replays select identical text.

mod active_listening;
mod general_support;
mod grounding;
mod reframing;
mod resource_referral;
mod safety_planning;

pub use active_listening::ActiveListeningTechnique;
pub use general_support::GeneralSupportTechnique;
pub use grounding::GroundingTechnique;
pub use reframing::CognitiveReframingTechnique;
pub use resource_referral::ResourceReferralTechnique;
pub use safety_planning::SafetyPlanningTechnique;

use crate::registry::{RegistryError, TechniqueRegistry};

/// Registry with the full built-in strategy set.
///
/// `GeneralSupportTechnique` is always applicable by construction, so the
/// selection set is guaranteed non-empty.
pub fn default_registry() -> Result<TechniqueRegistry, RegistryError> {
    let mut registry = TechniqueRegistry::new();
    registry.register(SafetyPlanningTechnique::new())?;
    registry.register(GroundingTechnique::new())?;
    registry.register(CognitiveReframingTechnique::new())?;
    registry.register(ResourceReferralTechnique::new())?;
    registry.register(ActiveListeningTechnique::new())?;
    registry.register(GeneralSupportTechnique::new())?;
    Ok(registry)
}

/// Deterministic template pick: stable for a given turn count.
pub(crate) fn pick<'a>(templates: &'a [&'a str], turn_count: u64) -> &'a str {
    templates[(turn_count as usize) % templates.len()]
}
