//! Intervention strategies for the support agent
//!
//! Strategies share one explicit capability contract (`applicable`,
//! `apply`, a static priority) and are selected by the orchestrator via
//! trait dispatch rather than string-keyed reflection. Selection is a pure
//! function of `(risk level, emotion, recently used strategies)` so
//! identical inputs always pick the identical strategy.

pub mod contract;
pub mod orchestrator;
pub mod registry;
pub mod strategies;

pub use contract::{Technique, TechniqueContext, TechniqueError};
pub use orchestrator::TechniqueOrchestrator;
pub use registry::{RegistryError, TechniqueRegistry};
pub use strategies::{
    default_registry, ActiveListeningTechnique, CognitiveReframingTechnique,
    GeneralSupportTechnique, GroundingTechnique, ResourceReferralTechnique,
    SafetyPlanningTechnique,
};

/// Context key under which supervision rejection reasons are injected
/// for the single revision attempt.
pub const REJECTION_REASONS_KEY: &str = "supervision.rejection_reasons";
