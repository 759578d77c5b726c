//! Core traits and types for the support agent
//!
//! This crate provides foundational types used across all other crates:
//! - Dialogue state machine states and the legal transition set
//! - Session state and the versioned persisted record
//! - Risk assessment and supervision verdict types
//! - Collaborator traits for pluggable backends (classifier, extractor,
//!   durable store, escalation sink)
//! - Error types

pub mod dialogue;
pub mod error;
pub mod intervention;
pub mod record;
pub mod risk;
pub mod session;
pub mod traits;

pub use dialogue::{DialogueState, SessionPhase};
pub use error::{CoreError, Result};
pub use intervention::{
    InterventionResult, QualityDimension, SupervisionVerdict, TurnOutcome,
};
pub use record::{PersistedSession, SCHEMA_VERSION};
pub use risk::{EmotionCategory, RiskAssessment, RiskLevel};
pub use session::{SessionState, TurnRecord};

pub use traits::{
    ContextExtractor, DurableStore, EscalationSink, RiskClassifier,
};
