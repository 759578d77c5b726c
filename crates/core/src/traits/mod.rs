//! Collaborator traits consumed by the engine
//!
//! Implementations live outside the core (or in the risk/session crates
//! for the built-in ones). All are object-safe and `Send + Sync` so they
//! can be shared across turn tasks behind `Arc<dyn _>`.

mod classifier;
mod escalation;
mod extractor;
mod store;

pub use classifier::RiskClassifier;
pub use escalation::EscalationSink;
pub use extractor::ContextExtractor;
pub use store::DurableStore;
