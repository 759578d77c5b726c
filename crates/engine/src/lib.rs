//! Dialogue orchestration engine
//!
//! `DialogueEngine` drives the per-turn protocol: risk assessment first,
//! then either the crisis path (pre-vetted response + escalation) or the
//! standard path (context enrichment, strategy selection, mandatory
//! supervision with a single revision attempt). A turn commits its
//! session mutation only when the protocol reaches `Respond`; any
//! failure before that leaves cached and persisted state untouched.

pub mod engine;
pub mod error;
pub mod sweeper;

pub use engine::{DialogueEngine, DialogueEngineBuilder};
pub use error::EngineError;
pub use sweeper::SweeperHandle;
