//! Response supervision gate
//!
//! Every candidate response passes through `ResponseSupervisor` before
//! delivery. The gate is stateless per call and fully deterministic:
//! a deny-list screen first (any match is a critical issue and rejects
//! outright, never averaged away by good scores), then lexical scoring
//! of four quality dimensions against configured minimums.

pub mod deny;
pub mod scoring;
pub mod supervisor;

pub use deny::DenyListScreen;
pub use supervisor::{ResponseSupervisor, SupervisionContext};
