//! Configuration for the support agent
//!
//! Settings are layered (defaults → file → `SUPPORT_AGENT_*` environment
//! overrides) and validated once at startup. A configuration error is
//! fatal during initialization and can never occur mid-turn: the engine
//! only accepts a validated `Settings`.

mod defaults;
mod error;
mod settings;

pub use defaults::{default_deny_list, default_high_phrases, default_imminent_phrases,
    default_moderate_phrases};
pub use error::ConfigError;
pub use settings::{
    ClassifierConfig, EngineConfig, PhraseLexicon, RiskConfig, SessionConfig, Settings,
    SupervisionConfig,
};
