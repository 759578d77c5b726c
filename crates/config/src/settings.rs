//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use support_agent_core::QualityDimension;

use crate::defaults;
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Turn protocol configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Risk assessment configuration
    #[serde(default)]
    pub risk: RiskConfig,

    /// Response supervision configuration
    #[serde(default)]
    pub supervision: SupervisionConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// External classifier provider configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Turn protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worst-case envelope for one turn's external calls. `validate`
    /// rejects per-call budgets that cannot fit inside it.
    #[serde(default = "default_turn_timeout_ms")]
    pub turn_timeout_ms: u64,

    /// Budget for one strategy `apply` call
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Budget for intent/context enrichment
    #[serde(default = "default_extractor_timeout_ms")]
    pub extractor_timeout_ms: u64,

    /// Budget for one escalation sink notification. Notifications run on
    /// a detached task, so this bounds the task, not the turn.
    #[serde(default = "default_escalation_timeout_ms")]
    pub escalation_timeout_ms: u64,

    /// Idle time after which a session is ended by the sweeper
    #[serde(default = "default_inactivity_timeout_secs")]
    pub session_inactivity_timeout_secs: u64,

    /// How often the inactivity sweeper runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Revision attempts after a supervision rejection (at most 1)
    #[serde(default = "default_max_revision_attempts")]
    pub max_revision_attempts: u32,

    /// Canonical pre-vetted fallback, delivered when supervision rejects
    /// the revised candidate as well
    #[serde(default = "default_fallback_response")]
    pub fallback_response: String,

    /// Pre-vetted crisis response for the HIGH/IMMINENT branch
    #[serde(default = "default_crisis_response")]
    pub crisis_response: String,

    /// Crisis resource lines appended to every IMMINENT response
    #[serde(default = "default_crisis_resources")]
    pub crisis_resources: Vec<String>,
}

fn default_turn_timeout_ms() -> u64 {
    10_000
}

fn default_strategy_timeout_ms() -> u64 {
    2_000
}

fn default_extractor_timeout_ms() -> u64 {
    500
}

fn default_escalation_timeout_ms() -> u64 {
    5_000
}

fn default_inactivity_timeout_secs() -> u64 {
    1_800
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_revision_attempts() -> u32 {
    1
}

fn default_fallback_response() -> String {
    "Thank you for sharing that with me. I want to make sure I respond \
     thoughtfully — could you tell me a little more about how you're \
     feeling right now?"
        .to_string()
}

fn default_crisis_response() -> String {
    "I'm really concerned about what you're going through right now, and \
     I want you to know you don't have to face this alone. Your safety \
     matters. Please reach out to one of the crisis resources below — \
     they are available right now and want to help."
        .to_string()
}

fn default_crisis_resources() -> Vec<String> {
    vec![
        "Call or text 988 (Suicide & Crisis Lifeline, 24/7)".to_string(),
        "Text HOME to 741741 (Crisis Text Line)".to_string(),
        "If you are in immediate danger, call 911 or your local emergency number".to_string(),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: default_turn_timeout_ms(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
            extractor_timeout_ms: default_extractor_timeout_ms(),
            escalation_timeout_ms: default_escalation_timeout_ms(),
            session_inactivity_timeout_secs: default_inactivity_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_revision_attempts: default_max_revision_attempts(),
            fallback_response: default_fallback_response(),
            crisis_response: default_crisis_response(),
            crisis_resources: default_crisis_resources(),
        }
    }
}

/// Risk assessment configuration
///
/// Threshold mapping from blended score to level must be monotonic; the
/// validator enforces it so a level can never flap downward within one
/// turn's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,

    #[serde(default = "default_moderate_threshold")]
    pub moderate_threshold: f32,

    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,

    #[serde(default = "default_imminent_threshold")]
    pub imminent_threshold: f32,

    /// Budget for the external classifier call
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Highest-severity phrases; a match forces IMMINENT unconditionally
    #[serde(default = "defaults::default_imminent_phrases")]
    pub imminent_phrases: Vec<String>,

    #[serde(default = "defaults::default_high_phrases")]
    pub high_phrases: Vec<String>,

    #[serde(default = "defaults::default_moderate_phrases")]
    pub moderate_phrases: Vec<String>,
}

fn default_low_threshold() -> f32 {
    0.25
}

fn default_moderate_threshold() -> f32 {
    0.5
}

fn default_high_threshold() -> f32 {
    0.7
}

fn default_imminent_threshold() -> f32 {
    0.9
}

fn default_classifier_timeout_ms() -> u64 {
    800
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            moderate_threshold: default_moderate_threshold(),
            high_threshold: default_high_threshold(),
            imminent_threshold: default_imminent_threshold(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            imminent_phrases: defaults::default_imminent_phrases(),
            high_phrases: defaults::default_high_phrases(),
            moderate_phrases: defaults::default_moderate_phrases(),
        }
    }
}

/// Response supervision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionConfig {
    /// Hard floor for the safety dimension; below it a rejection is
    /// always critical
    #[serde(default = "default_safety_minimum")]
    pub safety_minimum: f32,

    /// Floor for the weighted overall score
    #[serde(default = "default_overall_minimum")]
    pub overall_minimum: f32,

    /// Per-dimension weights; normalized at validation
    #[serde(default = "default_dimension_weights")]
    pub dimension_weights: HashMap<QualityDimension, f32>,

    /// Harmful-content deny list; any match is a critical issue
    #[serde(default = "defaults::default_deny_list")]
    pub deny_list: Vec<String>,
}

fn default_safety_minimum() -> f32 {
    0.7
}

fn default_overall_minimum() -> f32 {
    0.6
}

fn default_dimension_weights() -> HashMap<QualityDimension, f32> {
    HashMap::from([
        (QualityDimension::Safety, 0.4),
        (QualityDimension::Empathy, 0.25),
        (QualityDimension::BoundaryRespect, 0.2),
        (QualityDimension::Relevance, 0.15),
    ])
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            safety_minimum: default_safety_minimum(),
            overall_minimum: default_overall_minimum(),
            dimension_weights: default_dimension_weights(),
            deny_list: defaults::default_deny_list(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// In-memory recent-history window per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// External classifier provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// When false the assessor runs keyword-only from the start
    #[serde(default)]
    pub enabled: bool,

    /// Score endpoint URL
    #[serde(default)]
    pub endpoint: String,

    /// Environment variable holding the provider API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "CLASSIFIER_API_KEY".to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Phrase lexicon override file (YAML)
///
/// Lets deployments replace the built-in curated lists without a rebuild.
/// Missing sections keep their current values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhraseLexicon {
    #[serde(default)]
    pub imminent: Option<Vec<String>>,
    #[serde(default)]
    pub high: Option<Vec<String>>,
    #[serde(default)]
    pub moderate: Option<Vec<String>>,
    #[serde(default)]
    pub deny_list: Option<Vec<String>>,
}

impl PhraseLexicon {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    pub fn apply(self, settings: &mut Settings) {
        if let Some(imminent) = self.imminent {
            settings.risk.imminent_phrases = imminent;
        }
        if let Some(high) = self.high {
            settings.risk.high_phrases = high;
        }
        if let Some(moderate) = self.moderate {
            settings.risk.moderate_phrases = moderate;
        }
        if let Some(deny) = self.deny_list {
            settings.supervision.deny_list = deny;
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a config file (TOML/YAML/JSON) with `SUPPORT_AGENT_*`
    /// environment overrides layered on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SUPPORT_AGENT").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings. The single fail-fast gate: the engine only
    /// accepts a validated `Settings`, so configuration errors can never
    /// surface mid-turn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_engine()?;
        self.validate_risk()?;
        self.validate_supervision()?;

        // Worst case for one turn: classifier, extraction, then up to
        // two supervised strategy invocations.
        let worst_case = self.risk.classifier_timeout_ms
            + self.engine.extractor_timeout_ms
            + self.engine.strategy_timeout_ms
                * (1 + u64::from(self.engine.max_revision_attempts));
        if worst_case > self.engine.turn_timeout_ms {
            return Err(ConfigError::invalid(format!(
                "per-call budgets ({worst_case}ms worst case) exceed turn_timeout_ms \
                 ({}ms)",
                self.engine.turn_timeout_ms
            )));
        }
        Ok(())
    }

    fn validate_engine(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.turn_timeout_ms == 0
            || engine.strategy_timeout_ms == 0
            || engine.escalation_timeout_ms == 0
        {
            return Err(ConfigError::invalid("timeouts must be non-zero"));
        }
        if engine.strategy_timeout_ms >= engine.turn_timeout_ms {
            return Err(ConfigError::invalid(
                "strategy_timeout_ms must be smaller than turn_timeout_ms",
            ));
        }
        if engine.max_revision_attempts > 1 {
            return Err(ConfigError::invalid(
                "max_revision_attempts is capped at exactly one retry",
            ));
        }
        if engine.fallback_response.trim().is_empty() {
            return Err(ConfigError::invalid("fallback_response must be non-empty"));
        }
        if engine.crisis_response.trim().is_empty() {
            return Err(ConfigError::invalid("crisis_response must be non-empty"));
        }
        if engine.crisis_resources.is_empty() {
            return Err(ConfigError::invalid(
                "crisis_resources must list at least one resource",
            ));
        }
        Ok(())
    }

    fn validate_risk(&self) -> Result<(), ConfigError> {
        let risk = &self.risk;
        let thresholds = [
            risk.low_threshold,
            risk.moderate_threshold,
            risk.high_threshold,
            risk.imminent_threshold,
        ];
        if thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(ConfigError::invalid("risk thresholds must lie in [0, 1]"));
        }
        if !thresholds.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::invalid(
                "risk thresholds must be strictly monotonic (low < moderate < high < imminent)",
            ));
        }
        if risk.imminent_phrases.is_empty() {
            return Err(ConfigError::invalid(
                "imminent_phrases must not be empty: the keyword guard is the fail-safe path",
            ));
        }
        if risk.classifier_timeout_ms == 0 {
            return Err(ConfigError::invalid("classifier_timeout_ms must be non-zero"));
        }
        Ok(())
    }

    fn validate_supervision(&self) -> Result<(), ConfigError> {
        let sup = &self.supervision;
        if !(0.0..=1.0).contains(&sup.safety_minimum)
            || !(0.0..=1.0).contains(&sup.overall_minimum)
        {
            return Err(ConfigError::invalid(
                "supervision minimums must lie in [0, 1]",
            ));
        }
        if sup.deny_list.is_empty() {
            return Err(ConfigError::invalid("deny_list must not be empty"));
        }
        for dimension in QualityDimension::ALL {
            match sup.dimension_weights.get(&dimension) {
                Some(w) if *w > 0.0 => {},
                Some(_) => {
                    return Err(ConfigError::invalid(format!(
                        "weight for {} must be positive",
                        dimension.display_name()
                    )))
                },
                None => {
                    return Err(ConfigError::invalid(format!(
                        "missing weight for dimension {}",
                        dimension.display_name()
                    )))
                },
            }
        }
        Ok(())
    }

    /// Dimension weights normalized to sum to 1.0
    pub fn normalized_weights(&self) -> HashMap<QualityDimension, f32> {
        let sum: f32 = self.supervision.dimension_weights.values().sum();
        self.supervision
            .dimension_weights
            .iter()
            .map(|(k, v)| (*k, if sum > 0.0 { v / sum } else { 0.0 }))
            .collect()
    }
}
