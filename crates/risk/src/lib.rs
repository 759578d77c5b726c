//! Risk assessment for the support agent
//!
//! Combines fast local keyword scanning with an optional external
//! classifier. The merge policy is max-of, never average: the design
//! biases toward over-caution, so false positives on risk are acceptable
//! and false negatives are not. When the classifier is unavailable the
//! assessor degrades to keyword-only mode and keeps the turn moving.

pub mod assessor;
pub mod extract;
pub mod http;
pub mod intent;
pub mod keyword;

pub use assessor::{RiskAssessor, SESSION_RISK_KEY};
pub use extract::PatternContextExtractor;
pub use http::{HttpClassifier, HttpClassifierConfig};
pub use intent::IntentClassifier;
pub use keyword::{KeywordScanner, ScanResult};
