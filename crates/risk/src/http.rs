//! HTTP classifier provider
//!
//! `reqwest` implementation of the `RiskClassifier` contract for
//! deployments that run the classifier model as a separate service.
//! Transport failures map to transient `CoreError`s; the assessor treats
//! them as a degradation, never a failed turn.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use support_agent_config::{ClassifierConfig, RiskConfig};
use support_agent_core::{CoreError, Result, RiskClassifier};

/// Configuration for the HTTP classifier backend
#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    /// Score endpoint URL
    pub endpoint: String,
    /// Bearer token, if the provider requires one
    pub api_key: Option<String>,
    /// Request timeout; kept tighter than the assessor's own budget
    pub timeout: Duration,
}

impl HttpClassifierConfig {
    /// Build from settings sections, reading the API key from the
    /// configured environment variable.
    pub fn from_settings(classifier: &ClassifierConfig, risk: &RiskConfig) -> Self {
        Self {
            endpoint: classifier.endpoint.clone(),
            api_key: std::env::var(&classifier.api_key_env).ok(),
            timeout: Duration::from_millis(risk.classifier_timeout_ms),
        }
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ScoreResponse {
    score: f32,
}

pub struct HttpClassifier {
    client: Client,
    config: HttpClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::unavailable(format!("http client build failed: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl RiskClassifier for HttpClassifier {
    async fn score(&self, text: &str) -> Result<f32> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&ScoreRequest { text });

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::timeout("classifier", self.config.timeout.as_millis() as u64)
            } else {
                CoreError::unavailable(format!("classifier request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(CoreError::unavailable(format!(
                "classifier returned status {}",
                response.status()
            )));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| CoreError::unavailable(format!("classifier response malformed: {}", e)))?;

        Ok(body.score.clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "http_classifier"
    }
}
