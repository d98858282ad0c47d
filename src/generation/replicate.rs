//! [`ReplicateClient`]: the production [`GenerationService`].
//!
//! Predictions are created with `Prefer: wait` so short jobs return in one
//! round trip; anything still running is polled through its `urls.get`
//! link until it reaches a terminal state or `max_wait_secs` runs out.
//! All connection details come from [`ReplicateConfig`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ReplicateConfig;

use super::service::{GenerationService, ModelOutput, ServiceError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn error_message(&self) -> String {
        match &self.error {
            Value::Null => format!("prediction {}", self.status),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Split `owner/name:version` into `("owner/name", Some("version"))`.
pub fn split_model_ref(model_ref: &str) -> (&str, Option<&str>) {
    match model_ref.split_once(':') {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (model_ref, None),
    }
}

/// Endpoint and body for creating a prediction of `model_ref`.
///
/// Versioned references go through the generic predictions endpoint;
/// bare model names use the model-scoped one (latest version).
pub fn prediction_endpoint(base_url: &str, model_ref: &str, input: &Value) -> (String, Value) {
    let base = base_url.trim_end_matches('/');
    match split_model_ref(model_ref) {
        (_, Some(version)) => (
            format!("{base}/v1/predictions"),
            json!({ "version": version, "input": input }),
        ),
        (name, None) => (
            format!("{base}/v1/models/{name}/predictions"),
            json!({ "input": input }),
        ),
    }
}

// ---------------------------------------------------------------------------
// ReplicateClient
// ---------------------------------------------------------------------------

/// Calls the Replicate predictions API.
pub struct ReplicateClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ReplicateClient {
    /// Build a client from settings and an already-resolved API token.
    ///
    /// A default (no-timeout) HTTP client is used if the builder fails.
    pub fn from_config(config: &ReplicateConfig, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    async fn read_prediction(response: reqwest::Response) -> Result<Prediction, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Prediction>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl GenerationService for ReplicateClient {
    async fn run(&self, model_ref: &str, input: &Value) -> Result<ModelOutput, ServiceError> {
        let (url, body) = prediction_endpoint(&self.base_url, model_ref, input);
        log::debug!("creating prediction for {model_ref}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;
        let mut prediction = Self::read_prediction(response).await?;
        let deadline = Instant::now() + self.max_wait;

        loop {
            match prediction.status.as_str() {
                "succeeded" => return Ok(ModelOutput::from_json(prediction.output)),
                "failed" | "canceled" => {
                    return Err(ServiceError::PredictionFailed(prediction.error_message()))
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(ServiceError::Timeout);
            }

            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|u| u.get.clone())
                .ok_or_else(|| ServiceError::Parse("prediction has no polling URL".into()))?;

            log::debug!("prediction {}, polling", prediction.status);
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&poll_url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            prediction = Self::read_prediction(response).await?;
        }
    }

    async fn model_version(&self, model: &str) -> Option<String> {
        let (name, _) = split_model_ref(model);
        let url = format!("{}/v1/models/{name}", self.base_url);

        let response = match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                log::debug!("model lookup for {name} returned HTTP {}", r.status());
                return None;
            }
            Err(e) => {
                log::debug!("model lookup for {name} failed: {e}");
                return None;
            }
        };

        let json: Value = response.json().await.ok()?;
        json["latest_version"]["id"].as_str().map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
