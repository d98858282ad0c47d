//! The remote generation service seam.
//!
//! [`GenerationService`] is the black box the invoker talks to: it takes a
//! model reference plus an already-adapted JSON input and returns whatever
//! the model produced as a [`ModelOutput`]. [`super::ReplicateClient`] is the
//! production implementation; [`MockGenerationService`] (test-only) replays a
//! script of canned responses.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Transport or remote failures from a single service call.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request or the prediction did not finish in time.
    #[error("generation request timed out")]
    Timeout,

    /// The service answered with a non-success status code.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The prediction reached a terminal failed/canceled state.
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ModelOutput
// ---------------------------------------------------------------------------

/// An opaque result object that can hand out its own locator.
pub trait LocatorHandle: Send + Sync {
    fn url(&self) -> String;
}

/// Whatever a successful call produced, before normalization.
#[derive(Clone)]
pub enum ModelOutput {
    /// The call completed but produced nothing.
    Empty,
    /// A JSON value of unknown shape (string, list, mapping, ...).
    Json(serde_json::Value),
    /// A result object exposing a locator-retrieval capability.
    Handle(Arc<dyn LocatorHandle>),
}

impl ModelOutput {
    /// `Null` becomes [`ModelOutput::Empty`], everything else is kept as-is.
    pub fn from_json(value: serde_json::Value) -> Self {
        if value.is_null() {
            ModelOutput::Empty
        } else {
            ModelOutput::Json(value)
        }
    }

    /// Short shape description for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelOutput::Empty => "empty",
            ModelOutput::Json(serde_json::Value::String(_)) => "string",
            ModelOutput::Json(serde_json::Value::Array(_)) => "list",
            ModelOutput::Json(serde_json::Value::Object(_)) => "mapping",
            ModelOutput::Json(_) => "scalar",
            ModelOutput::Handle(_) => "handle",
        }
    }
}

impl fmt::Debug for ModelOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelOutput::Empty => f.write_str("Empty"),
            ModelOutput::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ModelOutput::Handle(h) => f.debug_tuple("Handle").field(&h.url()).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationService trait
// ---------------------------------------------------------------------------

/// Request/response access to a hosted generative model.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn GenerationService>`.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run `model_ref` (`owner/name` or `owner/name:version`) on `input`.
    async fn run(
        &self,
        model_ref: &str,
        input: &serde_json::Value,
    ) -> Result<ModelOutput, ServiceError>;

    /// Best-effort version identifier for provenance. `None` when unknown.
    async fn model_version(&self, _model: &str) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// MockGenerationService  (test-only)
// ---------------------------------------------------------------------------

/// Replays scripted responses, then repeats the fallback forever.
#[cfg(test)]
pub struct MockGenerationService {
    script: std::sync::Mutex<std::collections::VecDeque<Result<ModelOutput, ServiceError>>>,
    fallback: Result<ModelOutput, ServiceError>,
    calls: std::sync::Mutex<Vec<(String, serde_json::Value)>>,
    version: Option<String>,
}

#[cfg(test)]
impl MockGenerationService {
    /// Always returns `output`.
    pub fn always(output: ModelOutput) -> Self {
        Self::scripted(Vec::new(), Ok(output))
    }

    /// Always returns `Ok(Json("<locator>"))`.
    pub fn locator(url: &str) -> Self {
        Self::always(ModelOutput::Json(serde_json::Value::String(url.into())))
    }

    /// Always fails with `error`.
    pub fn failing(error: ServiceError) -> Self {
        Self::scripted(Vec::new(), Err(error))
    }

    /// Returns `script` in order, then `fallback` on every further call.
    pub fn scripted(
        script: Vec<Result<ModelOutput, ServiceError>>,
        fallback: Result<ModelOutput, ServiceError>,
    ) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            fallback,
            calls: std::sync::Mutex::new(Vec::new()),
            version: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Number of `run` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(model_ref, input)` of every `run` call so far.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationService for MockGenerationService {
    async fn run(
        &self,
        model_ref: &str,
        input: &serde_json::Value,
    ) -> Result<ModelOutput, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((model_ref.to_string(), input.clone()));
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn model_version(&self, _model: &str) -> Option<String> {
        self.version.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
