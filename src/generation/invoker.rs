//! [`ModelInvoker`]: adapt, call, retry, normalize.
//!
//! One [`GenerationRequest`] per track. The invoker looks up the model
//! family, sends the adapted input to the [`GenerationService`], and turns
//! whatever comes back into a list of locators. Failed attempts are retried
//! with linearly growing backoff.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::adapter::family_for;
use super::output::normalize;
use super::service::{GenerationService, ServiceError};

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The last service error after all attempts were used.
    #[error("generation service failed: {0}")]
    Service(#[from] ServiceError),

    /// Every attempt returned output with no recognizable shape.
    #[error("no usable result after {attempts} attempt(s)")]
    NoUsableResult { attempts: u32 },

    /// Output was recognized but held no locators.
    #[error("model returned no audio locators")]
    NoLocators,
}

// ---------------------------------------------------------------------------
// RetryPolicy / GenerationRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub attempts: u32,
    /// Backoff unit; attempt `n` is followed by `n * backoff`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Sleep after failed attempt `attempt` (1-based), or `None` after the
    /// last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.attempts.max(1)).then(|| self.backoff * attempt)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub retry: RetryPolicy,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            retry,
        }
    }
}

// ---------------------------------------------------------------------------
// ModelInvoker
// ---------------------------------------------------------------------------

pub struct ModelInvoker {
    service: Arc<dyn GenerationService>,
}

impl ModelInvoker {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Run the request and return the normalized locator list.
    ///
    /// The list may be empty when the model answered with a recognized but
    /// empty shape; the caller decides what that means.
    pub async fn invoke(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        let family = family_for(&request.model);
        let adapted = family.adapt(&request.model, &request.prompt);
        let attempts = request.retry.attempts.max(1);
        log::debug!(
            "invoking {} as family '{}' ({} attempt(s))",
            adapted.model_ref,
            family.id,
            attempts
        );

        let mut last_error: Option<ServiceError> = None;

        for attempt in 1..=attempts {
            match self.service.run(&adapted.model_ref, &adapted.input).await {
                Ok(output) => match normalize(&output) {
                    Some(locators) => return Ok(locators),
                    None => log::warn!(
                        "attempt {attempt}/{attempts}: unrecognized {} output",
                        output.kind()
                    ),
                },
                Err(e) => {
                    log::warn!("attempt {attempt}/{attempts} failed: {e}");
                    last_error = Some(e);
                }
            }

            if let Some(delay) = request.retry.delay_after(attempt) {
                tokio::time::sleep(delay).await;
            }
        }

        Err(match last_error {
            Some(e) => GenerationError::Service(e),
            None => GenerationError::NoUsableResult { attempts },
        })
    }

    /// Best-effort version identifier for the ledger.
    pub async fn model_version(&self, model: &str) -> Option<String> {
        self.service.model_version(model).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use serde_json::json;

    use super::*;
    use crate::generation::service::{MockGenerationService, ModelOutput};

    fn quick(attempts: u32, backoff_ms: u64) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::from_millis(backoff_ms),
        }
    }

    #[test]
    fn delay_grows_linearly_and_stops_at_last() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Some(Duration::from_secs(2)));
        assert_eq!(p.delay_after(2), Some(Duration::from_secs(4)));
        assert_eq!(p.delay_after(3), None);
    }

    #[tokio::test]
    async fn first_success_makes_one_call() {
        let mock = Arc::new(MockGenerationService::locator("https://x/a.wav"));
        let invoker = ModelInvoker::new(mock.clone());
        let req = GenerationRequest::new("lucataco/ace-step", "calm piano", quick(3, 10));

        let locators = invoker.invoke(&req).await.unwrap();

        assert_eq!(locators, vec!["https://x/a.wav".to_string()]);
        assert_eq!(mock.call_count(), 1);
        let (model_ref, input) = &mock.calls()[0];
        assert!(model_ref.starts_with("lucataco/ace-step:"));
        assert_eq!(input["tags"], json!("calm piano"));
    }

    #[tokio::test]
    async fn always_failing_uses_every_attempt_and_waits() {
        let mock = Arc::new(MockGenerationService::failing(ServiceError::Status {
            status: 503,
            body: "busy".into(),
        }));
        let invoker = ModelInvoker::new(mock.clone());
        let req = GenerationRequest::new("acme/model", "p", quick(3, 20));

        let started = Instant::now();
        let err = invoker.invoke(&req).await.unwrap_err();

        assert_eq!(mock.call_count(), 3);
        // 20 ms after attempt 1, 40 ms after attempt 2.
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(matches!(
            err,
            GenerationError::Service(ServiceError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn last_service_error_is_surfaced() {
        let mock = Arc::new(MockGenerationService::scripted(
            vec![Err(ServiceError::Timeout)],
            Err(ServiceError::PredictionFailed("oom".into())),
        ));
        let invoker = ModelInvoker::new(mock);
        let err = invoker
            .invoke(&GenerationRequest::new("m/n", "p", quick(2, 1)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::Service(ServiceError::PredictionFailed(ref m)) if m == "oom"
        ));
    }

    #[tokio::test]
    async fn unrecognized_output_is_retried_then_soft_fails() {
        let mock = Arc::new(MockGenerationService::always(ModelOutput::Json(json!(42))));
        let invoker = ModelInvoker::new(mock.clone());
        let err = invoker
            .invoke(&GenerationRequest::new("m/n", "p", quick(3, 1)))
            .await
            .unwrap_err();

        assert_eq!(mock.call_count(), 3);
        assert!(matches!(err, GenerationError::NoUsableResult { attempts: 3 }));
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let mock = Arc::new(MockGenerationService::scripted(
            vec![Err(ServiceError::Timeout), Ok(ModelOutput::Empty)],
            Ok(ModelOutput::Json(json!({"audio": "https://x/b.wav"}))),
        ));
        let invoker = ModelInvoker::new(mock.clone());
        let locators = invoker
            .invoke(&GenerationRequest::new("m/n", "p", quick(3, 1)))
            .await
            .unwrap();

        assert_eq!(locators, vec!["https://x/b.wav".to_string()]);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn soft_fail_then_service_error_reports_service_error() {
        let mock = Arc::new(MockGenerationService::scripted(
            vec![Ok(ModelOutput::Empty)],
            Err(ServiceError::Timeout),
        ));
        let invoker = ModelInvoker::new(mock);
        let err = invoker
            .invoke(&GenerationRequest::new("m/n", "p", quick(2, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Service(ServiceError::Timeout)));
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let mock = Arc::new(MockGenerationService::locator("u"));
        let invoker = ModelInvoker::new(mock.clone());
        invoker
            .invoke(&GenerationRequest::new("m/n", "p", quick(0, 1)))
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn model_version_passes_through() {
        let mock = Arc::new(MockGenerationService::locator("u").with_version("v1"));
        let invoker = ModelInvoker::new(mock);
        assert_eq!(invoker.model_version("m/n").await.as_deref(), Some("v1"));
    }
}
