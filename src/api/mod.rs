/// API Client Module
///
/// This module handles all interactions with the FakeStore API. It wraps
/// an HTTP client and provides typed resource fetches with a bounded
/// retry budget and a success-envelope contract.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{EtlError, EtlResult};
use crate::models::{RawRecord, ResourceCategory};

/// Envelope status marker for a successful response
const STATUS_SUCCESS: &str = "SUCCESS";

/// Capability contract for fetching resource collections
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn fetch(&self, category: ResourceCategory) -> EtlResult<Vec<RawRecord>>;
}

/// Delay computed from the attempt number that just failed
pub type BackoffFn = Box<dyn Fn(u32) -> Duration + Send + Sync>;

/// Bounded retry budget with an optional backoff seam.
///
/// No delay is applied unless a backoff is installed.
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Option<BackoffFn>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, backoff: None }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self { attempts, backoff: None }
    }

    #[allow(dead_code)]
    pub fn with_backoff(mut self, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.backoff = Some(Box::new(backoff));
        self
    }
}

/// FakeStore API client
pub struct FakeStoreClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl FakeStoreClient {
    /// Create a client from API configuration
    pub fn new(config: &ApiConfig) -> EtlResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EtlError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(config.retry_attempts),
        })
    }

    /// Replace the retry policy, e.g. to install a backoff
    #[allow(dead_code)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// GET an endpoint and decode the response body, retrying transport
    /// failures up to the configured budget
    async fn request_envelope(&self, endpoint: &str) -> EtlResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        fetch_with_retry(&self.retry, endpoint, |attempt| {
            let http = self.http.clone();
            let url = url.clone();
            async move {
                tracing::debug!("GET {} (attempt {})", url, attempt);
                let response = http.get(&url).send().await?;
                let response = response.error_for_status()?;
                response.json::<Value>().await
            }
        })
        .await
    }
}

#[async_trait]
impl ResourceClient for FakeStoreClient {
    async fn fetch(&self, category: ResourceCategory) -> EtlResult<Vec<RawRecord>> {
        let endpoint = category.endpoint();
        let envelope = self.request_envelope(endpoint).await?;
        let records = unwrap_envelope(endpoint, category, envelope)?;

        tracing::info!("Successfully fetched {} {} records", records.len(), category);
        Ok(records)
    }
}

/// Run `op` up to the policy's attempt budget.
///
/// Transport failures on all but the last attempt are logged and retried,
/// with the optional backoff applied between attempts. The last failure is
/// wrapped as an extraction error carrying the endpoint and cause.
pub async fn fetch_with_retry<T, E, F, Fut>(policy: &RetryPolicy, endpoint: &str, mut op: F) -> EtlResult<T>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                tracing::error!(
                    "Max retries reached. Request to {} failed after {} attempts: {}",
                    endpoint,
                    attempts,
                    e
                );
                return Err(EtlError::extraction(endpoint, format!("request failed after {attempts} attempts: {e}")));
            }
            Err(e) => {
                tracing::warn!("Request attempt {}/{} for {} failed, retrying: {}", attempt, attempts, endpoint, e);

                if let Some(backoff) = &policy.backoff {
                    tokio::time::sleep(backoff(attempt)).await;
                }
            }
        }
    }
}

/// Validate the response envelope and pull out the category's record
/// array.
///
/// A failure status or a missing payload is a terminal semantic error and
/// is never retried.
pub fn unwrap_envelope(endpoint: &str, category: ResourceCategory, envelope: Value) -> EtlResult<Vec<RawRecord>> {
    let status = envelope
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| EtlError::extraction(endpoint, "response envelope has no status field"))?;

    if status != STATUS_SUCCESS {
        return Err(EtlError::extraction(endpoint, format!("API returned error status: {status}")));
    }

    let records = envelope.get(category.envelope_key()).and_then(Value::as_array).ok_or_else(|| {
        EtlError::extraction(endpoint, format!("response envelope has no {} array", category.envelope_key()))
    })?;

    records
        .iter()
        .map(|record| {
            record
                .as_object()
                .cloned()
                .ok_or_else(|| EtlError::extraction(endpoint, format!("{} entry is not an object", category)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_retry_succeeds_within_budget() {
        let policy = RetryPolicy::new(3);
        let calls = AtomicU32::new(0);

        let result = fetch_with_retry(&policy, "/products", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err("connection reset")
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_once_after_budget_exhausted() {
        let policy = RetryPolicy::new(3);
        let calls = AtomicU32::new(0);

        let result: EtlResult<u32> = fetch_with_retry(&policy, "/products", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("connection reset") }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(EtlError::Extraction { endpoint, reason }) => {
                assert_eq!(endpoint, "/products");
                assert!(reason.contains("3 attempts"));
                assert!(reason.contains("connection reset"));
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_backoff_sees_each_failed_attempt_except_the_last() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let policy = RetryPolicy::new(3).with_backoff(move |attempt| {
            recorder.lock().unwrap().push(attempt);
            Duration::from_millis(0)
        });

        let result: EtlResult<u32> = fetch_with_retry(&policy, "/users", |_| async { Err("timed out") }).await;

        assert!(result.is_err());
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_envelope_success() {
        let envelope = json!({
            "status": "SUCCESS",
            "products": [{"id": 1, "title": "A", "price": 9.99}]
        });

        let records = unwrap_envelope("/products", ResourceCategory::Products, envelope).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_envelope_failure_status_is_terminal() {
        let envelope = json!({"status": "ERROR", "products": []});
        let err = unwrap_envelope("/products", ResourceCategory::Products, envelope).unwrap_err();
        assert!(err.to_string().contains("error status: ERROR"));
    }

    #[test]
    fn test_envelope_missing_status() {
        let envelope = json!({"products": []});
        let err = unwrap_envelope("/products", ResourceCategory::Products, envelope).unwrap_err();
        assert!(err.to_string().contains("no status field"));
    }

    #[test]
    fn test_envelope_missing_payload_key() {
        let envelope = json!({"status": "SUCCESS", "items": []});
        let err = unwrap_envelope("/users", ResourceCategory::Users, envelope).unwrap_err();
        assert!(err.to_string().contains("no users array"));
    }

    #[test]
    fn test_envelope_rejects_non_object_entries() {
        let envelope = json!({"status": "SUCCESS", "users": [1, 2]});
        let err = unwrap_envelope("/users", ResourceCategory::Users, envelope).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }
}
