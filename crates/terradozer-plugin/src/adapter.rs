use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::classify::{coerce_force_destroy, is_retryable};
use crate::error::OperationTimedOut;
use crate::rpc::{Diagnostic, ImportedResource, ProviderRpc};

const FIXED_RETRY_BUDGET: Duration = Duration::from_secs(30);
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// A diagnostic that has already been run through retry classification,
/// carried back to the caller (the Resource Engine) so it can decide how to
/// wrap it (`RefreshError`, `RetryableDestroyError`, `PermanentDestroyError`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedError {
    pub message: String,
    pub retryable: bool,
    /// Set when the failure is the terminal one of a retry budget that
    /// expired while still classifying as retryable (`OperationTimedOut`).
    pub timed_out: bool,
}

impl ClassifiedError {
    fn permanent(diag: &Diagnostic) -> Self {
        ClassifiedError {
            message: diag.rendered(),
            retryable: false,
            timed_out: false,
        }
    }

    fn timed_out(op: &'static str, budget: Duration, diag: &Diagnostic) -> Self {
        let err = OperationTimedOut {
            op,
            budget,
            cause: diag.rendered(),
        };
        ClassifiedError {
            message: err.to_string(),
            retryable: true,
            timed_out: true,
        }
    }
}

/// Typed wrapper over a running plugin's RPC surface. Owns the
/// retry/classification/force-destroy-coercion logic described for the
/// Provider Adapter; the actual transport is whatever `ProviderRpc` impl was
/// handed to it (`GrpcProviderRpc` in production, `FakeProviderRpc` in
/// every higher-level test).
pub struct ProviderAdapter {
    rpc: Box<dyn ProviderRpc>,
    /// Serializes calls against the underlying subprocess, per spec §4.3's
    /// "serializes internally" clause.
    call_guard: Mutex<()>,
}

impl ProviderAdapter {
    pub fn new(rpc: Box<dyn ProviderRpc>) -> Self {
        Self {
            rpc,
            call_guard: Mutex::new(()),
        }
    }

    /// Configure never retries, per spec's operation table.
    pub async fn configure(&self, config: Value) -> Result<(), ClassifiedError> {
        let _guard = self.call_guard.lock().await;
        self.rpc.configure(config).await.map_err(|d| ClassifiedError::permanent(&d))
    }

    pub async fn import(&self, type_name: &str, id: &str) -> Result<Vec<ImportedResource>, ClassifiedError> {
        let _guard = self.call_guard.lock().await;
        self.retry_loop(FIXED_RETRY_BUDGET, "import", || self.rpc.import(type_name, id))
            .await
    }

    pub async fn read(&self, type_name: &str, current_state: &Value) -> Result<Option<Value>, ClassifiedError> {
        let _guard = self.call_guard.lock().await;
        self.retry_loop(FIXED_RETRY_BUDGET, "read", || self.rpc.read(type_name, current_state))
            .await
    }

    /// `budget` is caller-supplied (the scheduler's per-resource timeout).
    /// The prior state is coerced (force-destroy fields flipped to `true`)
    /// before every attempt.
    pub async fn destroy(
        &self,
        type_name: &str,
        prior_state: &Value,
        budget: Duration,
    ) -> Result<Option<Value>, ClassifiedError> {
        let _guard = self.call_guard.lock().await;
        let coerced = coerce_force_destroy(prior_state);
        self.retry_loop(budget, "destroy", || self.rpc.destroy(type_name, &coerced)).await
    }

    async fn retry_loop<T, F, Fut>(&self, budget: Duration, op: &'static str, mut call: F) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, Diagnostic>>,
    {
        let deadline = Instant::now() + budget;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(diag) => {
                    if !is_retryable(&diag.rendered()) {
                        debug!(op, message = %diag.rendered(), "permanent failure, not retrying");
                        return Err(ClassifiedError::permanent(&diag));
                    }

                    if Instant::now() >= deadline {
                        warn!(op, budget = ?budget, "retry budget exhausted");
                        return Err(ClassifiedError::timed_out(op, budget, &diag));
                    }

                    debug!(op, message = %diag.rendered(), backoff = ?backoff, "retrying after classifiable failure");
                    tokio::time::sleep(backoff.min(deadline.saturating_duration_since(Instant::now())))
                        .await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }
}
