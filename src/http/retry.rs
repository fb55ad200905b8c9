//! Bounded request retry with a fixed interval.
//!
//! A request is retried when the downstream chain fails with a transport
//! error or answers with a non-2xx status. Retries are counted per logical
//! request ([`RequestKey`](crate::http::request::RequestKey)) in the
//! interceptor's [`RetryStateStore`], so a request that already exhausted
//! its budget is not retried again until its state goes idle.
//!
//! `max_retry = 3` means at most four calls: the original plus three retries.

use crate::base::neterror::NetError;
use crate::http::interceptor::{HttpResult, Interceptor, Next};
use crate::http::retrystate::{RetryStateStore, DEFAULT_STATE_TTL};
use crate::http::HttpRequest;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, PoisonError, TryLockError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound between two opportunistic sweeps of the state store.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first call (0 disables retry).
    pub max_retry: u32,
    /// Fixed wait between two calls, in milliseconds.
    pub retry_interval_ms: u64,
    /// Inactivity window after which a request's retry count is forgotten.
    #[serde(with = "humantime_serde")]
    pub state_ttl: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry: 0,
            retry_interval_ms: 1000,
            state_ttl: DEFAULT_STATE_TTL,
        }
    }
}

impl RetryConfig {
    /// Create a config with no retries.
    pub fn no_retry() -> Self {
        Self::default()
    }

    pub fn new(max_retry: u32, retry_interval_ms: u64) -> Self {
        Self {
            max_retry,
            retry_interval_ms,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retry > 0
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

fn is_successful(outcome: &HttpResult) -> bool {
    matches!(outcome, Ok(resp) if resp.is_success())
}

/// Retries unsuccessful calls inline, sleeping on the calling task.
#[derive(Debug)]
pub struct RetryInterceptor {
    config: RetryConfig,
    store: RetryStateStore,
    cancel: Mutex<CancellationToken>,
    last_sweep: Mutex<Instant>,
}

impl RetryInterceptor {
    pub fn new(config: RetryConfig) -> Self {
        let store = RetryStateStore::new(config.state_ttl);
        Self::with_state_store(config, store)
    }

    /// Use an explicit state store (shared or inspected by the caller).
    pub fn with_state_store(config: RetryConfig, store: RetryStateStore) -> Self {
        Self {
            config,
            store,
            cancel: Mutex::new(CancellationToken::new()),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn state_store(&self) -> &RetryStateStore {
        &self.store
    }

    /// Token interrupting the retry waits currently in flight on this
    /// interceptor (calls using their own token excepted).
    ///
    /// Once cancelled it is replaced, so calls started afterwards retry
    /// normally.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.current_token()
    }

    /// Abort every retry wait in flight and arm a fresh token for later calls.
    pub fn cancel_all(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }

    fn current_token(&self) -> CancellationToken {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        token.clone()
    }

    /// Run `proceed` for `request`, retrying unsuccessful outcomes.
    ///
    /// A non-2xx response that survives all retries is returned as `Ok`; a
    /// transport error that survives all retries is returned as `Err`.
    pub async fn execute<F, Fut>(&self, request: &HttpRequest, proceed: F) -> HttpResult
    where
        F: FnMut(HttpRequest) -> Fut,
        Fut: Future<Output = HttpResult>,
    {
        let cancel = self.current_token();
        self.execute_with_cancel(request, proceed, &cancel).await
    }

    /// Same as [`execute`](Self::execute) with a per-call cancellation signal.
    ///
    /// Cancelling during a wait returns [`NetError::Cancelled`] without
    /// calling `proceed` again.
    pub async fn execute_with_cancel<F, Fut>(
        &self,
        request: &HttpRequest,
        mut proceed: F,
        cancel: &CancellationToken,
    ) -> HttpResult
    where
        F: FnMut(HttpRequest) -> Fut,
        Fut: Future<Output = HttpResult>,
    {
        if !self.config.is_enabled() {
            return proceed(request.clone()).await;
        }

        self.maybe_sweep();

        let key = request.key();
        let mut outcome = proceed(request.clone()).await;
        if is_successful(&outcome) {
            self.store.clear(&key);
            return outcome;
        }

        let tracker = self.store.track(&key);
        let interval = self.config.retry_interval();

        while !is_successful(&outcome) {
            let Some(attempt) = tracker.try_reserve(self.config.max_retry) else {
                break;
            };

            match &outcome {
                Ok(resp) => tracing::info!(
                    request = %key,
                    status = resp.status().as_u16(),
                    attempt,
                    "request not successful, retrying"
                ),
                Err(e) => tracing::info!(
                    request = %key,
                    error = %e,
                    attempt,
                    "request failed, retrying"
                ),
            }

            tracing::debug!(interval_ms = self.config.retry_interval_ms, "waiting before retry");
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!(request = %key, "retry wait cancelled");
                    return Err(NetError::Cancelled);
                }
                () = tokio::time::sleep(interval) => {}
            }

            outcome = proceed(request.clone()).await;
        }

        if is_successful(&outcome) {
            tracker.complete();
        } else {
            tracing::debug!(
                request = %key,
                attempts = tracker.attempts(),
                "retries exhausted"
            );
        }

        outcome
    }

    fn maybe_sweep(&self) {
        let period = self.config.state_ttl.min(MAX_SWEEP_PERIOD);
        let mut last = match self.last_sweep.try_lock() {
            Ok(guard) => guard,
            // Another call is sweeping.
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(poisoned)) => {
                tracing::warn!("retry sweep lock poisoned, recovering");
                self.last_sweep.clear_poison();
                poisoned.into_inner()
            }
        };
        if last.elapsed() < period {
            return;
        }
        *last = Instant::now();
        drop(last);

        let removed = self.store.sweep_expired();
        if removed > 0 {
            tracing::debug!(removed, "swept idle retry states");
        }
    }
}

impl Interceptor for RetryInterceptor {
    fn intercept<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, HttpResult> {
        Box::pin(async move { self.execute(&request, |req| next.run(req)).await })
    }
}
