// src/core/prober.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type BoxProbeFuture<T> = Pin<Box<dyn Future<Output = Result<T, ProbeError>> + Send>>;
type ProbeAction<T> = Arc<dyn Fn() -> BoxProbeFuture<T> + Send + Sync>;

/// Failure taxonomy shared by every probe type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Connection,
    Tls,
    Config,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connection => write!(f, "connection error"),
            FailureKind::Tls => write!(f, "tls error"),
            FailureKind::Config => write!(f, "config error"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// A typed probe failure. `Timeout`, `Connection` and `Tls` are transient
/// network conditions and qualify for a retry; `Config` and `Unexpected`
/// short-circuit immediately.
#[derive(Debug, Clone)]
pub struct ProbeError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::Timeout | FailureKind::Connection | FailureKind::Tls
        )
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProbeError {}

/// The immutable specification of one probe: an identifier (site name,
/// `ip:port` pair or candidate hostname), a re-invocable async action, and
/// an optional per-probe timeout override.
pub struct ProbeDescriptor<T> {
    id: String,
    timeout: Option<Duration>,
    action: ProbeAction<T>,
}

impl<T> ProbeDescriptor<T> {
    /// The action is a factory rather than a future so a retry can start a
    /// fresh attempt instead of polling a spent one.
    pub fn new<F, Fut>(id: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ProbeError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            timeout: None,
            action: Arc::new(move || Box::pin(action())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Debug for ProbeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeDescriptor")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The terminal result of executing a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome<T> {
    Success { payload: T },
    Failure { kind: FailureKind, message: String },
}

impl<T> ProbeOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            ProbeOutcome::Success { payload } => Some(payload),
            ProbeOutcome::Failure { .. } => None,
        }
    }
}

/// One completed probe, emitted as soon as it finishes regardless of
/// submission order.
#[derive(Debug, Clone)]
pub struct ProbeEvent<T> {
    pub id: String,
    pub outcome: ProbeOutcome<T>,
}

/// The bounded concurrent prober. At most `concurrency` actions execute at
/// any instant, no matter how many descriptors are submitted; each attempt
/// is bounded by `timeout` (or the descriptor's own override) and transient
/// failures are retried up to `retries` additional times with a fixed
/// `retry_delay` in between.
#[derive(Debug, Clone)]
pub struct Prober {
    pub concurrency: usize,
    pub timeout: Duration,
    pub retries: usize,
    pub retry_delay: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            concurrency: 50,
            timeout: Duration::from_secs(15),
            retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl Prober {
    pub fn new(concurrency: usize, timeout: Duration, retries: usize) -> Self {
        Self {
            concurrency,
            timeout,
            retries,
            ..Self::default()
        }
    }

    /// Launches every descriptor and returns the receiving end of an event
    /// stream, delivered in completion order.
    ///
    /// Every submitted descriptor yields exactly one event on an
    /// uncancelled run. Once `cancel` fires, no new attempt is started;
    /// in-flight attempts run to completion and descriptors that never
    /// started produce no event. Dropping the receiver cancels the token,
    /// so abandoning iteration early does not leave orphan probes running.
    pub fn run<T: Send + 'static>(
        &self,
        descriptors: Vec<ProbeDescriptor<T>>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<ProbeEvent<T>> {
        let (tx, rx) = mpsc::channel(64);
        let semaphore = Arc::new(Semaphore::new(self.concurrency.clamp(1, 5_000)));
        let config = self.clone();

        tokio::spawn(async move {
            let mut set = JoinSet::new();
            for descriptor in descriptors {
                if cancel.is_cancelled() {
                    break;
                }
                let semaphore = semaphore.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                let config = config.clone();

                set.spawn(async move {
                    let Some(outcome) = execute(&descriptor, &config, semaphore, &cancel).await
                    else {
                        return;
                    };
                    let event = ProbeEvent {
                        id: descriptor.id,
                        outcome,
                    };
                    if tx.send(event).await.is_err() {
                        // Receiver gone: stop issuing new work.
                        cancel.cancel();
                    }
                });
            }
            drop(tx);
            while set.join_next().await.is_some() {}
        });

        rx
    }

    /// Convenience wrapper that drains the event stream into a vector.
    pub async fn collect<T: Send + 'static>(
        &self,
        descriptors: Vec<ProbeDescriptor<T>>,
        cancel: CancellationToken,
    ) -> Vec<ProbeEvent<T>> {
        let mut rx = self.run(descriptors, cancel);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }
}

/// Runs one descriptor to its terminal outcome, or to `None` when the run
/// was cancelled before a terminal outcome was reached.
///
/// The concurrency slot is held only while an attempt is executing: it is
/// re-acquired for each retry and released during the inter-retry delay, so
/// a backing-off probe never starves a waiting one. A timed-out attempt is
/// dropped, which closes whatever connection it had opened.
async fn execute<T>(
    descriptor: &ProbeDescriptor<T>,
    config: &Prober,
    semaphore: Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<ProbeOutcome<T>> {
    let attempt_timeout = descriptor.timeout.unwrap_or(config.timeout);
    let mut attempt = 0usize;

    loop {
        let permit = tokio::select! {
            _ = cancel.cancelled() => return None,
            permit = semaphore.clone().acquire_owned() => {
                permit.expect("semaphore never closed")
            }
        };

        let result = time::timeout(attempt_timeout, (descriptor.action)()).await;
        drop(permit);

        let error = match result {
            Ok(Ok(payload)) => return Some(ProbeOutcome::Success { payload }),
            Ok(Err(error)) if !error.is_retryable() => {
                return Some(ProbeOutcome::Failure {
                    kind: error.kind,
                    message: error.message,
                });
            }
            Ok(Err(error)) => error,
            Err(_) => ProbeError::new(
                FailureKind::Timeout,
                format!("no response within {:.1}s", attempt_timeout.as_secs_f64()),
            ),
        };

        if attempt >= config.retries {
            return Some(ProbeOutcome::Failure {
                kind: error.kind,
                message: error.message,
            });
        }
        attempt += 1;
        debug!(id = %descriptor.id, attempt, error = %error, "Probe attempt failed, retrying.");

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = time::sleep(config.retry_delay) => {}
        }
    }
}
