//! Health indicator capability.
//!
//! # Responsibilities
//! - Define what a participant must expose to be probed
//! - Carry the caller's cancellation/deadline to every probe call
//! - Expose the optional readiness threshold capability
//!
//! # Design Decisions
//! - Indicators own their timeouts; the aggregator only forwards context
//! - The threshold is read once at construction, never per probe

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Error type returned by indicators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Context propagated to every indicator invocation.
///
/// The aggregator never bounds a probe on its own: callers that want a
/// deadline set one here and indicators are expected to honor it.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ProbeContext {
    /// Create a context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the context to an existing cancellation token.
    pub fn with_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True once the token is cancelled or the deadline has passed.
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.remaining() == Some(Duration::ZERO)
    }

    /// Resolves when the context is cancelled or its deadline elapses.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

/// A participant that reports its own liveness and readiness.
///
/// `readiness_threshold` is the optional capability: the number of
/// consecutive readiness failures tolerated before the indicator also
/// fails liveness. `None` keeps readiness failures out of liveness.
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    async fn liveness(&self, ctx: &ProbeContext) -> Result<(), BoxError>;

    async fn readiness(&self, ctx: &ProbeContext) -> Result<(), BoxError>;

    fn readiness_threshold(&self) -> Option<u32> {
        None
    }
}

type CheckFn = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Indicator backed by plain closures.
///
/// Useful for process-local checks (a flag, a queue depth) that answer
/// immediately and need no I/O.
pub struct FnIndicator {
    liveness: CheckFn,
    readiness: CheckFn,
    threshold: Option<u32>,
}

impl FnIndicator {
    pub fn new<L, R>(liveness: L, readiness: R) -> Self
    where
        L: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
        R: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            liveness: Box::new(liveness),
            readiness: Box::new(readiness),
            threshold: None,
        }
    }

    /// An indicator that is always live and ready.
    pub fn always_up() -> Self {
        Self::new(|| Ok(()), || Ok(()))
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

impl fmt::Debug for FnIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnIndicator")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HealthIndicator for FnIndicator {
    async fn liveness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        (self.liveness)()
    }

    async fn readiness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        (self.readiness)()
    }

    fn readiness_threshold(&self) -> Option<u32> {
        self.threshold
    }
}
