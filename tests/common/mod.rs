//! Shared indicators for integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use service_core::health::{BoxError, HealthIndicator, ProbeContext};

/// Indicator whose answers are flipped from the test.
#[derive(Debug, Default)]
pub struct Switch {
    pub live: AtomicBool,
    pub ready: AtomicBool,
    pub threshold: Option<u32>,
    pub readiness_calls: AtomicUsize,
}

#[allow(dead_code)]
impl Switch {
    pub fn healthy(threshold: Option<u32>) -> Arc<Self> {
        Arc::new(Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(true),
            threshold,
            readiness_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthIndicator for Switch {
    async fn liveness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err("liveness check failed".into())
        }
    }

    async fn readiness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        self.readiness_calls.fetch_add(1, Ordering::SeqCst);
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err("readiness check failed".into())
        }
    }

    fn readiness_threshold(&self) -> Option<u32> {
        self.threshold
    }
}

/// Indicator that only answers once its work finishes or the context ends.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Slow {
    pub work: Duration,
}

#[async_trait]
impl HealthIndicator for Slow {
    async fn liveness(&self, ctx: &ProbeContext) -> Result<(), BoxError> {
        self.readiness(ctx).await
    }

    async fn readiness(&self, ctx: &ProbeContext) -> Result<(), BoxError> {
        tokio::select! {
            _ = tokio::time::sleep(self.work) => Ok(()),
            _ = ctx.done() => Err("probe cancelled".into()),
        }
    }
}

/// Readiness alternates between failure and success on every call.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Flapping {
    pub calls: AtomicUsize,
    pub threshold: u32,
}

#[async_trait]
impl HealthIndicator for Flapping {
    async fn liveness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        Ok(())
    }

    async fn readiness(&self, _ctx: &ProbeContext) -> Result<(), BoxError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if n % 2 == 0 {
            Err("flap".into())
        } else {
            Ok(())
        }
    }

    fn readiness_threshold(&self) -> Option<u32> {
        Some(self.threshold)
    }
}
