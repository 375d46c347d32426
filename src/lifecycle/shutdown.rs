//! Shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::health::BoxError;

type HookFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// A named action to run when the application stops.
pub struct StopHook {
    name: String,
    run: HookFn,
}

impl StopHook {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe to the broadcast; components that own
/// resources register stop hooks.
pub struct Lifecycle {
    tx: broadcast::Sender<()>,
    hooks: Mutex<Vec<StopHook>>,
    stopped: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            hooks: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        }
    }

    /// Register a hook; hooks run in reverse registration order.
    pub fn on_stop(&self, hook: StopHook) {
        self.lock_hooks().push(hook);
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Number of tasks still listening for shutdown.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Broadcast shutdown and run every hook once. Returns the names of
    /// hooks that failed.
    pub fn stop(&self) -> Vec<String> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }
        let _ = self.tx.send(());

        let hooks = std::mem::take(&mut *self.lock_hooks());
        let mut failed = Vec::new();
        for hook in hooks.into_iter().rev() {
            tracing::debug!(hook = %hook.name, "Running stop hook");
            if let Err(e) = (hook.run)() {
                tracing::error!(hook = %hook.name, error = %e, "Stop hook failed");
                failed.push(hook.name);
            }
        }
        tracing::info!("Shutdown complete");
        failed
    }

    fn lock_hooks(&self) -> std::sync::MutexGuard<'_, Vec<StopHook>> {
        // A hook that panicked must not wedge shutdown.
        self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("hooks", &self.lock_hooks().len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
