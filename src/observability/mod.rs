//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! loaded config
//!     → logging.rs (level + format)
//!     → reporting.rs (Sentry client + tracing layer, optional)
//!     → one global tracing subscriber
//! ```
//!
//! # Design Decisions
//! - The global subscriber is installed once per process; an existing one
//!   is kept, never replaced, while the Sentry client still starts
//! - Sentry is only initialized when a DSN is configured
//! - Pending Sentry events are flushed on shutdown

pub mod logging;
pub mod reporting;

use std::time::Duration;

use tracing_subscriber::prelude::*;

pub use logging::{parse_level, LogFormat, LogSettings};
pub use reporting::{init_sentry, sentry_layer, SentrySettings};

/// How long shutdown waits for Sentry to deliver pending events.
pub const SENTRY_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid Sentry DSN: {0}")]
    Dsn(String),
}

/// Keeps the error reporting client alive for the life of the process.
pub struct Telemetry {
    sentry: Option<sentry::ClientInitGuard>,
    subscriber_installed: bool,
}

impl Telemetry {
    /// False when another global subscriber was already in place.
    pub fn subscriber_installed(&self) -> bool {
        self.subscriber_installed
    }

    pub fn sentry_enabled(&self) -> bool {
        self.sentry.as_ref().is_some_and(|g| g.is_enabled())
    }

    /// Flush pending Sentry events. Returns false on timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        match &self.sentry {
            Some(guard) => guard.flush(Some(timeout)),
            None => true,
        }
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("sentry", &self.sentry.is_some())
            .field("subscriber_installed", &self.subscriber_installed)
            .finish()
    }
}

/// Install the global subscriber and, when configured, the Sentry client.
///
/// If a global subscriber already exists it is left in place. The Sentry
/// client is still bound so explicit captures and the shutdown flush work,
/// but tracing events will not reach it.
pub fn init_telemetry(log: &LogSettings, sentry: Option<&SentrySettings>) -> Result<Telemetry, TelemetryError> {
    let guard = sentry.map(init_sentry).transpose()?;
    let reporting_layer = sentry.map(|s| sentry_layer(s.event_level));

    let subscriber_installed = tracing_subscriber::registry()
        .with(log.env_filter())
        .with(log.fmt_layer())
        .with(reporting_layer)
        .try_init()
        .is_ok();

    if subscriber_installed {
        tracing::info!(
            level = %log.level,
            format = ?log.format,
            sentry = guard.is_some(),
            "Logging initialized"
        );
    } else if guard.is_some() {
        tracing::warn!("Global subscriber already installed; tracing events will not be forwarded to Sentry");
    } else {
        tracing::debug!("Global subscriber already installed, keeping it");
    }

    Ok(Telemetry {
        sentry: guard,
        subscriber_installed,
    })
}
