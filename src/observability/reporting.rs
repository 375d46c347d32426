//! Error reporting via Sentry.
//!
//! Events at or above the configured level are sent to Sentry, lower
//! levels are attached as breadcrumbs to the next event.

use std::borrow::Cow;

use sentry::types::Dsn;
use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;
use tracing_subscriber::registry::LookupSpan;

use crate::config::{CoreConfig, Profile};
use crate::observability::logging::parse_level;
use crate::observability::TelemetryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentrySettings {
    pub dsn: String,
    pub environment: &'static str,
    pub release: String,
    pub event_level: Level,
}

impl SentrySettings {
    /// `None` when reporting is disabled or the DSN is empty.
    pub fn from_config<C: CoreConfig + ?Sized>(cfg: &C) -> Option<Self> {
        let sentry = cfg.sentry()?;
        if sentry.sentry_dsn.is_empty() {
            return None;
        }

        let environment = match cfg.profile() {
            Profile::Production => Profile::Production.as_str(),
            _ => Profile::Development.as_str(),
        };

        let mut release = match cfg.app_name() {
            "" => "unknown".to_string(),
            name => name.to_string(),
        };
        if !cfg.app_version().is_empty() {
            release.push('@');
            release.push_str(cfg.app_version());
        }

        let event_level = match sentry.sentry_log_level.as_str() {
            "" => Level::WARN,
            level => parse_level(level),
        };

        Some(Self {
            dsn: sentry.sentry_dsn.clone(),
            environment,
            release,
            event_level,
        })
    }
}

/// Initialize the Sentry client. The guard must stay alive for reporting
/// to work; dropping it flushes pending events.
pub fn init_sentry(settings: &SentrySettings) -> Result<sentry::ClientInitGuard, TelemetryError> {
    let dsn = settings
        .dsn
        .parse::<Dsn>()
        .map_err(|e| TelemetryError::Dsn(format!("{e}")))?;

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        environment: Some(Cow::Borrowed(settings.environment)),
        release: Some(Cow::Owned(settings.release.clone())),
        ..Default::default()
    });

    tracing::debug!(
        environment = settings.environment,
        release = %settings.release,
        "Sentry initialized"
    );
    Ok(guard)
}

/// Tracing layer forwarding events to the current Sentry hub.
pub fn sentry_layer<S>(event_level: Level) -> SentryLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    sentry_tracing::layer().event_filter(move |md| {
        if *md.level() <= event_level {
            EventFilter::Event
        } else {
            EventFilter::Breadcrumb
        }
    })
}
