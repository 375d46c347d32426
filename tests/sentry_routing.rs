//! Tracing events reach Sentry according to the configured level.

use sentry::Level;
use service_core::config::CoreEnv;
use service_core::observability::{sentry_layer, SentrySettings};
use tracing_subscriber::prelude::*;

fn settings(level: &str) -> SentrySettings {
    let mut env = CoreEnv::new("example");
    env.app_version = "1.0.0".into();
    env.sentry.sentry_dsn = "https://public@example.com/1".into();
    env.sentry.sentry_log_level = level.into();
    SentrySettings::from_config(&env).unwrap()
}

#[test]
fn test_warn_level_sends_warnings_as_events() {
    let settings = settings("");
    let subscriber = tracing_subscriber::registry().with(sentry_layer(settings.event_level));

    let events = tracing::subscriber::with_default(subscriber, || {
        sentry::test::with_captured_events(|| {
            tracing::info!("starting");
            tracing::warn!("degraded");
            tracing::error!("broken");
        })
    });

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].level, Level::Warning);
    assert_eq!(events[1].level, Level::Error);
    assert_eq!(events[1].message.as_deref(), Some("broken"));
}

#[test]
fn test_lower_levels_become_breadcrumbs() {
    let settings = settings("error");
    let subscriber = tracing_subscriber::registry().with(sentry_layer(settings.event_level));

    let events = tracing::subscriber::with_default(subscriber, || {
        sentry::test::with_captured_events(|| {
            tracing::warn!("retrying");
            tracing::error!("gave up");
        })
    });

    assert_eq!(events.len(), 1);
    let crumbs: Vec<_> = events[0]
        .breadcrumbs
        .iter()
        .filter(|b| b.message.as_deref() == Some("retrying"))
        .collect();
    assert_eq!(crumbs.len(), 1);
    assert_eq!(crumbs[0].level, Level::Warning);
}
