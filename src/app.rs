//! Application bootstrap.
//!
//! Wires config loading, logging, error reporting and health aggregation
//! in dependency order:
//!
//! ```text
//! config → telemetry → stop hooks → health
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::loader::{process_env, ConfigError};
use crate::config::{load_config_with_env, CoreConfig};
use crate::health::{Health, HealthIndicator, IndicatorRegistry};
use crate::lifecycle::{shutdown_signal, Lifecycle, StopHook};
use crate::observability::{
    init_telemetry, LogSettings, SentrySettings, Telemetry, TelemetryError, SENTRY_FLUSH_TIMEOUT,
};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
}

type EnvFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builder for an [`App`].
pub struct Bootstrap<C> {
    config: C,
    registry: IndicatorRegistry,
    env: EnvFn,
}

impl<C> Bootstrap<C>
where
    C: CoreConfig + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Start from a config value holding the in-code defaults.
    pub fn new(config: C) -> Self {
        Self {
            config,
            registry: IndicatorRegistry::new(),
            env: Box::new(process_env),
        }
    }

    pub fn indicator<I>(mut self, name: impl Into<String>, indicator: I) -> Self
    where
        I: HealthIndicator + 'static,
    {
        self.registry = self.registry.register(name, indicator);
        self
    }

    pub fn indicator_arc(mut self, name: impl Into<String>, indicator: Arc<dyn HealthIndicator>) -> Self {
        self.registry = self.registry.register_arc(name, indicator);
        self
    }

    /// Replace the process environment used for the env overlay.
    pub fn env_lookup<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    pub fn start(self) -> Result<App<C>, BootstrapError> {
        let Bootstrap {
            mut config,
            registry,
            env,
        } = self;

        load_config_with_env(&mut config, env.as_ref())?;

        let log = LogSettings::from_config(&config);
        let sentry = SentrySettings::from_config(&config);
        let telemetry = Arc::new(init_telemetry(&log, sentry.as_ref())?);

        let lifecycle = Lifecycle::new();
        if telemetry.sentry_enabled() {
            let telemetry = telemetry.clone();
            lifecycle.on_stop(StopHook::new("sentry-flush", move || {
                if !telemetry.flush(SENTRY_FLUSH_TIMEOUT) {
                    tracing::warn!("Timed out flushing Sentry events");
                }
                Ok(())
            }));
        }

        let health = Health::with_overrides(registry, &config.health().readiness_thresholds);

        tracing::info!(
            app = %config.app_name(),
            version = %config.app_version(),
            profile = config.profile().as_str(),
            indicators = health.len(),
            "Application started"
        );

        Ok(App {
            config: Arc::new(config),
            health: Arc::new(health),
            lifecycle: Arc::new(lifecycle),
            telemetry,
        })
    }
}

/// A started application.
pub struct App<C> {
    config: Arc<C>,
    health: Arc<Health>,
    lifecycle: Arc<Lifecycle>,
    telemetry: Arc<Telemetry>,
}

impl<C> App<C> {
    pub fn config(&self) -> &Arc<C> {
        &self.config
    }

    pub fn health(&self) -> &Arc<Health> {
        &self.health
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Run stop hooks now.
    pub fn shutdown(&self) {
        self.lifecycle.stop();
    }

    /// Wait for SIGINT/SIGTERM, then shut down.
    pub async fn run_until_signal(&self) {
        shutdown_signal().await;
        self.shutdown();
    }
}

impl<C> std::fmt::Debug for App<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("health", &self.health)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
