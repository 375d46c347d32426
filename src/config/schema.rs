//! Configuration schema definitions.
//!
//! `CoreEnv` holds the settings every service shares. Application config
//! types embed it with `#[serde(flatten)]` and implement [`CoreConfig`]
//! by returning it from `core()`; every other accessor has a default.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::loader::{ConfigError, ConfigLocation};
use crate::config::validation::MissingField;

pub const CONFIG_FOLDER: &str = "configs";
pub const CONFIG_FILE: &str = "app.json";

/// Deployment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Production,
    Development,
    Debug,
}

impl Profile {
    /// Unknown or empty names behave as `Development`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" => Profile::Production,
            "debug" => Profile::Debug,
            _ => Profile::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Production => "production",
            Profile::Development => "development",
            Profile::Debug => "debug",
        }
    }
}

/// Error reporting settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SentryEnv {
    /// DSN; empty disables error reporting.
    pub sentry_dsn: String,

    /// Minimum level sent as events (default warn).
    pub sentry_log_level: String,
}

/// Health settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Readiness thresholds by indicator name; negative disables.
    pub readiness_thresholds: BTreeMap<String, i32>,
}

/// Settings shared by every service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreEnv {
    pub app_name: String,
    pub app_version: String,

    /// debug, info, warn, error.
    pub log_level: String,

    /// "text" or "json"; empty picks json in production.
    pub log_format: String,

    /// production, development, debug.
    pub profile: String,

    #[serde(flatten)]
    pub sentry: SentryEnv,

    pub health: HealthSettings,
}

impl CoreEnv {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }
}

/// Accessors the bootstrap needs from an application config.
pub trait CoreConfig {
    fn core(&self) -> &CoreEnv;

    fn app_name(&self) -> &str {
        &self.core().app_name
    }

    fn app_version(&self) -> &str {
        &self.core().app_version
    }

    fn profile(&self) -> Profile {
        Profile::parse(&self.core().profile)
    }

    fn is_prod(&self) -> bool {
        self.profile() == Profile::Production
    }

    fn log_level(&self) -> &str {
        &self.core().log_level
    }

    fn log_format(&self) -> &str {
        &self.core().log_format
    }

    /// `None` disables error reporting regardless of the DSN.
    fn sentry(&self) -> Option<&SentryEnv> {
        Some(&self.core().sentry)
    }

    fn health(&self) -> &HealthSettings {
        &self.core().health
    }

    /// Where to read the config file from. Defaults to `./configs/app.json`.
    fn config_location(&self) -> Result<ConfigLocation, ConfigError> {
        let path = PathBuf::from(".").join(CONFIG_FOLDER).join(CONFIG_FILE);
        let path = std::path::absolute(&path).map_err(ConfigError::Io)?;
        Ok(ConfigLocation::File(path))
    }

    /// Overlay environment variables onto known keys.
    fn automatic_env(&self) -> bool {
        true
    }

    /// Required fields that are still unset after loading.
    fn missing_fields(&self) -> Vec<MissingField> {
        Vec::new()
    }
}

impl CoreConfig for CoreEnv {
    fn core(&self) -> &CoreEnv {
        self
    }
}
