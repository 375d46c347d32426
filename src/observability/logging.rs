//! Structured logging settings.
//!
//! # Responsibilities
//! - Derive level and output format from the loaded config
//! - Build the fmt layer for the chosen format
//!
//! # Design Decisions
//! - JSON to stdout for production, human-readable text to stderr otherwise
//! - The debug profile always logs at DEBUG
//! - `RUST_LOG` still wins when set

use std::io;

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, Layer};

use crate::config::{CoreConfig, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Level,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_config<C: CoreConfig + ?Sized>(cfg: &C) -> Self {
        let profile = cfg.profile();
        let level = match profile {
            Profile::Debug => Level::DEBUG,
            _ => parse_level(cfg.log_level()),
        };
        let format = match cfg.log_format().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "" if profile == Profile::Production => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self { level, format }
    }

    pub(crate) fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(self.level).into()))
    }

    pub(crate) fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        match self.format {
            LogFormat::Json => fmt::layer().json().with_writer(io::stdout).boxed(),
            LogFormat::Text => fmt::layer().with_writer(io::stderr).boxed(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
        }
    }
}

/// `debug`, `warn` and `error` map to their level; anything else is INFO.
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
