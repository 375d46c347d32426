//! Demo binary for the service bootstrap.
//!
//! Loads a `CoreEnv` configuration the same way a service would and
//! exercises the health aggregator.

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use service_core::config::{ConfigError, ConfigLocation, CoreConfig, CoreEnv};
use service_core::health::{FnIndicator, ProbeContext};
use service_core::Bootstrap;

#[derive(Parser)]
#[command(name = "service-core")]
#[command(about = "Load service configuration and run health probes", long_about = None)]
struct Cli {
    /// Config location, "file:<path>" or "" to skip the file.
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loaded configuration as JSON
    PrintConfig,
    /// Run one liveness and one readiness probe
    Probe {
        /// Deadline passed to every indicator, in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
    /// Start and wait for SIGINT/SIGTERM
    Run,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    #[serde(flatten)]
    core: CoreEnv,
    #[serde(skip)]
    location: Option<String>,
}

impl CoreConfig for DemoConfig {
    fn core(&self) -> &CoreEnv {
        &self.core
    }

    fn config_location(&self) -> Result<ConfigLocation, ConfigError> {
        match &self.location {
            Some(raw) => ConfigLocation::parse(raw),
            None => self.core.config_location(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = DemoConfig {
        core: CoreEnv {
            app_name: "service-core".into(),
            app_version: env!("CARGO_PKG_VERSION").into(),
            log_level: "info".into(),
            ..CoreEnv::default()
        },
        location: cli.config,
    };

    let app = Bootstrap::new(config)
        .indicator("process", FnIndicator::always_up())
        .start()?;

    match cli.command {
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(app.config().as_ref())?);
        }
        Commands::Probe { timeout_ms } => {
            let ctx = ProbeContext::new().with_timeout(Duration::from_millis(timeout_ms));
            let liveness = app.health().liveness(&ctx).await;
            let readiness = app.health().readiness(&ctx).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "liveness": liveness,
                    "readiness": readiness,
                }))?
            );
        }
        Commands::Run => {
            app.run_until_signal().await;
            return Ok(());
        }
    }

    app.shutdown();
    Ok(())
}
