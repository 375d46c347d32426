//! Service bootstrap library.
//!
//! Wires configuration, structured logging, optional error reporting and
//! liveness/readiness aggregation for long-running services.
//!
//! ```no_run
//! use service_core::app::Bootstrap;
//! use service_core::config::CoreEnv;
//! use service_core::health::{FnIndicator, ProbeContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Bootstrap::new(CoreEnv::new("example"))
//!     .indicator("db", FnIndicator::always_up().with_threshold(2))
//!     .start()?;
//!
//! let report = app.health().readiness(&ProbeContext::new()).await;
//! assert!(report.healthy);
//! app.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use app::{App, Bootstrap, BootstrapError};
pub use config::{CoreConfig, CoreEnv};
pub use health::{Health, HealthIndicator, HealthReport, ProbeContext, Status};
pub use lifecycle::Lifecycle;
