//! Health aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     registry.rs (collect indicators)
//!     → threshold.rs (resolve readiness thresholds once)
//!     → aggregator.rs (Health, immutable indicator set)
//!
//! Readiness probe:
//!     Each indicator in order
//!     → UP resets the failure streak
//!     → UNAVAILABLE increments the failure streak
//!
//! Liveness probe:
//!     Each indicator in order
//!     → DOWN on indicator error
//!     → UNAVAILABLE if streak > threshold
//! ```
//!
//! # Design Decisions
//! - Indicators are identified by registration index, not by reference
//! - One failing indicator never stops the others from being probed
//! - Probes are sequential; a slow indicator delays the whole probe
//! - No HTTP exposure here; callers map reports to their own endpoints

pub mod aggregator;
pub mod indicator;
pub mod registry;
pub mod status;
pub mod threshold;

pub use aggregator::Health;
pub use indicator::{BoxError, FnIndicator, HealthIndicator, ProbeContext};
pub use registry::IndicatorRegistry;
pub use status::{HealthReport, HealthStatus, IndicatorId, IndicatorReport, ProbeError, Status};
