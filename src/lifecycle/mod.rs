//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     components register stop hooks (e.g. flush error reporting)
//!
//! Shutdown (shutdown.rs):
//!     stop() → broadcast to subscribers → run hooks in reverse order
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - Hooks run last-registered first, mirroring startup order
//! - A failing hook is logged and does not block the rest
//! - Stop is idempotent

pub mod shutdown;
pub mod signals;

pub use shutdown::{Lifecycle, StopHook};
pub use signals::shutdown_signal;
