//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Capture and publish paths produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Context id flows through every capture log line
//! - Metrics are cheap (atomic increments), safe to call from host callbacks
//! - Nothing here ever affects the exchange

pub mod logging;
pub mod metrics;
