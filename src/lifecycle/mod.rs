//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (module.rs):
//!     Config → BatchingWriter worker → Emitter → ready for exchanges
//!
//! Per exchange (module.rs):
//!     create_http_context(id) → ExchangeCapture with shared Emitter
//!
//! Stop (module.rs, shutdown.rs):
//!     on_done → emitter quiesce → Shutdown signal → writer drains queue → final flush → exit
//! ```
//!
//! # Design Decisions
//! - The writer is created once and injected into every exchange; no globals
//! - Exchanges never see or change writer configuration
//! - Stopping is idempotent

pub mod module;
pub mod shutdown;

pub use module::CaptureModule;
pub use shutdown::Shutdown;
