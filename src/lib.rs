//! Inline HTTP traffic capture filter library

pub mod capture;
pub mod config;
pub mod host;
pub mod lifecycle;
pub mod observability;
pub mod publish;
pub mod replay;

pub use capture::{ExchangeCapture, TransactionEvent};
pub use config::FilterConfig;
pub use lifecycle::CaptureModule;
