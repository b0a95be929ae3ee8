//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FilterConfig (validated, immutable)
//!     → handed to CaptureModule at construction
//! ```
//!
//! # Design Decisions
//! - Config is fixed at module start; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{CaptureConfig, FilterConfig, ObservabilityConfig, PublisherConfig};
pub use validation::ValidationError;
