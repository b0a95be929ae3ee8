//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the filter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the capture filter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Collector endpoint and batching behaviour.
    pub publisher: PublisherConfig,

    /// What goes into each captured event.
    pub capture: CaptureConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Publisher configuration. Fixed for the lifetime of a module instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Collector base URL (e.g., "http://127.0.0.1:8082").
    pub endpoint: String,

    /// Topic events are published to.
    pub topic: String,

    /// Events per batch before a flush is forced.
    pub batch_size: usize,

    /// Maximum time an incomplete batch waits before flushing, in seconds.
    pub linger_secs: u64,

    /// Capacity of the writer's queue.
    pub queue_capacity: usize,

    /// Maximum emit tasks in flight before events are dropped.
    pub max_in_flight: usize,

    /// Collector request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retries per batch after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8082".to_string(),
            topic: "akto.api.logs".to_string(),
            batch_size: 500,
            linger_secs: 10,
            queue_capacity: 10_000,
            max_in_flight: 1024,
            request_timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

/// Capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Account identifier stamped on every event.
    pub account_id: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { account_id: 1_000_000 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
