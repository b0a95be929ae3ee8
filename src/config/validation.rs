//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (batch size, linger, queue and in-flight caps > 0)
//! - Check the collector endpoint is a usable http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FilterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::FilterConfig;

/// Upper bound for `max_in_flight`.
pub const MAX_IN_FLIGHT_LIMIT: usize = 1_000_000;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &FilterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let publisher = &config.publisher;

    match Url::parse(&publisher.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "publisher.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("publisher.endpoint", e.to_string())),
    }

    if publisher.topic.trim().is_empty() {
        errors.push(ValidationError::new("publisher.topic", "must not be empty"));
    }
    if publisher.batch_size == 0 {
        errors.push(ValidationError::new("publisher.batch_size", "must be greater than 0"));
    }
    if publisher.linger_secs == 0 {
        errors.push(ValidationError::new("publisher.linger_secs", "must be greater than 0"));
    }
    if publisher.queue_capacity == 0 {
        errors.push(ValidationError::new("publisher.queue_capacity", "must be greater than 0"));
    }
    if publisher.max_in_flight == 0 || publisher.max_in_flight > MAX_IN_FLIGHT_LIMIT {
        errors.push(ValidationError::new(
            "publisher.max_in_flight",
            format!("must be between 1 and {}", MAX_IN_FLIGHT_LIMIT),
        ));
    }
    if publisher.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "publisher.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if publisher.retry_base_delay_ms > publisher.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "publisher.retry_base_delay_ms",
            "must not exceed retry_max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&FilterConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = FilterConfig::default();
        config.publisher.endpoint = "ftp://collector".into();
        config.publisher.topic = " ".into();
        config.publisher.batch_size = 0;
        config.publisher.max_in_flight = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "publisher.endpoint",
                "publisher.topic",
                "publisher.batch_size",
                "publisher.max_in_flight",
            ]
        );
    }

    #[test]
    fn test_unparseable_endpoint() {
        let mut config = FilterConfig::default();
        config.publisher.endpoint = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "publisher.endpoint");
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = FilterConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
