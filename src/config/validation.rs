//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URL scheme, non-zero durations, addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: MonitorConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("check.url is not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("check.url must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let check = &config.check;

    match Url::parse(&check.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string())),
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    let non_zero: [(&'static str, u64); 7] = [
        ("check.interval_ms", check.interval_ms),
        ("check.overall_timeout_ms", check.overall_timeout_ms),
        ("check.probe_timeout_ms", check.probe_timeout_ms),
        ("check.max_consecutive_errors", u64::from(check.max_consecutive_errors)),
        ("check.cooldown_multiplier", u64::from(check.cooldown_multiplier)),
        ("runner.refresh_interval_ms", config.runner.refresh_interval_ms),
        ("platform.poll_interval_ms", config.platform.poll_interval_ms),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
