//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route prefixes are well-formed and unique
//! - Validate value ranges (body limit > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatcherConfig → Result<(), Vec<ValidationError>>
//! - Upstream URLs are checked when the group loads, not here

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::DispatcherConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("route `{0}` has an empty name")]
    EmptyRouteName(String),

    #[error("route `{name}` prefix `{prefix}` must start with '/' and not end with '/'")]
    MalformedPrefix { name: String, prefix: String },

    #[error("route prefix `{0}` is registered more than once")]
    DuplicatePrefix(String),

    #[error("route prefix `{0}` shadows the health endpoint")]
    ReservedPrefix(String),

    #[error("body.max_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("allowed origin entries must not be empty")]
    EmptyOrigin,

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),
}

pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for route in &config.routes {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(route.prefix.clone()));
        }
        if !route.prefix.starts_with('/') || (route.prefix.len() > 1 && route.prefix.ends_with('/')) {
            errors.push(ValidationError::MalformedPrefix {
                name: route.name.clone(),
                prefix: route.prefix.clone(),
            });
        }
        if route.prefix == "/health" {
            errors.push(ValidationError::ReservedPrefix(route.prefix.clone()));
        }
        if !seen.insert(route.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.prefix.clone()));
        }
    }

    if config.body.max_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.cors.allowed_origins.iter().any(|o| o.trim().is_empty()) {
        errors.push(ValidationError::EmptyOrigin);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
