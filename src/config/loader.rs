//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{DispatcherConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};
use crate::cors::CorsMode;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: `{value}`")]
    InvalidValue { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then process environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<DispatcherConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => DispatcherConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `DISPATCHER_*` (and `NODE_ENV`) overrides from the given lookup.
pub fn apply_env_overrides<F>(config: &mut DispatcherConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup("DISPATCHER_ENV").or_else(|| lookup("NODE_ENV")) {
        config.environment = Environment::from_name(&env);
    }

    if let Some(origins) = lookup("DISPATCHER_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(ToString::to_string)
            .collect();
    }

    if let Some(mode) = lookup("DISPATCHER_CORS_MODE") {
        config.cors.mode = match mode.trim().to_ascii_lowercase().as_str() {
            "permissive" => CorsMode::Permissive,
            "unified" => CorsMode::Unified,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "DISPATCHER_CORS_MODE",
                    value: mode,
                })
            }
        };
    }

    if let Some(addr) = lookup("DISPATCHER_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    if let Some(level) = lookup("DISPATCHER_LOG_LEVEL") {
        config.observability.log_level = level;
    }

    for route in &mut config.routes {
        let var = format!(
            "DISPATCHER_UPSTREAM_{}",
            route.name.to_ascii_uppercase().replace('-', "_")
        );
        if let Some(upstream) = lookup(&var) {
            route.upstream = Some(upstream);
        }
    }

    Ok(())
}
