//! Cross-origin access policy.
//!
//! # Data Flow
//! ```text
//! Origin header (optional)
//!     → origin.rs (OriginPolicy::is_allowed against OriginRule list)
//!     → headers.rs (CorsHeaders: reflect origin, or withhold permission)
//!     → applied to every response the request produces
//! ```
//!
//! # Design Decisions
//! - Rules are compiled once at startup and never mutated
//! - A denied origin is not blocked; permission headers are withheld and the
//!   browser enforces the outcome
//! - `CorsMode` decides whether the serverless adapter's baseline headers follow
//!   the evaluator (`Unified`) or always allow `*` (`Permissive`)

pub mod headers;
pub mod origin;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

pub use headers::{CorsHeaders, ALLOW_HEADERS, ALLOW_METHODS, MAX_AGE_SECS};
pub use origin::{is_allowed, OriginPolicy, OriginRule};

/// Relationship between the adapter baseline and the origin evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    /// Baseline carries the evaluator's decision.
    #[default]
    Unified,
    /// Baseline always carries `Access-Control-Allow-Origin: *`.
    Permissive,
}

/// Compiled origin rules plus the adapter mode.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: OriginPolicy,
    mode: CorsMode,
}

impl CorsPolicy {
    pub fn new(origins: OriginPolicy, mode: CorsMode) -> Self {
        Self { origins, mode }
    }

    pub fn from_config(config: &crate::config::CorsConfig) -> Self {
        Self::new(OriginPolicy::from_patterns(&config.allowed_origins), config.mode)
    }

    pub fn mode(&self) -> CorsMode {
        self.mode
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    /// Headers the pipeline attaches after evaluating the request origin.
    pub fn evaluate(&self, origin: Option<&HeaderValue>) -> CorsHeaders {
        CorsHeaders::for_origin(&self.origins, origin)
    }

    /// Headers the serverless adapter sets before any other logic.
    pub fn baseline(&self, origin: Option<&HeaderValue>) -> CorsHeaders {
        match self.mode {
            CorsMode::Permissive => CorsHeaders::permissive(),
            CorsMode::Unified => self.evaluate(origin),
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_config(&crate::config::CorsConfig::default())
    }
}
