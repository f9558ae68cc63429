//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::cors::CorsMode;

/// Route groups mounted by default, in registration order.
pub const DEFAULT_ROUTE_GROUPS: &[(&str, &str)] = &[
    ("auth", "/api/auth"),
    ("user", "/api/user"),
    ("coins", "/api/coins"),
    ("rituals", "/api/rituals"),
    ("ai-chat", "/api/ai-chat"),
    ("fortune", "/api/fortune"),
    ("notifications", "/api/notifications"),
    ("fortune-limits", "/api/fortune-limits"),
    ("admin", "/api/admin"),
];

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Listener configuration (only used by `serve`).
    pub listener: ListenerConfig,

    /// Deployment environment. Gates diagnostic detail in error bodies.
    pub environment: Environment,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Request body limits.
    pub body: BodyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route groups, in registration order.
    pub routes: Vec<RouteGroupConfig>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            environment: Environment::default(),
            cors: CorsConfig::default(),
            body: BodyConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: DEFAULT_ROUTE_GROUPS
                .iter()
                .map(|(name, prefix)| RouteGroupConfig {
                    name: (*name).to_string(),
                    prefix: (*prefix).to_string(),
                    upstream: None,
                })
                .collect(),
        }
    }
}

impl DispatcherConfig {
    /// Look up a route group by name.
    pub fn route_mut(&mut self, name: &str) -> Option<&mut RouteGroupConfig> {
        self.routes.iter_mut().find(|r| r.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Anything other than `development` is treated as production.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins, or wildcard patterns such as `https://*.vercel.app`.
    pub allowed_origins: Vec<String>,

    /// How the serverless adapter's baseline headers relate to the origin policy.
    pub mode: CorsMode,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "https://*.vercel.app".to_string(),
            ],
            mode: CorsMode::default(),
        }
    }
}

/// Request body limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum accepted body size in bytes.
    pub max_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// One route group mounted at a path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteGroupConfig {
    /// Group identifier for logging.
    pub name: String,

    /// Mount prefix, e.g. `/api/coins`.
    pub prefix: String,

    /// Base URL of the service that owns this API area.
    #[serde(default)]
    pub upstream: Option<String>,
}
