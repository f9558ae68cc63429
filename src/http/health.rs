//! `GET /health` (also `HEAD`, and with a trailing slash).

use axum::body::Body;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::Environment;
use crate::http::response::json_response;

pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub environment: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn now(environment: Environment) -> Self {
        Self {
            status: "OK",
            message: "API dispatcher is running",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            environment: environment.as_str(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub fn is_health_check(method: &Method, path: &str) -> bool {
    (method == Method::GET || method == Method::HEAD)
        && path.strip_suffix('/').unwrap_or(path) == HEALTH_PATH
}

/// `HEAD` gets the same status and headers with an empty body.
pub fn health_response(method: &Method, environment: Environment) -> Response {
    let response = json_response(StatusCode::OK, &HealthStatus::now(environment));
    if method == Method::HEAD {
        let (parts, _) = response.into_parts();
        return Response::from_parts(parts, Body::empty());
    }
    response
}
