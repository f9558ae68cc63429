//! Response finalization.
//!
//! # Responsibilities
//! - Shape every failure into `{success:false, message, ...}`
//! - Shape unmatched paths into the 404 body
//! - Gate diagnostic detail on the environment
//!
//! # Design Decisions
//! - The only place failure bodies are built
//! - CORS headers are added by the caller after finalization, never removed here
//! - `stack` is the error's source chain; Rust has no exception trace to leak

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::Environment;
use crate::error::DispatchError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct NotFoundBody<'a> {
    success: bool,
    message: &'static str,
    path: &'a str,
    method: &'a str,
}

/// Message for failures whose cause must not reach the client.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Terminal response for a pipeline failure.
pub fn format_error(err: &DispatchError, environment: Environment) -> Response {
    if let DispatchError::NotFound { path, method } = err {
        return format_not_found(path, method);
    }

    let status = err.status();
    let (error, stack) = if environment.is_development() {
        (Some(format!("{err:?}")), Some(source_chain(err)))
    } else {
        (None, None)
    };

    json_response(
        status,
        &ErrorBody {
            success: false,
            message: err.to_string(),
            error,
            stack,
        },
    )
}

/// Terminal response when no loaded group is mounted at `path`.
pub fn format_not_found(path: &str, method: &Method) -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        &NotFoundBody {
            success: false,
            message: "API route not found",
            path,
            method: method.as_str(),
        },
    )
}

/// Generic 500 used when the pipeline itself is unavailable.
pub fn internal_error() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorBody {
            success: false,
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            error: None,
            stack: None,
        },
    )
}

/// 200 with an empty body, for preflight requests.
pub fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    (status, Json(body)).into_response()
}

fn source_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}
