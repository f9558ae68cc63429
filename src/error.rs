//! Error taxonomy for the dispatch layer.
//!
//! # Propagation
//! ```text
//! RouteLoadError  → logged at startup, one prefix degrades to 404
//! DispatchError   → shaped by http::response (Response Finalizer)
//!   ├─ PayloadTooLarge / BadRequest  (client, pre-handler)
//!   ├─ Handler(HandlerError)         (route group failure)
//!   └─ NotFound                      (no loaded prefix matched)
//! AdapterError    → generic 500 at the serverless boundary
//! ```

use axum::http::{Method, StatusCode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A route group could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum RouteLoadError {
    #[error("route group `{group}` has no upstream configured")]
    MissingUpstream { group: String },

    #[error("route group `{group}` has invalid upstream `{upstream}`: {reason}")]
    InvalidUpstream {
        group: String,
        upstream: String,
        reason: String,
    },

    #[error("route group constructor panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Failure produced by a route group, either returned or converted from a panic.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    status: Option<StatusCode>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// A failure without a declared status. Finalized as 500.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// A failure that declares its own HTTP status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause. Only surfaced in development mode.
    pub fn caused_by(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every failure the pipeline can hand to the Response Finalizer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("request entity too large")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("API route not found")]
    NotFound { path: String, method: Method },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Handler(err) => err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

/// The adapter's own wiring failed; nothing downstream can answer.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("dispatcher unavailable: {0}")]
    Unavailable(String),

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
