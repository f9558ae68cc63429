//! The dispatch pipeline.
//!
//! # State machine (per request)
//! ```text
//! Received ──▶ CorsEvaluated ──┬─ OPTIONS ─────────────────────────────────┐
//!                              └▶ BodyNormalized ─▶ Routed ─┬─ Matched ──┐ │
//!                                                           └─ Unmatched ┤ │
//!                                                                        ▼ ▼
//!                                                                     Responded
//! ```
//! Every branch, including handler failures and panics, ends in exactly one
//! `Responded` transition carrying the CORS headers decided at `CorsEvaluated`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::ORIGIN;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::response::Response;
use axum::Router;
use chrono::{SecondsFormat, Utc};
use futures_util::FutureExt;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{DispatcherConfig, Environment, RouteGroupConfig};
use crate::cors::CorsPolicy;
use crate::error::{panic_message, DispatchError, HandlerError};
use crate::http::health::{health_response, is_health_check};
use crate::http::request::{normalize, NormalizedRequest};
use crate::http::response;
use crate::routing::{GroupLoad, HandlerGroup, RouteRegistry, UpstreamGroup};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Immutable dispatch configuration, shared by every request.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    registry: RouteRegistry,
    cors: CorsPolicy,
    environment: Environment,
    body_limit: usize,
}

pub struct DispatcherBuilder {
    registry: RouteRegistry,
    cors: CorsPolicy,
    environment: Environment,
    body_limit: usize,
}

impl DispatcherBuilder {
    /// Register a route group. Failures are recorded, never returned.
    pub fn group<F>(mut self, name: &str, prefix: &str, factory: F) -> Self
    where
        F: FnOnce() -> GroupLoad,
    {
        self.registry.register(name, prefix, factory);
        self
    }

    /// Register an upstream-forwarding group for every configured route.
    pub fn upstream_groups(mut self, routes: &[RouteGroupConfig]) -> Self {
        for route in routes {
            self.registry.register(&route.name, &route.prefix, || {
                UpstreamGroup::from_config(route).map(|g| Arc::new(g) as Arc<dyn HandlerGroup>)
            });
        }
        self
    }

    pub fn build(self) -> Dispatcher {
        let total = self.registry.entries().len();
        let loaded = self.registry.loaded_count();
        tracing::info!(
            loaded,
            failed = total - loaded,
            environment = self.environment.as_str(),
            cors_mode = ?self.cors.mode(),
            "Route registry ready"
        );

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                registry: self.registry,
                cors: self.cors,
                environment: self.environment,
                body_limit: self.body_limit,
            }),
        }
    }
}

impl Dispatcher {
    /// Start from config with an empty registry.
    pub fn builder(config: &DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            registry: RouteRegistry::new(),
            cors: CorsPolicy::from_config(&config.cors),
            environment: config.environment,
            body_limit: config.body.max_bytes,
        }
    }

    /// Every configured route mounted as an upstream group.
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::builder(config).upstream_groups(&config.routes).build()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.inner.registry
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.inner.cors
    }

    pub fn environment(&self) -> Environment {
        self.inner.environment
    }

    /// Axum router that sends every method and path through [`Dispatcher::dispatch`].
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(self)
            .layer(TraceLayer::new_for_http())
    }

    /// Run one request through the pipeline. Always produces a response.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let start = Instant::now();
        let request_id = ensure_request_id(&mut req);
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id.to_str().unwrap_or_default(),
            method = %method,
            path = %path,
        );

        async move {
            // Received
            tracing::info!(
                timestamp = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "Request received"
            );

            // CorsEvaluated
            let cors = self.inner.cors.evaluate(req.headers().get(ORIGIN));

            let mut response = if method == Method::OPTIONS {
                response::preflight()
            } else {
                match self.route(req, &method, &path).await {
                    Ok(response) => response,
                    Err(err) => {
                        log_failure(&err);
                        response::format_error(&err, self.inner.environment)
                    }
                }
            };

            // Responded
            cors.apply(response.headers_mut());
            response
                .headers_mut()
                .entry(X_REQUEST_ID)
                .or_insert(request_id);

            tracing::info!(
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn route(&self, req: Request, method: &Method, path: &str) -> Result<Response, DispatchError> {
        // BodyNormalized
        let normalized = normalize(req, self.inner.body_limit).await?;

        if is_health_check(method, path) {
            return Ok(health_response(method, self.inner.environment));
        }

        // Routed
        let Some(matched) = self.inner.registry.dispatch(path, method) else {
            return Err(DispatchError::NotFound {
                path: path.to_string(),
                method: method.clone(),
            });
        };

        tracing::debug!(group = %matched.name, "Dispatching to route group");
        invoke(matched.handler, normalized.mounted_at(matched.prefix))
            .await
            .map_err(DispatchError::from)
    }
}

async fn dispatch_handler(State(dispatcher): State<Dispatcher>, req: Request) -> Response {
    dispatcher.dispatch(req).await
}

/// Call a group, converting a panic (while building or polling its future)
/// into a `HandlerError`.
async fn invoke(handler: &Arc<dyn HandlerGroup>, req: NormalizedRequest) -> Result<Response, HandlerError> {
    let future = match catch_unwind(AssertUnwindSafe(|| handler.handle(req))) {
        Ok(future) => future,
        Err(payload) => return Err(panicked(payload)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(payload)),
    }
}

fn panicked(payload: Box<dyn std::any::Any + Send>) -> HandlerError {
    HandlerError::new(response::INTERNAL_ERROR_MESSAGE).caused_by(format!(
        "route group panicked: {}",
        panic_message(payload.as_ref())
    ))
}

fn log_failure(err: &DispatchError) {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %err, "Request failed");
    } else {
        tracing::warn!(status = status.as_u16(), error = %err, "Request rejected");
    }
}

/// Reuse a client-supplied request id or mint one; either way the request
/// carries it from here on.
fn ensure_request_id(req: &mut Request<Body>) -> HeaderValue {
    let existing = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| is_valid_request_id(v))
        .cloned();

    existing.unwrap_or_else(|| {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
        req.headers_mut().insert(X_REQUEST_ID, id.clone());
        id
    })
}

fn is_valid_request_id(value: &HeaderValue) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 128
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
}
