//! Single-invocation adapter over the dispatch pipeline.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::ORIGIN;
use axum::http::Method;
use axum::response::Response;
use futures_util::FutureExt;

use crate::cors::CorsPolicy;
use crate::error::{panic_message, AdapterError};
use crate::http::pipeline::Dispatcher;
use crate::http::response;

#[derive(Clone)]
enum Pipeline {
    Ready(Dispatcher),
    Unavailable(Arc<AdapterError>),
}

#[derive(Clone)]
pub struct ServerlessAdapter {
    pipeline: Pipeline,
    cors: CorsPolicy,
}

impl ServerlessAdapter {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            cors: dispatcher.cors().clone(),
            pipeline: Pipeline::Ready(dispatcher),
        }
    }

    /// An adapter whose pipeline could not be built. Uses the default CORS policy.
    pub fn unavailable(err: AdapterError) -> Self {
        tracing::error!(error = %err, "Serverless adapter starting without a pipeline");
        Self {
            pipeline: Pipeline::Unavailable(Arc::new(err)),
            cors: CorsPolicy::default(),
        }
    }

    /// Build once per execution context, capturing any construction failure.
    pub fn bootstrap<F, E>(build: F) -> Self
    where
        F: FnOnce() -> Result<Dispatcher, E>,
        E: std::fmt::Display,
    {
        match build() {
            Ok(dispatcher) => Self::new(dispatcher),
            Err(e) => Self::unavailable(AdapterError::Unavailable(e.to_string())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.pipeline, Pipeline::Ready(_))
    }

    /// Handle one invocation. Always produces exactly one response.
    pub async fn handle(&self, req: Request) -> Response {
        let baseline = self.cors.baseline(req.headers().get(ORIGIN));

        if req.method() == Method::OPTIONS {
            let mut response = response::preflight();
            baseline.apply(response.headers_mut());
            return response;
        }

        let mut response = match &self.pipeline {
            Pipeline::Ready(dispatcher) => contain(dispatcher.dispatch(req)).await,
            Pipeline::Unavailable(err) => {
                tracing::error!(
                    error = %err,
                    method = %req.method(),
                    path = %req.uri().path(),
                    "Request received while pipeline unavailable"
                );
                response::internal_error()
            }
        };

        baseline.apply(response.headers_mut());
        response
    }
}

/// Last-resort boundary: a panic anywhere in `pipeline` becomes the generic 500.
async fn contain<F>(pipeline: F) -> Response
where
    F: Future<Output = Response>,
{
    match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let err = AdapterError::Panicked(panic_message(payload.as_ref()));
            tracing::error!(error = %err, "Dispatch pipeline failed");
            response::internal_error()
        }
    }
}
