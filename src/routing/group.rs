//! The interface every route group implements.

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::{HandlerError, RouteLoadError};
use crate::http::request::NormalizedRequest;

pub type HandlerResult = Result<Response, HandlerError>;

/// Outcome of one registration attempt.
pub type GroupLoad = Result<Arc<dyn HandlerGroup>, RouteLoadError>;

/// A bundle of handlers mounted at one path prefix.
///
/// The group receives the request after body normalization, with the raw
/// bytes still available, and owns the response it returns.
pub trait HandlerGroup: Send + Sync + 'static {
    fn handle(&self, req: NormalizedRequest) -> BoxFuture<'_, HandlerResult>;
}

/// A [`HandlerGroup`] backed by an async closure.
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a route group.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(NormalizedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> HandlerGroup for HandlerFn<F>
where
    F: Fn(NormalizedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, req: NormalizedRequest) -> BoxFuture<'_, HandlerResult> {
        Box::pin((self.f)(req))
    }
}
