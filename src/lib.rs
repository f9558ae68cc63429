//! API dispatcher library.
//!
//! Accepts HTTP requests, applies the cross-origin policy, normalizes the
//! body, and hands each request to the route group mounted at its path
//! prefix. Every request ends in one JSON response, including handler
//! failures and unmatched paths.

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod observability;
pub mod routing;
pub mod serverless;

pub use config::DispatcherConfig;
pub use error::{DispatchError, HandlerError, RouteLoadError};
pub use http::{Dispatcher, HttpServer, NormalizedRequest};
pub use routing::{handler_fn, HandlerGroup};
pub use serverless::ServerlessAdapter;
