//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (serve) or platform invocation (serverless)
//!     → pipeline.rs (log, CORS, request id)
//!     → request.rs (read, bound and parse body)
//!     → health.rs | routing::RouteRegistry → HandlerGroup
//!     → response.rs (shape failures and 404s)
//!     → Send to client
//! ```

pub mod health;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::{Dispatcher, DispatcherBuilder, X_REQUEST_ID};
pub use request::{normalize, NormalizedRequest, ParsedBody};
pub use server::HttpServer;
