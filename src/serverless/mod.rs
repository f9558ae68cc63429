//! Serverless execution.
//!
//! # Data Flow
//! ```text
//! platform invocation (lambda_http::Request)
//!     → lambda.rs (convert to axum Request)
//!     → adapter.rs (baseline CORS, preflight short-circuit, failure boundary)
//!     → http::Dispatcher::dispatch
//!     → lambda.rs (convert axum Response back)
//! ```
//!
//! # Design Decisions
//! - The adapter is built once per execution context and reused across
//!   invocations; it holds only immutable state
//! - A cold-start configuration failure is captured, not raised: every
//!   invocation then answers a generic 500

pub mod adapter;
pub mod lambda;

pub use adapter::ServerlessAdapter;
