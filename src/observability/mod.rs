//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → the `dispatch` span (request_id, method, path) around each request
//!
//! Consumers:
//!     → stdout (human-readable or JSON lines)
//!     → platform log capture in serverless mode
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - JSON format for log aggregation, pretty format for development
//! - Request ID flows through the span, not through every call

pub mod logging;
