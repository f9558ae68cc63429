//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (name, prefix, factory)[]
//!     → registry.rs (run each factory in isolation)
//!     → Loaded(handler) | Failed(reason)
//!     → Freeze as immutable RouteRegistry
//!
//! Incoming request path
//!     → registry.rs (longest mounted prefix among loaded groups)
//!     → group.rs (HandlerGroup::handle)
//!     → Return: response, failure, or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - A failed group never aborts startup; its prefix falls through to 404
//! - Prefix matching respects path segments
//! - No regex in hot path

pub mod group;
pub mod registry;
pub mod upstream;

pub use group::{handler_fn, GroupLoad, HandlerFn, HandlerGroup, HandlerResult};
pub use registry::{GroupState, RouteGroupEntry, RouteMatch, RouteRegistry};
pub use upstream::UpstreamGroup;
