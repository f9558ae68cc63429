//! Route group registration and lookup.
//!
//! # Responsibilities
//! - Run each group factory once, isolating failures and panics
//! - Store loaded and failed entries in registration order
//! - Look up the group mounted at a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for a handful of groups)
//! - Failed entries are kept for reporting but never matched
//! - Explicit NoMatch rather than silent default

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::Method;

use crate::error::{panic_message, RouteLoadError};
use crate::routing::group::{GroupLoad, HandlerGroup};

/// Load state of one group. Never changes after registration.
#[derive(Clone)]
pub enum GroupState {
    Loaded(Arc<dyn HandlerGroup>),
    Failed(String),
}

impl fmt::Debug for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupState::Loaded(_) => f.write_str("Loaded"),
            GroupState::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteGroupEntry {
    name: String,
    prefix: String,
    state: GroupState,
}

impl RouteGroupEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, GroupState::Loaded(_))
    }

    pub fn state(&self) -> &GroupState {
        &self.state
    }

    /// Failure reason for an unloaded group.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            GroupState::Failed(reason) => Some(reason),
            GroupState::Loaded(_) => None,
        }
    }
}

/// A loaded group selected for a request path.
pub struct RouteMatch<'a> {
    pub name: &'a str,
    pub prefix: &'a str,
    pub handler: &'a Arc<dyn HandlerGroup>,
}

#[derive(Debug, Default)]
pub struct RouteRegistry {
    entries: Vec<RouteGroupEntry>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one group. A failing or panicking factory marks the group
    /// absent and never propagates.
    pub fn register<F>(&mut self, name: impl Into<String>, prefix: impl Into<String>, factory: F) -> &RouteGroupEntry
    where
        F: FnOnce() -> GroupLoad,
    {
        let name = name.into();
        let prefix = prefix.into();

        let load = catch_unwind(AssertUnwindSafe(factory))
            .unwrap_or_else(|payload| Err(RouteLoadError::Panicked(panic_message(payload.as_ref()))));

        let state = match load {
            Ok(handler) => {
                tracing::info!(group = %name, prefix = %prefix, "Route group loaded");
                GroupState::Loaded(handler)
            }
            Err(e) => {
                tracing::error!(
                    group = %name,
                    prefix = %prefix,
                    error = %e,
                    "Route group failed to load; prefix will answer 404"
                );
                GroupState::Failed(e.to_string())
            }
        };

        self.entries.push(RouteGroupEntry { name, prefix, state });
        &self.entries[self.entries.len() - 1]
    }

    /// Longest loaded prefix mounted at `path`; earlier registration wins ties.
    pub fn dispatch(&self, path: &str, method: &Method) -> Option<RouteMatch<'_>> {
        let mut best: Option<RouteMatch<'_>> = None;
        for entry in &self.entries {
            let GroupState::Loaded(handler) = &entry.state else {
                continue;
            };
            if !mount_matches(&entry.prefix, path) {
                continue;
            }
            if best.as_ref().is_some_and(|b| b.prefix.len() >= entry.prefix.len()) {
                continue;
            }
            best = Some(RouteMatch {
                name: &entry.name,
                prefix: &entry.prefix,
                handler,
            });
        }

        if let Some(m) = &best {
            tracing::trace!(group = %m.name, method = %method, path = %path, "Route matched");
        }
        best
    }

    pub fn entries(&self) -> &[RouteGroupEntry] {
        &self.entries
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loaded()).count()
    }
}

/// `/api/fortune` mounts `/api/fortune` and `/api/fortune/...`, not `/api/fortune-limits`.
fn mount_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
