use http::Method;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::radix::{segments, shape, RadixNode};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted path parameters in match order.
///
/// Names are shared with the route tree, values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of matching a request path to a bound route.
#[derive(Debug, Clone)]
pub struct RouteMatch<T> {
    pub route: Arc<T>,
    pub path_params: ParamVec,
}

impl<T> RouteMatch<T> {
    /// Last write wins when the same name appears at several depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Errors raised while building the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The `(method, shape)` pair is already bound.
    Duplicate { method: Method, pattern: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Duplicate { method, pattern } => {
                write!(f, "duplicate route: {method} {pattern}")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Method-aware radix router.
///
/// Built once at startup, then only read. Empty segments are ignored on both
/// insert and lookup, so `/v1/group/` and `/v1/group` resolve identically.
pub struct Router<T> {
    root: RadixNode<T>,
    shapes: HashSet<(Method, String)>,
    bindings: Vec<(Method, String)>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::root(),
            shapes: HashSet::new(),
            bindings: Vec::new(),
        }
    }

    /// Bind `route` to `method pattern`.
    ///
    /// # Errors
    ///
    /// [`RouteError::Duplicate`] when the same method is already bound to a
    /// pattern of the same shape (placeholder names do not matter).
    pub fn insert(&mut self, method: Method, pattern: &str, route: T) -> Result<(), RouteError> {
        let key = (method.clone(), shape(pattern));
        if self.shapes.contains(&key) {
            return Err(RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
            });
        }
        if !self
            .root
            .insert(&segments(pattern), method.clone(), Arc::new(route))
        {
            return Err(RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
            });
        }
        debug!(method = %method, pattern = %pattern, "Route bound");
        self.shapes.insert(key);
        self.bindings.push((method, pattern.to_string()));
        Ok(())
    }

    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<T>> {
        let mut params = ParamVec::new();
        let route = self.root.search(&segments(path), method, &mut params)?;
        Some(RouteMatch {
            route,
            path_params: params,
        })
    }

    /// Whether any method is bound for `path` (distinguishes 405 from 404).
    #[must_use]
    pub fn allows_path(&self, path: &str) -> bool {
        self.root.has_any_method(&segments(path))
    }

    /// `(method, pattern)` pairs in binding order.
    #[must_use]
    pub fn bindings(&self) -> &[(Method, String)] {
        &self.bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn log_summary(&self) {
        let summary: Vec<String> = self
            .bindings
            .iter()
            .take(10)
            .map(|(m, p)| format!("{m} {p}"))
            .collect();
        info!(
            routes_count = self.bindings.len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
    }
}
