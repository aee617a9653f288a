use anyhow::anyhow;
use http::Method;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use super::handler::{respond_with_error, ErrorAdapter};
use crate::error::ApiError;
use crate::registry::{AnyExpansion, Endpoint, Registry, Verb};
use crate::router::{RouteError, Router};
use crate::server::{RequestContext, ResponseWriter};

/// A concrete `(method, path)` binding.
pub struct BoundRoute {
    pub endpoint: Arc<Endpoint>,
    pub method: Verb,
    adapter: ErrorAdapter,
}

/// Failure while compiling the registry onto the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    Route(RouteError),
    /// `bind` was called before [`Registry::validate`] passed.
    NotValidated,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Route(e) => write!(f, "binding routes failed: {e}"),
            DispatchError::NotValidated => {
                write!(f, "registry must be validated before binding")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Route(e) => Some(e),
            DispatchError::NotValidated => None,
        }
    }
}

impl From<RouteError> for DispatchError {
    fn from(e: RouteError) -> Self {
        DispatchError::Route(e)
    }
}

/// Outcome of [`Dispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran and the response is recorded
    Handled,
    /// No route for the path
    NotFound,
    /// The path exists under other methods
    MethodNotAllowed,
}

/// Compiles the registry onto the router and runs matched handlers.
pub struct Dispatcher {
    any: AnyExpansion,
    router: Router<BoundRoute>,
    endpoints: Vec<Arc<Endpoint>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(AnyExpansion::default())
    }
}

fn strip_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(any: AnyExpansion) -> Self {
        Self {
            any,
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    /// Bind every registered endpoint, in registration order, then freeze the
    /// registry.
    ///
    /// `Any` is replaced in the stored descriptors by the concrete methods it
    /// stands for, so documentation shows what is actually bound.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotValidated`] unless [`Registry::validate`] passed
    /// after the last registration; [`DispatchError::Route`] on a duplicate
    /// `(method, path)`, which is also what a second `bind` call produces.
    pub fn bind(&mut self, registry: &mut Registry) -> Result<(), DispatchError> {
        if !registry.is_validated() {
            return Err(DispatchError::NotValidated);
        }
        for endpoint in registry.endpoints_mut() {
            endpoint.methods = self.any.resolve(&endpoint.methods);
            let shared = Arc::new(endpoint.clone());
            let path = strip_trailing_slash(endpoint.full_path());
            for verb in &endpoint.methods {
                let Some(method) = verb.to_http() else {
                    continue;
                };
                self.router.insert(
                    method,
                    path,
                    BoundRoute {
                        endpoint: Arc::clone(&shared),
                        method: *verb,
                        adapter: ErrorAdapter::new(endpoint.handler()),
                    },
                )?;
            }
            self.endpoints.push(shared);
        }
        registry.freeze();
        self.router.log_summary();
        Ok(())
    }

    /// Route the request and run the matched handler.
    ///
    /// A panicking handler is turned into a 500 [`ApiError`] resolved through
    /// the same path as a returned error.
    pub fn dispatch(&self, ctx: &mut RequestContext, res: &mut ResponseWriter) -> Dispatch {
        let Some(matched) = self.router.route(ctx.method(), ctx.path()) else {
            return if self.router.allows_path(ctx.path()) {
                Dispatch::MethodNotAllowed
            } else {
                Dispatch::NotFound
            };
        };
        let route = matched.route;
        ctx.set_path_params(matched.path_params);

        debug!(
            request_id = %ctx.request_id(),
            endpoint = %route.endpoint.name,
            method = %route.method,
            full_path = %route.endpoint.full_path(),
            "Handler execution start"
        );
        let started = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| route.adapter.call(ctx, res)));
        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            error!(
                request_id = %ctx.request_id(),
                endpoint = %route.endpoint.name,
                panic_message = %message,
                "Handler panicked"
            );
            *res = ResponseWriter::new();
            let api = ApiError::new(
                "handler panicked",
                format!(
                    "an error has occurred, please see request id: {}",
                    ctx.request_id()
                ),
                500,
                Some(anyhow!(message)),
            );
            respond_with_error(ctx, res, api);
        }

        debug!(
            request_id = %ctx.request_id(),
            status = res.status(),
            execution_time_us = started.elapsed().as_micros() as u64,
            "Handler execution complete"
        );
        Dispatch::Handled
    }

    /// Bound descriptor by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.iter().find(|e| e.name == name).cloned()
    }

    /// `(method, path)` pairs in binding order.
    #[must_use]
    pub fn routes(&self) -> &[(Method, String)] {
        self.router.bindings()
    }

    #[must_use]
    pub fn any_expansion(&self) -> &AnyExpansion {
        &self.any
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}
