//! # Dispatcher Module
//!
//! Turns a validated [`Registry`](crate::registry::Registry) into live route
//! bindings and runs the matched handler for each request.
//!
//! ## Binding
//!
//! [`Dispatcher::bind`] refuses a registry that has not passed
//! [`Registry::validate`](crate::registry::Registry::validate), then walks it
//! in registration order:
//!
//! - `Any` is expanded in place into concrete methods (by default every
//!   standard method except `HEAD` and `DELETE`)
//! - a trailing slash on the full path is dropped, the root `/` excepted
//! - each concrete method is bound separately to the same handler
//! - the registry is frozen afterwards
//!
//! ## Error propagation
//!
//! Handlers return [`HandlerResult`]. Every bound handler is wrapped in an
//! [`ErrorAdapter`]: on `Err` it writes the error envelope (unless the handler
//! already wrote a response) and attaches the internal detail to the request
//! log record. Handler panics are caught and resolved the same way with a 500.
//!
//! ```rust
//! use brrtapi::dispatcher::{Dispatcher, HandlerResult};
//! use brrtapi::error::ApiError;
//! use brrtapi::registry::{Endpoint, Registry};
//! use brrtapi::server::{RequestContext, ResponseWriter};
//!
//! fn fail(_: &mut RequestContext, _: &mut ResponseWriter) -> HandlerResult {
//!     Err(ApiError::new("internal error message", "response body error message", 400, None).into())
//! }
//!
//! let mut registry = Registry::default();
//! registry.register([Endpoint::new("/error", fail).name("error")]).unwrap();
//! registry.validate().unwrap();
//! let mut dispatcher = Dispatcher::default();
//! dispatcher.bind(&mut registry).unwrap();
//! assert!(registry.is_frozen());
//! assert!(dispatcher.lookup("error").is_some());
//! ```

mod core;
mod handler;
#[cfg(test)]
mod tests;

pub use core::{BoundRoute, Dispatch, DispatchError, Dispatcher};
pub use handler::{respond_with_error, ErrorAdapter, Handler, HandlerResult};
