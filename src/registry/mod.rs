//! # Endpoint Registry
//!
//! Path templates use whole-segment placeholders: `{name}` matches one
//! segment and `{*name}`, allowed only last, captures the rest of the path.
//!
//! Endpoints are declared once, with everything needed to route them and to
//! document them. The registry is filled at startup by the route modules,
//! validated, then bound by the [`Dispatcher`](crate::dispatcher::Dispatcher)
//! which freezes it.
//!
//! ```rust
//! use brrtapi::dispatcher::HandlerResult;
//! use brrtapi::registry::{Endpoint, Param, Registry, Verb};
//! use brrtapi::server::{RequestContext, ResponseWriter};
//!
//! fn echo(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
//!     res.text(200, ctx.path_param("word").unwrap_or_default());
//!     Ok(())
//! }
//!
//! let mut registry = Registry::default();
//! registry
//!     .register([Endpoint::new("/echo/{word}", echo)
//!         .name("echo")
//!         .version("v1")
//!         .group("test")
//!         .methods([Verb::Get])
//!         .path_param(Param::new("word", "word to echo"))])
//!     .unwrap();
//! registry.validate().unwrap();
//! assert_eq!(registry.get("echo").unwrap().full_path(), "/v1/test/echo/{word}");
//! ```

mod core;
mod endpoint;
mod method;
#[cfg(test)]
mod tests;

pub use core::{Registry, RegistryError};
pub use endpoint::{
    check_placeholder_segments, clean_path, count_path_params, BraceError, Endpoint, Param,
    SegmentError, CONTENT_JSON,
};
pub use method::{AnyExpansion, UnknownVerb, Verb};
