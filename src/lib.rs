//! # brrtapi
//!
//! **brrtapi** is a REST API scaffold on the `may` coroutine runtime: a typed
//! endpoint registry, a method-dispatch router, structured per-request logging
//! and API documentation generated from the same endpoint descriptors.
//!
//! ## Architecture
//!
//! - **[`registry`]** - endpoint descriptors, validation, `Any` expansion
//! - **[`router`]** - radix-tree path matching per HTTP method
//! - **[`dispatcher`]** - binds the registry and runs handlers behind the error adapter
//! - **[`error`]** - the two-part error value handlers return
//! - **[`server`]** - `may_minihttp` service, request context and response writer
//! - **[`middleware`]** - request logger and tracing spans
//! - **[`request_log`]** - the per-request log record and its sink
//! - **[`docs`]** - OpenAPI and Markdown generation, reserved `/docs` routes
//! - **[`routes`]** - the example endpoints shipped with the scaffold
//! - **[`config`]**, **[`otel`]**, **[`cli`]** - configuration, diagnostics, binary wiring
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Logger as RequestLogger
//!     participant Dispatcher
//!     participant Adapter as ErrorAdapter
//!     participant Handler
//!
//!     Client->>Server: HTTP request
//!     Server->>Server: parse, assign request id
//!     Server->>Logger: before (START, BODY_CAPTURED)
//!     Server->>Dispatcher: route(method, path)
//!     alt no path
//!         Dispatcher-->>Client: 404 (not logged)
//!     else no method
//!         Dispatcher-->>Client: 405 (not logged)
//!     end
//!     Dispatcher->>Adapter: call
//!     Adapter->>Handler: handle(ctx, res)
//!     alt Err(ApiError)
//!         Adapter->>Adapter: write envelope, attach internal detail
//!     end
//!     Server->>Logger: after (FINALIZED, one record written)
//!     Server-->>Client: response
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use brrtapi::cli::App;
//! use brrtapi::config::AppConfig;
//!
//! let app = App::build(AppConfig::default())?;
//! let handle = app.start()?;
//! handle.join().ok();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Runtime Considerations
//!
//! brrtapi uses the `may` coroutine runtime, not tokio. Every connection is
//! served in its own coroutine and the request pipeline runs inline in it.
//! The coroutine stack size comes from `stack_size` in the configuration.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod docs;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod otel;
pub mod registry;
pub mod request_log;
pub mod router;
pub mod routes;
pub mod server;
pub mod static_files;
pub mod version;

pub use dispatcher::{Dispatcher, Handler, HandlerResult};
pub use error::ApiError;
pub use registry::{Endpoint, Param, Registry, Verb};
pub use server::{RequestContext, ResponseWriter};
