//! # Server Module
//!
//! The HTTP host. [`AppService`] is the per-request pipeline:
//!
//! 1. parse the raw request (body drained once into memory)
//! 2. take the request id from `x-request-id` or mint one
//! 3. run middleware `before` hooks in order
//! 4. route and dispatch unless a middleware already answered
//! 5. run middleware `after` hooks in reverse order
//! 6. flush the recorded response to the socket
//!
//! Unmatched paths get `404` and matched paths with an unbound method get
//! `405`, both with empty bodies and without a request log record.

mod context;
mod http_server;
mod request;
mod response;
mod service;

pub use context::RequestContext;
pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, parse_request, ParsedRequest};
pub use response::{ResponseWriter, CONTENT_TEXT};
pub use service::AppService;
