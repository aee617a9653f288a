mod core;
mod request_logger;
mod tracing;

pub use core::Middleware;
pub use request_logger::RequestLogger;
pub use tracing::TracingMiddleware;
