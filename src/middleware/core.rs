use std::time::Duration;

use crate::server::{RequestContext, ResponseWriter};

/// Hooks run around dispatch.
///
/// `before` runs in registration order and may short-circuit the request by
/// writing a response. `after` runs in reverse order once the response is
/// recorded, with the time spent since the pipeline started.
pub trait Middleware: Send + Sync {
    fn before(&self, _ctx: &mut RequestContext, _res: &mut ResponseWriter) {}
    fn after(&self, _ctx: &mut RequestContext, _res: &ResponseWriter, _latency: Duration) {}
}
