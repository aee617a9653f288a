use std::time::Duration;

use tracing::{field, info, info_span};

use super::Middleware;
use crate::server::{RequestContext, ResponseWriter};

/// Opens a `request` span per request; the service enters it around dispatch.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, ctx: &mut RequestContext, _res: &mut ResponseWriter) {
        let span = info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            status = field::Empty,
            latency_ms = field::Empty
        );
        ctx.set_span(span);
    }

    fn after(&self, ctx: &mut RequestContext, res: &ResponseWriter, latency: Duration) {
        if let Some(span) = ctx.span() {
            let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
            span.record("status", res.status());
            span.record("latency_ms", latency_ms);
            span.in_scope(|| info!(status = res.status(), latency_ms, "Request complete"));
        }
    }
}
