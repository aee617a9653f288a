use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::Middleware;
use crate::request_log::{body_field, LogRecord, LogSink};
use crate::server::{RequestContext, ResponseWriter};

/// Writes one [`LogRecord`] per request to a [`LogSink`].
///
/// `before` allocates the record and captures the body (the handler later
/// reads the same bytes from the context). `after` finalizes latency and
/// status and writes the record unless the handler called
/// [`RequestContext::skip_logging`].
pub struct RequestLogger {
    sink: Arc<LogSink>,
}

impl RequestLogger {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<LogSink> {
        &self.sink
    }
}

fn content_length(ctx: &RequestContext) -> Option<u64> {
    let declared = ctx
        .header("content-length")
        .and_then(|v| v.trim().parse::<u64>().ok());
    match declared {
        Some(n) if n > 0 => Some(n),
        _ => u64::try_from(ctx.body().len()).ok().filter(|n| *n > 0),
    }
}

impl Middleware for RequestLogger {
    fn before(&self, ctx: &mut RequestContext, _res: &mut ResponseWriter) {
        let mut rec = LogRecord::new(ctx.request_id());
        rec.host = ctx.host().to_string();
        rec.request_uri = ctx.uri().to_string();
        rec.method = ctx.method().to_string();
        rec.remote_address = ctx.remote_addr().to_string();
        rec.user_agent = ctx.header("user-agent").unwrap_or_default().to_string();
        rec.content_type = ctx.header("content-type").unwrap_or_default().to_string();
        rec.content_length = content_length(ctx);
        rec.request_body = body_field(ctx.body(), ctx.body_error());
        ctx.set_log(rec);
    }

    fn after(&self, ctx: &mut RequestContext, res: &ResponseWriter, latency: Duration) {
        let Some(mut rec) = ctx.take_log() else {
            return;
        };
        if rec.no_log {
            debug!(request_id = %rec.id, uri = %rec.request_uri, "Request log skipped");
            return;
        }
        rec.finalize(latency.as_secs_f64(), res.status());
        self.sink.write(&rec);
    }
}
