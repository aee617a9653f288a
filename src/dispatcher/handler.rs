use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ApiError, CONTENT_JSON};
use crate::server::{RequestContext, ResponseWriter};

/// What a handler returns: `Ok` once it has written its response, `Err` with
/// nothing written. An [`ApiError`] inside the `anyhow::Error` picks the status
/// and message; anything else becomes a generic 500.
pub type HandlerResult = anyhow::Result<()>;

/// Executable logic of one endpoint.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext, &mut ResponseWriter) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
        self(ctx, res)
    }
}

/// Wraps every bound handler and turns a returned error into exactly one
/// response plus one log attachment.
#[derive(Clone)]
pub struct ErrorAdapter {
    inner: Arc<dyn Handler>,
}

impl ErrorAdapter {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }

    pub fn call(&self, ctx: &mut RequestContext, res: &mut ResponseWriter) {
        if let Err(err) = self.inner.handle(ctx, res) {
            let api = ApiError::from_handler(err, ctx.request_id());
            respond_with_error(ctx, res, api);
        }
    }
}

/// Write the user-facing half of `api` and attach the internal half to the
/// request log record.
///
/// A response the handler already wrote is kept; the error is still logged.
pub fn respond_with_error(ctx: &mut RequestContext, res: &mut ResponseWriter, api: ApiError) {
    let code = api.code();
    let body = api.response_bytes();
    let (internal, _) = api.into_parts();

    if res.is_written() {
        warn!(
            request_id = %ctx.request_id(),
            written_status = res.status(),
            error_status = code,
            internal = %internal.message,
            "Handler returned an error after writing a response; keeping the written response"
        );
    } else {
        res.send(code, CONTENT_JSON, &body);
    }

    debug!(
        request_id = %ctx.request_id(),
        status = code,
        internal = %internal.message,
        error_text = ?internal.error_text,
        "Handler error resolved"
    );
    ctx.attach_error(internal);
}
