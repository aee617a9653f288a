use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::{debug, warn, Span};

use super::context::RequestContext;
use super::request::{parse_request, ParsedRequest};
use super::response::ResponseWriter;
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::Middleware;

/// The per-request pipeline served by `may_minihttp`.
///
/// Cloned once per connection; everything shared is behind an `Arc` and only
/// read after startup.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl AppService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Append a middleware; `before` hooks run in the order added.
    #[must_use]
    pub fn with_middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        Arc::make_mut(&mut self.middlewares).push(mw);
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run one request through middleware and dispatch, returning the
    /// recorded response. Nothing is written to a socket here.
    pub fn handle(&self, req: ParsedRequest) -> ResponseWriter {
        let request_id =
            RequestId::from_header_or_new(req.headers.get(REQUEST_ID_HEADER).map(String::as_str));
        let mut res = ResponseWriter::new();

        let method = match Method::from_bytes(req.method.as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                warn!(request_id = %request_id, method = %req.method, "Invalid request method");
                res.write_header(400);
                return res;
            }
        };
        let mut ctx = RequestContext::new(req, method, request_id);

        for mw in self.middlewares.iter() {
            mw.before(&mut ctx, &mut res);
        }

        if res.is_written() {
            debug!(request_id = %request_id, status = res.status(), "Middleware answered the request");
        } else {
            let span = ctx.span().cloned().unwrap_or_else(Span::none);
            let outcome = span.in_scope(|| self.dispatcher.dispatch(&mut ctx, &mut res));
            match outcome {
                Dispatch::Handled => {}
                Dispatch::NotFound => {
                    ctx.skip_logging();
                    res.write_header(404);
                }
                Dispatch::MethodNotAllowed => {
                    ctx.skip_logging();
                    res.write_header(405);
                }
            }
        }

        let latency = ctx.started().elapsed();
        for mw in self.middlewares.iter().rev() {
            mw.after(&mut ctx, &res, latency);
        }
        res
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        self.handle(parse_request(req)).flush_into(res);
        Ok(())
    }
}
