//! Request/response logging hooks.
//!
//! The dispatcher calls [`RequestLogger::log_request`] when a request enters
//! the pipeline and [`RequestLogger::log_response`] exactly once on the way
//! out, whichever branch produced the response.

use tracing::info;

use crate::context::Context;

pub trait RequestLogger: Send + Sync + 'static {
    fn log_request(&self, ctx: &Context);
    fn log_response(&self, ctx: &Context);
}

/// Default logger: one `info` event per request and per response.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_request(&self, ctx: &Context) {
        let req = ctx.request();
        info!(method = %req.method(), path = %req.path(), "request");
    }

    fn log_response(&self, ctx: &Context) {
        let req = ctx.request();
        info!(
            method = %req.method(),
            path = %req.path(),
            status = ctx.status().as_u16(),
            elapsed_us = ctx.elapsed().as_micros() as u64,
            "response"
        );
    }
}
