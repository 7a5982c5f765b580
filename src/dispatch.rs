//! The per-request pipeline.
//!
//! ```text
//! Init ─► special static ─► alias static ─► route ─► before ─► chain ─► after ─► Done
//!             │                  │            │        └──── panic / Err ────┐
//!             └── static or 404 ─┴── static or 404 (no controller)          ▼
//!                                                                         500
//! ```
//!
//! Everything here is synchronous. The server runs each request on its own
//! blocking task, so a slow controller holds up only its own request, and a
//! panic is caught at [`App::handle`]'s boundary before it can reach another.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use http::StatusCode;
use tracing::{debug, error, warn};

use crate::app::App;
use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedController, ErasedController};
use crate::middleware::Scope;
use crate::request::Request;
use crate::response::Response;
use crate::router::Resolution;

/// Body of every 404 the pipeline produces.
pub const NOT_FOUND_BODY: &str = "<h2>404, File Not Exist</h2>";

thread_local! {
    /// Set while this thread runs a guarded chain.
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    /// Stack captured at the panic site of the last guarded panic.
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static TRACE_HOOK: OnceLock<()> = OnceLock::new();

/// Wraps the current panic hook so that a panic inside a guarded chain
/// records its own stack before unwinding starts.
fn install_trace_hook() {
    TRACE_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED.get() {
                let trace = Backtrace::force_capture().to_string();
                PANIC_TRACE.with_borrow_mut(|slot| *slot = Some(trace));
            }
            previous(info);
        }));
    });
}

/// Runs `f` with panic-site tracing on for this thread.
fn guarded<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    PANIC_TRACE.with_borrow_mut(|slot| *slot = None);
    let was = GUARDED.replace(true);
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    GUARDED.set(was);
    outcome
}

impl App {
    /// Runs one request through the pipeline and returns its response.
    ///
    /// Never panics on behalf of a controller: faults come back as `500`.
    pub fn handle(&self, request: Request) -> Response {
        install_trace_hook();
        let ctx = Context::new(request);
        // snapshot + this request's context; nothing is added to the registry
        let scope = self.registry.snapshot().with(ctx.clone());

        self.logger.log_request(&ctx);
        self.route(&ctx, &scope);
        self.logger.log_response(&ctx);

        ctx.finish()
    }

    fn route(&self, ctx: &Context, scope: &Scope) {
        let path = ctx.request().path();

        if self.special_static.iter().any(|special| special == path) {
            self.serve_static(path, ctx);
            return;
        }

        if let Some(file) = self.alias_target(path) {
            self.serve_static(file, ctx);
            return;
        }

        self.serve_controller(path, ctx, scope);
    }

    /// What is left of `path` once the alias prefix is stripped, to be
    /// looked up below the static directory.
    fn alias_target<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.static_alias.as_deref()?)
    }

    fn serve_controller(&self, path: &str, ctx: &Context, scope: &Scope) {
        let resolution = match self.router.resolve(path) {
            Some(resolution) if !resolution.chain.is_empty() => resolution,
            _ => {
                self.serve_static(path, ctx);
                return;
            }
        };

        ctx.set_uri_params(resolution.params.clone());

        let (message, trace) = match guarded(|| self.run_chain(&resolution, ctx, scope)) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => (e.to_string(), Backtrace::force_capture().to_string()),
            Err(payload) => {
                let trace = PANIC_TRACE
                    .with_borrow_mut(Option::take)
                    .unwrap_or_else(|| Backtrace::force_capture().to_string());
                (panic_message(&*payload), trace)
            }
        };
        serve_fault(ctx, &message, &trace);
    }

    fn run_chain(&self, resolution: &Resolution, ctx: &Context, scope: &Scope) -> Result<(), Error> {
        if resolution.with_hooks {
            run_hook("before", self.before.as_ref(), scope);
        }

        for (index, controller) in resolution.chain.iter().enumerate() {
            if ctx.has_flushed() {
                debug!(skipped = resolution.chain.len() - index, "response flushed, chain cut short");
                break;
            }
            controller.call(scope)?;
        }

        if resolution.with_hooks {
            run_hook("after", self.after.as_ref(), scope);
        }
        Ok(())
    }

    fn serve_static(&self, path: &str, ctx: &Context) {
        if !self.statics.exists(path) {
            serve_error(ctx, NOT_FOUND_BODY, StatusCode::NOT_FOUND);
            return;
        }
        if let Err(e) = self.statics.serve(path, ctx) {
            warn!(path, error = %e, "static file could not be served");
            ctx.reset_response();
            serve_error(ctx, NOT_FOUND_BODY, StatusCode::NOT_FOUND);
        }
    }
}

/// Hook failures are logged; the request carries on.
fn run_hook(phase: &'static str, hook: Option<&BoxedController>, scope: &Scope) {
    let Some(hook) = hook else { return };
    if let Err(e) = hook.call(scope) {
        warn!(phase, hook = hook.name(), error = %e, "hook failed");
    }
}

fn serve_error(ctx: &Context, body: &str, status: StatusCode) {
    ctx.set_status(status);
    ctx.html(body);
}

/// Replaces whatever the chain wrote with a 500 page carrying `message` and
/// the call stack.
fn serve_fault(ctx: &Context, message: &str, trace: &str) {
    error!(path = ctx.request().path(), "{message}");
    warn!("{trace}");

    let body = format!("<h2>500 Server Internal Error!</h2>\n\n{message}\n\n<pre>{trace}</pre>");
    ctx.reset_response();
    serve_error(ctx, &body, StatusCode::INTERNAL_SERVER_ERROR);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_owned()
    }
}
