//! Per-request context.
//!
//! One [`Context`] is created for every inbound request and dropped into that
//! request's injection scope, so any controller that declares a `Context`
//! parameter receives it. Cloning yields another handle to the *same*
//! request state: a status set by one controller is seen by the next.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{HeaderName, HeaderValue, StatusCode};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::request::Request;
use crate::response::{ContentType, Response, ResponseWriter};

type DataMap = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// The request-scoped state every controller in a chain shares.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    request: Request,
    writer: Mutex<ResponseWriter>,
    data: Mutex<DataMap>,
    params: RwLock<HashMap<String, String>>,
    started: Instant,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        Self {
            inner: Arc::new(Inner {
                request,
                writer: Mutex::new(ResponseWriter::new()),
                data: Mutex::new(HashMap::new()),
                params: RwLock::new(HashMap::new()),
                started: Instant::now(),
            }),
        }
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    // ── Path parameters ──────────────────────────────────────────────────────

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<String> {
        self.inner.params.read().get(key).cloned()
    }

    pub fn params(&self) -> HashMap<String, String> {
        self.inner.params.read().clone()
    }

    /// Installed once by the dispatcher before the chain runs.
    pub(crate) fn set_uri_params(&self, params: HashMap<String, String>) {
        *self.inner.params.write() = params;
    }

    // ── Inter-middleware data ────────────────────────────────────────────────

    /// Stores an arbitrary value under `key`, replacing any previous one.
    pub fn set_data<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.inner.data.lock().insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if it exists and is a `T`.
    pub fn data<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.inner.data.lock().get(key)?.downcast_ref::<T>().cloned()
    }

    pub fn remove_data(&self, key: &str) -> bool {
        self.inner.data.lock().remove(key).is_some()
    }

    // ── Response ─────────────────────────────────────────────────────────────

    /// Sets the response status. Later calls overwrite earlier ones.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.writer.lock().set_status(status);
    }

    pub fn status(&self) -> StatusCode {
        self.inner.writer.lock().status()
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.writer.lock().insert_header(name, value);
    }

    /// Locks the response writer. Do not hold the guard across a call that
    /// writes through this context.
    pub fn response_writer(&self) -> MutexGuard<'_, ResponseWriter> {
        self.inner.writer.lock()
    }

    pub fn has_flushed(&self) -> bool {
        self.inner.writer.lock().has_flushed()
    }

    /// Appends raw bytes to the body without touching the content type.
    pub fn write(&self, body: impl AsRef<[u8]>) {
        self.inner.writer.lock().write(body.as_ref());
    }

    pub fn bytes(&self, content_type: ContentType, body: impl AsRef<[u8]>) {
        let mut writer = self.inner.writer.lock();
        writer.set_content_type(content_type);
        writer.write(body.as_ref());
    }

    pub fn text(&self, body: impl AsRef<str>) {
        self.bytes(ContentType::Text, body.as_ref());
    }

    pub fn html(&self, body: impl AsRef<str>) {
        self.bytes(ContentType::Html, body.as_ref());
    }

    /// Pass bytes straight from your serializer: `serde_json::to_vec(&v)?`.
    pub fn json(&self, body: impl AsRef<[u8]>) {
        self.bytes(ContentType::Json, body);
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub(crate) fn reset_response(&self) {
        self.inner.writer.lock().reset();
    }

    /// Takes the buffered response. Other handles still alive (a controller
    /// that stashed a clone) see a fresh writer afterwards.
    pub(crate) fn finish(&self) -> Response {
        std::mem::replace(&mut *self.inner.writer.lock(), ResponseWriter::new()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    fn ctx() -> Context {
        Context::new(Request::new(Method::GET, "/users/42".parse().unwrap()))
    }

    #[test]
    fn defaults_to_200_and_unflushed() {
        let ctx = ctx();
        assert_eq!(ctx.status(), StatusCode::OK);
        assert!(!ctx.has_flushed());
    }

    #[test]
    fn clones_share_state() {
        let a = ctx();
        let b = a.clone();
        b.set_status(StatusCode::ACCEPTED);
        b.set_data("user", 7u64);
        b.text("done");

        assert_eq!(a.status(), StatusCode::ACCEPTED);
        assert_eq!(a.data::<u64>("user"), Some(7));
        assert!(a.response_writer().has_flushed());
    }

    #[test]
    fn data_is_typed() {
        let ctx = ctx();
        ctx.set_data("name", String::from("ela"));
        assert_eq!(ctx.data::<String>("name").as_deref(), Some("ela"));
        assert_eq!(ctx.data::<u32>("name"), None);
        assert!(ctx.remove_data("name"));
        assert_eq!(ctx.data::<String>("name"), None);
    }

    #[test]
    fn uri_params_are_readable() {
        let ctx = ctx();
        ctx.set_uri_params(HashMap::from([("id".to_owned(), "42".to_owned())]));
        assert_eq!(ctx.param("id").as_deref(), Some("42"));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn finish_hands_over_the_buffer() {
        let ctx = ctx();
        ctx.set_status(StatusCode::CREATED);
        ctx.json(br#"{"id":1}"#);

        let res = ctx.finish();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.text(), r#"{"id":1}"#);
    }
}
