//! Response writer and the finished outgoing [`Response`].
//!
//! Controllers never build a response value. They write through the
//! [`Context`](crate::Context), which buffers into a [`ResponseWriter`]; the
//! dispatcher turns the writer into a [`Response`] once the pipeline ends.

use std::path::Path;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for [`Context::bytes`](crate::Context::bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Css,          // text/css; charset=utf-8
    Gif,          // image/gif
    Html,         // text/html; charset=utf-8
    Icon,         // image/x-icon
    Javascript,   // text/javascript; charset=utf-8
    Jpeg,         // image/jpeg
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Wasm,         // application/wasm
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css         => "text/css; charset=utf-8",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html; charset=utf-8",
            Self::Icon        => "image/x-icon",
            Self::Javascript  => "text/javascript; charset=utf-8",
            Self::Jpeg        => "image/jpeg",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Wasm        => "application/wasm",
            Self::Xml         => "application/xml",
        }
    }

    /// Guesses from the file extension; unknown extensions are binary.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("css")           => Self::Css,
            Some("gif")           => Self::Gif,
            Some("htm" | "html")  => Self::Html,
            Some("ico")           => Self::Icon,
            Some("js" | "mjs")    => Self::Javascript,
            Some("jpg" | "jpeg")  => Self::Jpeg,
            Some("json")          => Self::Json,
            Some("pdf")           => Self::Pdf,
            Some("png")           => Self::Png,
            Some("svg")           => Self::Svg,
            Some("txt")           => Self::Text,
            Some("wasm")          => Self::Wasm,
            Some("xml")           => Self::Xml,
            _                     => Self::OctetStream,
        }
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// Buffered response state for one request.
///
/// The first body write marks the writer as flushed: the response has begun
/// and the rest of the controller chain is skipped.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    flushed: bool,
}

impl ResponseWriter {
    pub(crate) fn new() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: Vec::new(), flushed: false }
    }

    pub fn has_flushed(&self) -> bool {
        self.flushed
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub(crate) fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub(crate) fn set_content_type(&mut self, content_type: ContentType) {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
        self.flushed = true;
    }

    /// Drops anything written so far. Used before an error page replaces a
    /// partially written response.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn into_response(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Bytes::from(self.body) }
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A finished outgoing HTTP response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Response with no body.
    pub fn status_only(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Lossy UTF-8 view of the body, mostly for tests and logs.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}
