//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// An incoming HTTP request with its body fully collected.
///
/// Read-only once the pipeline has started; controllers reach it through
/// [`Context::request`](crate::Context::request).
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self { method: parts.method, uri: parts.uri, headers: parts.headers, body }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn path_excludes_query() {
        let req = Request::new(Method::GET, "/search?q=rust".parse().unwrap());
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query(), Some("q=rust"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::POST, "/".parse().unwrap())
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body("hi");
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.body(), b"hi");
    }
}
