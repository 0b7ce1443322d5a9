//! The request/response exchange handed to middleware and handlers.
//!
//! An [`Exchange`] pairs a fully received request with the response being
//! built for it. The response follows the usual HTTP writer rules: the
//! status may change freely until the first body write commits it.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::Full;
use serde::Serialize;

/// One inbound request and the response being written for it.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use switchyard_core::Exchange;
///
/// let request = Request::get("/items/7").body(Bytes::new()).unwrap();
/// let mut exchange = Exchange::new(request);
///
/// exchange.write_header(StatusCode::CREATED);
/// exchange.write(b"made it");
///
/// let response = exchange.into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct Exchange {
    request: Request<Bytes>,
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
    body_closed: bool,
}

impl Exchange {
    /// Wraps a request whose body has already been collected.
    #[must_use]
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            committed: false,
            body_closed: false,
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// The full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// The request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// The underlying request.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Sets the response status.
    ///
    /// Has no effect once the response is committed; the first status that
    /// reached the client stays.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            tracing::debug!(
                current = self.status.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_header call"
            );
            return;
        }
        self.status = status;
    }

    /// The response status as it stands.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers written so far.
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends to the response body, committing the status.
    ///
    /// Returns the number of bytes written.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> usize {
        let data = data.as_ref();
        self.committed = true;
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Serializes `value` as the response body with a JSON content type.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; nothing is written in that case.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_vec(value)?;
        if !self.committed {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        self.write(encoded);
        Ok(())
    }

    /// Returns true once a body write has committed the status.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Bytes written to the response body so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.body
    }

    /// Marks the request body as consumed.
    pub fn close_body(&mut self) {
        self.body_closed = true;
    }

    /// Returns true if [`Exchange::close_body`] has been called.
    #[must_use]
    pub fn is_body_closed(&self) -> bool {
        self.body_closed
    }

    /// Finishes the exchange, producing the response to send.
    #[must_use]
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(method: Method, uri: &str) -> Exchange {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        Exchange::new(request)
    }

    #[test]
    fn test_request_accessors() {
        let ex = exchange(Method::POST, "/items/7?verbose=1");

        assert_eq!(ex.method(), Method::POST);
        assert_eq!(ex.path(), "/items/7");
        assert_eq!(ex.uri().query(), Some("verbose=1"));
        assert_eq!(ex.body().as_ref(), b"payload");
    }

    #[test]
    fn test_default_status_is_ok() {
        let mut ex = exchange(Method::GET, "/");
        ex.write("hello");

        let response = ex.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_status_locked_after_first_write() {
        let mut ex = exchange(Method::GET, "/");
        ex.write_header(StatusCode::ACCEPTED);
        ex.write_header(StatusCode::CREATED);
        assert_eq!(ex.write("a"), 1);
        ex.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        ex.write("b");

        assert!(ex.is_committed());
        assert_eq!(ex.status(), StatusCode::CREATED);
        assert_eq!(ex.written(), b"ab");
    }

    #[test]
    fn test_write_json_sets_content_type() {
        let mut ex = exchange(Method::GET, "/");
        ex.write_json(&serde_json::json!({"id": 7})).unwrap();

        let response = ex.into_response();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_response_headers_carried_into_response() {
        let mut ex = exchange(Method::GET, "/");
        ex.response_headers_mut()
            .insert("x-custom", HeaderValue::from_static("yes"));

        let response = ex.into_response();
        assert_eq!(response.headers().get("x-custom").unwrap(), "yes");
    }

    #[test]
    fn test_close_body() {
        let mut ex = exchange(Method::GET, "/");
        assert!(!ex.is_body_closed());
        ex.close_body();
        assert!(ex.is_body_closed());
    }
}
