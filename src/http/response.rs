//! HTTP response building module
//!
//! [`ResponseWriter`] collects a status and headers and is consumed when the
//! body is attached, so headers can never change once the body is sent.
//! The `build_*` helpers cover the fixed responses.

use super::body::ResponseBody;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Response, StatusCode};

/// Methods the server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Single-use response builder
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    is_head: bool,
}

impl ResponseWriter {
    /// Writer for a request; HEAD requests keep headers but drop the body
    pub fn new(is_head: bool) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            is_head,
        }
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous value
    ///
    /// Values that are not valid header text are dropped and logged.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: impl TryInto<HeaderValue>) -> Self {
        match value.try_into() {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => crate::logger::log_warning(&format!("Dropping invalid value for header {name}")),
        }
        self
    }

    /// Attach the body and finish the response
    pub fn send(self, body: ResponseBody) -> Response<ResponseBody> {
        let body = if self.is_head {
            ResponseBody::empty()
        } else {
            body
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Attach an in-memory body, setting `Content-Length`
    pub fn send_bytes(self, data: impl Into<Bytes>) -> Response<ResponseBody> {
        let data = data.into();
        self.header(header::CONTENT_LENGTH, data.len())
            .send(ResponseBody::from_bytes(data))
    }

    /// Finish without a body
    pub fn send_empty(self) -> Response<ResponseBody> {
        self.send(ResponseBody::empty())
    }
}

/// Build a plain-text error page for `status`
pub fn build_error_response(status: StatusCode, is_head: bool) -> Response<ResponseBody> {
    let text = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    ResponseWriter::new(is_head)
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .send_bytes(text)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    ResponseWriter::new(false)
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::ALLOW, ALLOWED_METHODS)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .send_bytes("405 Method Not Allowed\n")
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    ResponseWriter::new(false)
        .status(StatusCode::NO_CONTENT)
        .header(header::ALLOW, ALLOWED_METHODS)
        .send_empty()
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, last_modified: Option<&str>) -> Response<ResponseBody> {
    let mut writer = ResponseWriter::new(true)
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, etag);
    if let Some(lm) = last_modified {
        writer = writer.header(header::LAST_MODIFIED, lm);
    }
    writer.send_empty()
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64, is_head: bool) -> Response<ResponseBody> {
    ResponseWriter::new(is_head)
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .send_bytes("416 Range Not Satisfiable\n")
}

/// Build 301 redirect response
pub fn build_redirect_response(location: &str, is_head: bool) -> Response<ResponseBody> {
    ResponseWriter::new(is_head)
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .send_bytes(format!("Moved Permanently: {location}\n"))
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    ResponseWriter::new(is_head)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .send_bytes(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(resp: Response<ResponseBody>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_writer_sets_status_and_headers() {
        let resp = ResponseWriter::new(false)
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, "text/plain")
            .send_bytes("abc");
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "3");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(&body_of(resp).await[..], b"abc");
    }

    #[tokio::test]
    async fn test_head_keeps_length_drops_body() {
        let resp = ResponseWriter::new(true).send_bytes("hello");
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "5");
        assert!(body_of(resp).await.is_empty());
    }

    #[test]
    fn test_invalid_header_value_dropped() {
        let writer = ResponseWriter::new(false).header(header::LOCATION, "bad\nvalue");
        let resp = writer.send_empty();
        assert!(resp.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_error_page_not_empty() {
        let resp = build_error_response(StatusCode::NOT_FOUND, false);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(&body_of(resp).await[..], b"404 Not Found\n");
    }

    #[test]
    fn test_416_content_range() {
        let resp = build_416_response(42, false);
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[header::CONTENT_RANGE], "bytes */42");
    }
}
