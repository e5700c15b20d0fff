//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, header
//! extraction, dispatch to the static file handler and access logging.

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::static_files;
use crate::http::cache::Conditionals;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{self, HeaderMap, HeaderName};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub conditionals: Conditionals,
    pub range: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let headers = req.headers();
        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: req.method() == Method::HEAD,
            conditionals: Conditionals {
                if_match: header_string(headers, &header::IF_MATCH),
                if_none_match: header_string(headers, &header::IF_NONE_MATCH),
                if_modified_since: header_string(headers, &header::IF_MODIFIED_SINCE),
                if_unmodified_since: header_string(headers, &header::IF_UNMODIFIED_SINCE),
                if_range: header_string(headers, &header::IF_RANGE),
            },
            range: header_string(headers, &header::RANGE),
        }
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
///
/// Never fails: every error becomes an HTTP response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let entry = logger::access_log_enabled().then(|| {
        AccessLogEntry::from_request(peer, req.method(), req.uri(), req.version(), req.headers())
    });

    let response = match *req.method() {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext::from_request(&req);
            dispatch(&ctx, &state).await
        }
        Method::OPTIONS => http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", req.method()));
            http::build_405_response()
        }
    };

    if let Some(entry) = entry {
        let body_bytes = if req.method() == Method::HEAD {
            0
        } else {
            content_length(&response)
        };
        logger::log_access(&entry.finish(response.status().as_u16(), body_bytes, started));
    }

    Ok(response)
}

/// Serve the request, turning failures into error pages
async fn dispatch(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    match static_files::serve(ctx, state).await {
        Ok(response) => response,
        Err(err) => {
            if let ServeError::Io(ref e) = err {
                logger::log_error(&format!("Failed to serve '{}': {e}", ctx.path));
            }
            http::build_error_response(err.status(), ctx.is_head)
        }
    }
}

fn content_length(response: &Response<ResponseBody>) -> u64 {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
