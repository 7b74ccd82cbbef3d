use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::middleware::Middleware;

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the request path
///
/// Header names use `Arc<str>` so repeated names (`Origin`, `Vary`, ...)
/// clone in O(1). Values remain `String` as they're per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Inbound request as seen by middleware and handlers
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP method (GET, POST, OPTIONS, etc.)
    pub method: Method,
    /// Request path
    pub path: String,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Create a request with no headers and no body
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Append a header, returning the request (builder style)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Declared host of the request (the `Host` header, authority form)
    #[inline]
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get_header("host")
    }
}

/// Response produced by a handler or by a short-circuiting middleware
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// HTTP status code (200, 204, 403, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an empty response carrying only a status code
    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Request handler invoked when no middleware short-circuits
pub trait Handler: Send + Sync {
    fn handle(&self, req: &HandlerRequest) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync,
{
    fn handle(&self, req: &HandlerRequest) -> HandlerResponse {
        self(req)
    }
}

/// Runs a middleware chain around a single handler
pub struct Dispatcher {
    handler: Arc<dyn Handler>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Create a dispatcher for `handler` with an empty middleware chain
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Dispatcher {
            handler: Arc::new(handler),
            middlewares: Vec::new(),
        }
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware is executed in the order it's added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Number of registered middlewares
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Dispatch a request through the middleware chain
    ///
    /// The first middleware returning an early response wins; the remaining
    /// `before` hooks still run, the handler does not. Every `after` hook runs
    /// on whichever response was produced.
    #[must_use]
    pub fn dispatch(&self, request: &HandlerRequest) -> HandlerResponse {
        let mut early_resp: Option<HandlerResponse> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if early_resp.is_none() {
                early_resp = mw.before(request);
                if early_resp.is_some() {
                    debug!(
                        middleware_idx = idx,
                        method = %request.method,
                        path = %request.path,
                        "Middleware returned early response"
                    );
                }
            } else {
                let _ignored = mw.before(request);
            }
        }

        let (mut resp, latency) = if let Some(r) = early_resp {
            (r, Duration::from_millis(0))
        } else {
            let start = Instant::now();
            let resp = self.handler.handle(request);
            (resp, start.elapsed())
        };

        for mw in &self.middlewares {
            mw.after(request, &mut resp, latency);
        }

        resp
    }
}
