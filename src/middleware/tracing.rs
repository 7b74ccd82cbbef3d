use std::cell::RefCell;
use std::time::Duration;

use tracing::{field, info, info_span, span::EnteredSpan};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

thread_local! {
    static SPAN_GUARD: RefCell<Option<EnteredSpan>> = const { RefCell::new(None) };
}

/// Opens a `request` span in `before` and closes it in `after`.
///
/// The dispatcher runs both hooks on the calling thread, so the entered span
/// is parked in a thread-local between them.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        let span = info_span!(
            "request",
            method = %req.method,
            path = %req.path,
            origin = req.get_header("origin").unwrap_or(""),
            status = field::Empty,
            latency_ms = field::Empty,
        );
        let entered = span.entered();
        SPAN_GUARD.with(|g| *g.borrow_mut() = Some(entered));
        None
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        SPAN_GUARD.with(|g| {
            if let Some(span) = g.borrow_mut().take() {
                span.record("status", res.status);
                span.record("latency_ms", latency_ms);
                info!(status = res.status, latency_ms, "Request completed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_span_is_released_after_request() {
        let mw = TracingMiddleware;
        let req = HandlerRequest::new(Method::GET, "/health");
        assert!(mw.before(&req).is_none());
        assert!(SPAN_GUARD.with(|g| g.borrow().is_some()));

        let mut resp = HandlerResponse::status_only(200);
        mw.after(&req, &mut resp, Duration::from_millis(3));
        assert!(SPAN_GUARD.with(|g| g.borrow().is_none()));
    }
}
