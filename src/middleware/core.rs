use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook pair run by the [`Dispatcher`](crate::dispatcher::Dispatcher) around every request.
///
/// `before` may short-circuit by returning a response (the handler is then
/// skipped); `after` runs on every response, including early ones.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
