mod core;
pub mod cors;
mod tracing;

pub use core::Middleware;
pub use cors::{CorsMiddleware, CorsMiddlewareBuilder};
pub use tracing::TracingMiddleware;
