//! # corsgate
//!
//! **corsgate** enforces a Cross-Origin Resource Sharing (CORS) policy for an
//! HTTP server and, symmetrically, for responses relayed through an HTTP
//! client proxy.
//!
//! ## Overview
//!
//! A user-authored [`CorsConfig`](middleware::cors::CorsConfig) is validated
//! and compiled exactly once into an immutable
//! [`CorsPolicy`](middleware::cors::CorsPolicy): origins are normalized,
//! wildcard patterns are split into prefix/suffix matchers, and the response
//! header sets for simple and preflight requests are rendered up front. Per
//! request, only origin lookups and string comparisons remain.
//!
//! ## Architecture
//!
//! - **[`middleware::cors`]** - configuration, validation, the compiled policy and header rendering
//! - **[`middleware`]** - the `Middleware` trait and the server-side [`CorsMiddleware`](middleware::CorsMiddleware)
//! - **[`client`]** - [`ProxyCors`](client::ProxyCors), stamping CORS headers onto proxied responses
//! - **[`dispatcher`]** - request/response types and a synchronous middleware pipeline
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Dispatcher
//!     participant Cors as CorsMiddleware
//!     participant Handler
//!
//!     Client->>Dispatcher: request (Origin, Host, method)
//!     Dispatcher->>Cors: before()
//!     Cors->>Cors: classify origin once
//!     alt origin rejected
//!         Cors-->>Dispatcher: 403 Forbidden
//!         Note over Dispatcher,Handler: handler skipped
//!     else accepted OPTIONS
//!         Cors-->>Dispatcher: 204 + preflight headers
//!         Note over Dispatcher,Handler: handler skipped
//!     else no Origin / same origin / accepted simple request
//!         Cors-->>Dispatcher: continue
//!         Dispatcher->>Handler: handle()
//!         Handler-->>Dispatcher: response
//!     end
//!     Dispatcher->>Cors: after()
//!     opt accepted simple request
//!         Cors->>Cors: add simple-request headers
//!     end
//!     Dispatcher-->>Client: response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use corsgate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
//! use corsgate::middleware::CorsMiddlewareBuilder;
//! use http::Method;
//!
//! let cors = CorsMiddlewareBuilder::new()
//!     .allow_origins(&["http://google.com"])
//!     .allow_origin_fn(|origin: &str| origin == "http://github.com")
//!     .build()
//!     .expect("Invalid CORS configuration");
//!
//! let mut dispatcher = Dispatcher::new(|_req: &HandlerRequest| HandlerResponse::status_only(200));
//! dispatcher.add_middleware(Arc::new(cors));
//!
//! let denied = HandlerRequest::new(Method::GET, "/").with_header("origin", "https://dummy.com");
//! assert_eq!(dispatcher.dispatch(&denied).status, 403);
//!
//! let preflight = HandlerRequest::new(Method::OPTIONS, "/").with_header("origin", "http://github.com");
//! assert_eq!(dispatcher.dispatch(&preflight).status, 204);
//! ```

pub mod client;
pub mod dispatcher;
pub mod middleware;

pub use client::{Endpoint, ProxyCors, ProxyCorsLayer};
pub use middleware::cors::{CorsConfig, CorsConfigError, CorsPolicy, CorsSettings};
pub use middleware::{CorsMiddleware, CorsMiddlewareBuilder, Middleware};
