//! # Dispatcher Module
//!
//! The dispatcher module is the minimal host request pipeline used to drive
//! server-side middleware. It owns the request/response types the CORS
//! interceptor reads from and writes to, and runs a middleware chain around a
//! single synchronous handler.
//!
//! ## Overview
//!
//! - [`HandlerRequest`] carries the method, path and headers of an inbound request
//! - [`HandlerResponse`] carries status, headers and a JSON body
//! - [`Dispatcher`] runs `before` hooks in registration order, invokes the
//!   handler unless a middleware short-circuited, then runs every `after` hook
//!
//! ## Middleware Flow
//!
//! ```text
//! request ─► before(mw1) ─► before(mw2) ─► handler ─► after(mw1) ─► after(mw2) ─► response
//!                 │
//!                 └─ Some(early response) skips the handler, `after` still runs
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use corsgate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
//! use corsgate::middleware::CorsMiddleware;
//! use http::Method;
//!
//! let mut dispatcher = Dispatcher::new(|_req: &HandlerRequest| {
//!     HandlerResponse::json(200, serde_json::json!({"ok": true}))
//! });
//! dispatcher.add_middleware(Arc::new(CorsMiddleware::permissive()));
//!
//! let req = HandlerRequest::new(Method::GET, "/")
//!     .with_header("origin", "https://example.com");
//! let resp = dispatcher.dispatch(&req);
//! assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
//! ```

mod core;

pub use core::{Dispatcher, Handler, HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};
