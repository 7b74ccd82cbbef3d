//! # Client Proxy CORS
//!
//! CORS header stamping for responses relayed through an HTTP client.
//!
//! A proxy forwards a browser's request upstream and hands the upstream
//! response back. [`ProxyCors`] wraps the upstream call (an [`Endpoint`]):
//! the call always runs first, then the request's `Origin` is checked against
//! the same compiled policy the server middleware uses. Accepted origins get
//! the simple-request header set stamped onto the response. There is no
//! preflight branch and no rejection: a failed check only skips the headers,
//! and the upstream result is always returned to the caller.
//!
//! ## Example
//!
//! ```rust
//! use corsgate::client::{Endpoint, ProxyCorsLayer};
//! use corsgate::middleware::cors::CorsConfig;
//! use http::{Request, Response};
//!
//! let config = CorsConfig {
//!     allow_origins: vec!["https://app.example.com".into()],
//!     ..CorsConfig::default_config()
//! };
//! let layer = ProxyCorsLayer::new(config).expect("Invalid CORS configuration");
//! let proxy = layer.wrap(|_req: &Request<()>, resp: &mut Response<()>| -> anyhow::Result<()> {
//!     *resp.status_mut() = http::StatusCode::OK;
//!     Ok(())
//! });
//!
//! let req = Request::builder()
//!     .uri("http://api.internal/items")
//!     .header("origin", "https://app.example.com")
//!     .body(())
//!     .unwrap();
//! let mut resp = Response::new(());
//! proxy.call(&req, &mut resp).unwrap();
//! assert_eq!(
//!     resp.headers()["access-control-allow-origin"],
//!     "https://app.example.com"
//! );
//! ```

use std::sync::Arc;

use http::header::{HOST, ORIGIN};
use http::{Request, Response};

use crate::middleware::cors::{CorsConfig, CorsConfigError, CorsPolicy, OriginCheck};

/// One step of an HTTP client call chain
///
/// Fills in `resp` for `req`. Implemented for matching closures.
pub trait Endpoint<ReqBody, ResBody>: Send + Sync {
    fn call(&self, req: &Request<ReqBody>, resp: &mut Response<ResBody>) -> anyhow::Result<()>;
}

impl<F, ReqBody, ResBody> Endpoint<ReqBody, ResBody> for F
where
    F: Fn(&Request<ReqBody>, &mut Response<ResBody>) -> anyhow::Result<()> + Send + Sync,
{
    fn call(&self, req: &Request<ReqBody>, resp: &mut Response<ResBody>) -> anyhow::Result<()> {
        self(req, resp)
    }
}

/// Factory for [`ProxyCors`] wrappers sharing one compiled policy
#[derive(Debug, Clone)]
pub struct ProxyCorsLayer {
    policy: Arc<CorsPolicy>,
}

impl ProxyCorsLayer {
    /// Validate and compile `config`
    ///
    /// # Errors
    ///
    /// Returns a [`CorsConfigError`] if the configuration is invalid.
    pub fn new(config: CorsConfig) -> Result<Self, CorsConfigError> {
        Ok(Self {
            policy: Arc::new(CorsPolicy::compile(&config)?),
        })
    }

    /// Share a policy already compiled for a server middleware
    #[must_use]
    pub fn from_policy(policy: Arc<CorsPolicy>) -> Self {
        Self { policy }
    }

    /// Wrap `inner` so its responses get CORS headers
    #[must_use]
    pub fn wrap<E>(&self, inner: E) -> ProxyCors<E> {
        ProxyCors {
            policy: Arc::clone(&self.policy),
            inner,
        }
    }
}

/// An [`Endpoint`] that stamps CORS headers on the wrapped endpoint's response
#[derive(Debug, Clone)]
pub struct ProxyCors<E> {
    policy: Arc<CorsPolicy>,
    inner: E,
}

impl<E> ProxyCors<E> {
    /// Apply the policy to an already completed exchange
    pub fn apply<ReqBody, ResBody>(&self, req: &Request<ReqBody>, resp: &mut Response<ResBody>) {
        let origin = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok());
        let host = req
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri().authority().map(|a| a.as_str()));

        if self.policy.classify(origin, host) == OriginCheck::Allowed {
            self.policy
                .handle_normal(origin.unwrap_or_default(), resp.headers_mut());
        }
    }
}

impl<E, ReqBody, ResBody> Endpoint<ReqBody, ResBody> for ProxyCors<E>
where
    E: Endpoint<ReqBody, ResBody>,
{
    fn call(&self, req: &Request<ReqBody>, resp: &mut Response<ResBody>) -> anyhow::Result<()> {
        let result = self.inner.call(req, resp);
        self.apply(req, resp);
        result
    }
}
