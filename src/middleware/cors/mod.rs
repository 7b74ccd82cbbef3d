mod builder;
mod config;
mod error;
pub mod headers;
mod policy;
mod settings;

pub use builder::CorsMiddlewareBuilder;
pub use config::{
    CorsConfig, OriginValidator, WildcardRule, DEFAULT_SCHEMES, EXTENSION_SCHEMES, FILE_SCHEMES,
    WEBSOCKET_SCHEMES,
};
pub use error::CorsConfigError;
pub use headers::HeaderTable;
pub use policy::{CorsPolicy, HeaderWriter, OriginCheck};
pub use settings::CorsSettings;

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use http::Method;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::middleware::Middleware;

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// Server-side interceptor around a compiled [`CorsPolicy`].
///
/// # Request Flow
///
/// - **No `Origin` header**: passed through untouched
/// - **Same origin** (`Origin` is `http(s)://` + `Host`): passed through untouched
/// - **Rejected origin**: `403 Forbidden` with no CORS headers, handler skipped
/// - **Accepted preflight** (`OPTIONS`): preflight headers, `204 No Content`, handler skipped
/// - **Accepted simple request**: handler runs, simple-request headers added in `after()`
///
/// Unless the policy allows all origins, `Access-Control-Allow-Origin` echoes
/// the request origin.
///
/// # Usage
///
/// ```rust
/// use corsgate::middleware::cors::CorsConfig;
/// use corsgate::middleware::CorsMiddleware;
///
/// let config = CorsConfig {
///     allow_origins: vec!["https://example.com".into()],
///     ..CorsConfig::default_config()
/// };
/// let cors = CorsMiddleware::new(config).expect("Invalid CORS configuration");
/// assert!(cors.policy().validate_origin("https://example.com"));
/// ```
thread_local! {
    /// Decisions made in `before`, keyed by middleware instance, awaiting `after`
    static PENDING_DECISIONS: RefCell<Vec<(usize, bool)>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    policy: Arc<CorsPolicy>,
}

impl CorsMiddleware {
    /// Validate and compile `config` into a ready-to-install middleware
    ///
    /// # Errors
    ///
    /// Returns a [`CorsConfigError`] if the configuration is invalid; the
    /// middleware cannot be created with such a policy.
    pub fn new(config: CorsConfig) -> Result<Self, CorsConfigError> {
        config.validate()?;
        Ok(Self::from_policy(Arc::new(CorsPolicy::compile_validated(
            config,
        )?)))
    }

    /// Wrap an already compiled policy
    #[must_use]
    pub fn from_policy(policy: Arc<CorsPolicy>) -> Self {
        Self { policy }
    }

    /// Permissive middleware: default configuration with every origin allowed
    ///
    /// Suitable for development. Answers with `Access-Control-Allow-Origin: *`.
    #[must_use]
    pub fn permissive() -> Self {
        let config = CorsConfig {
            allow_all_origins: true,
            ..CorsConfig::default_config()
        };
        // allow-all configs carry no origin patterns to parse
        Self::from_policy(Arc::new(CorsPolicy::assemble(config, Vec::new())))
    }

    /// The compiled policy shared by this middleware
    #[must_use]
    pub fn policy(&self) -> &Arc<CorsPolicy> {
        &self.policy
    }

    fn instance_id(&self) -> usize {
        self as *const Self as usize
    }

    /// Park whether `after` must stamp simple-request headers
    fn park_decision(&self, stamp: bool) {
        let id = self.instance_id();
        PENDING_DECISIONS.with(|pending| {
            let mut pending = pending.borrow_mut();
            pending.retain(|(owner, _)| *owner != id);
            pending.push((id, stamp));
        });
    }

    fn take_decision(&self) -> bool {
        let id = self.instance_id();
        PENDING_DECISIONS.with(|pending| {
            let mut pending = pending.borrow_mut();
            match pending.iter().rposition(|(owner, _)| *owner == id) {
                Some(idx) => pending.remove(idx).1,
                None => false,
            }
        })
    }
}

impl Middleware for CorsMiddleware {
    /// Reject disallowed origins and answer accepted preflights
    ///
    /// The origin is classified exactly once per request; `after` reuses the
    /// decision made here.
    ///
    /// # Returns
    ///
    /// - `Some(403)` - cross-origin request from a rejected origin
    /// - `Some(204)` - accepted `OPTIONS` preflight, with preflight headers
    /// - `None` - everything else (proceed to handler)
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        let origin = req.get_header("origin");
        let check = self.policy.classify(origin, req.host());
        let preflight = req.method == Method::OPTIONS;
        self.park_decision(check == OriginCheck::Allowed && !preflight);

        match check {
            OriginCheck::NotCors | OriginCheck::SameOrigin => None,
            OriginCheck::Rejected => Some(HandlerResponse::status_only(403)),
            OriginCheck::Allowed if preflight => {
                let mut resp = HandlerResponse::status_only(204);
                self.policy
                    .handle_preflight(origin.unwrap_or_default(), &mut resp);
                Some(resp)
            }
            OriginCheck::Allowed => None,
        }
    }

    /// Add simple-request CORS headers when `before` accepted a non-preflight request
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        if self.take_decision() {
            self.policy
                .handle_normal(req.get_header("origin").unwrap_or_default(), res);
        }
    }
}
