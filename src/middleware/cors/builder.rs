use std::sync::Arc;
use std::time::Duration;

use super::{CorsConfig, CorsConfigError, CorsMiddleware};
use crate::client::ProxyCorsLayer;

/// Builder for creating `CorsMiddleware` with a fluent API
///
/// Starts from [`CorsConfig::default_config()`]; no origin is allowed until one
/// of `allow_all_origins`, `allow_origins` or `allow_origin_fn` is set.
///
/// # Example
///
/// ```rust
/// use corsgate::middleware::CorsMiddlewareBuilder;
/// use std::time::Duration;
///
/// let cors = CorsMiddlewareBuilder::new()
///     .allow_origins(&["https://example.com", "https://*.example.com"])
///     .allow_wildcard(true)
///     .allow_methods(&["GET", "POST", "PUT"])
///     .allow_headers(&["Content-Type", "Authorization", "X-Custom-Header"])
///     .allow_credentials(true)
///     .expose_headers(&["X-Total-Count", "X-Page-Number"])
///     .max_age(Duration::from_secs(3600)) // Cache preflight for 1 hour
///     .build()
///     .expect("Invalid CORS configuration");
/// assert!(cors.policy().validate_origin("https://api.example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct CorsMiddlewareBuilder {
    config: CorsConfig,
}

impl CorsMiddlewareBuilder {
    /// Create a new builder from the default configuration
    ///
    /// Default configuration:
    /// - No origins allowed
    /// - Methods: `GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS`
    /// - Headers: `Origin, Content-Length, Content-Type`
    /// - Credentials: `false`
    /// - Exposed headers: empty
    /// - Max age: 12 hours
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CorsConfig::default_config(),
        }
    }

    /// Start from an existing configuration
    #[must_use]
    pub fn from_config(config: CorsConfig) -> Self {
        Self { config }
    }

    /// Accept every origin
    ///
    /// Cannot be combined with `allow_origins` or `allow_origin_fn`; `build()`
    /// returns an error in that case.
    #[must_use]
    pub fn allow_all_origins(mut self, allow: bool) -> Self {
        self.config.allow_all_origins = allow;
        self
    }

    /// Set allowed origins
    ///
    /// * `origins` - Slice of origin strings (e.g., `&["https://example.com"]`)
    ///   - Use `&["*"]` to allow all origins
    ///   - Entries with one `*` are patterns when `allow_wildcard(true)` is set
    #[must_use]
    pub fn allow_origins(mut self, origins: &[&str]) -> Self {
        self.config.allow_origins = origins.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Custom origin check, consulted after literal and wildcard matching fail
    ///
    /// ```rust
    /// use corsgate::middleware::CorsMiddlewareBuilder;
    ///
    /// let cors = CorsMiddlewareBuilder::new()
    ///     .allow_origin_fn(|origin: &str| origin.ends_with(".example.com"))
    ///     .build()
    ///     .unwrap();
    /// assert!(cors.policy().validate_origin("https://app.example.com"));
    /// ```
    #[must_use]
    pub fn allow_origin_fn<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.config.allow_origin_fn = Some(Arc::new(validator));
        self
    }

    /// Set allowed HTTP methods (replaces the defaults)
    #[must_use]
    pub fn allow_methods(mut self, methods: &[&str]) -> Self {
        self.config.allow_methods = methods.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append allowed HTTP methods
    #[must_use]
    pub fn add_allow_methods(mut self, methods: &[&str]) -> Self {
        self.config.add_allow_methods(methods.iter().copied());
        self
    }

    /// Set allowed request headers (replaces the defaults)
    #[must_use]
    pub fn allow_headers(mut self, headers: &[&str]) -> Self {
        self.config.allow_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append allowed request headers
    #[must_use]
    pub fn add_allow_headers(mut self, headers: &[&str]) -> Self {
        self.config.add_allow_headers(headers.iter().copied());
        self
    }

    /// Enable or disable credentials
    ///
    /// When enabled, sets `Access-Control-Allow-Credentials: true`.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Set headers to expose to JavaScript
    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.config.expose_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append headers to expose to JavaScript
    #[must_use]
    pub fn add_expose_headers(mut self, headers: &[&str]) -> Self {
        self.config.add_expose_headers(headers.iter().copied());
        self
    }

    /// Set preflight cache duration (whole seconds are sent; zero disables)
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Treat single-`*` origins as prefix/suffix patterns
    #[must_use]
    pub fn allow_wildcard(mut self, allow: bool) -> Self {
        self.config.allow_wildcard = allow;
        self
    }

    /// Accept browser extension schemes in literal origins
    #[must_use]
    pub fn allow_browser_extensions(mut self, allow: bool) -> Self {
        self.config.allow_browser_extensions = allow;
        self
    }

    /// Accept `ws://` and `wss://` in literal origins
    #[must_use]
    pub fn allow_web_sockets(mut self, allow: bool) -> Self {
        self.config.allow_web_sockets = allow;
        self
    }

    /// Accept `file://` in literal origins
    #[must_use]
    pub fn allow_files(mut self, allow: bool) -> Self {
        self.config.allow_files = allow;
        self
    }

    /// The configuration assembled so far
    #[must_use]
    pub fn into_config(self) -> CorsConfig {
        self.config
    }

    /// Build the server-side CORS middleware
    ///
    /// # Errors
    ///
    /// Returns a [`CorsConfigError`] if the assembled configuration is invalid.
    pub fn build(self) -> Result<CorsMiddleware, CorsConfigError> {
        CorsMiddleware::new(self.config)
    }

    /// Build the client-proxy CORS layer from the same configuration
    ///
    /// # Errors
    ///
    /// Returns a [`CorsConfigError`] if the assembled configuration is invalid.
    pub fn build_proxy(self) -> Result<ProxyCorsLayer, CorsConfigError> {
        ProxyCorsLayer::new(self.config)
    }
}

impl Default for CorsMiddlewareBuilder {
    fn default() -> Self {
        Self::new()
    }
}
