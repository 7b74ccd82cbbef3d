use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::CorsConfigError;

/// Schemes every literal origin may use
pub const DEFAULT_SCHEMES: &[&str] = &["http://", "https://"];

/// Browser extension schemes, enabled by `allow_browser_extensions`
pub const EXTENSION_SCHEMES: &[&str] = &[
    "chrome-extension://",
    "safari-extension://",
    "moz-extension://",
    "ms-browser-extension://",
];

/// WebSocket schemes, enabled by `allow_web_sockets`
pub const WEBSOCKET_SCHEMES: &[&str] = &["ws://", "wss://"];

/// Local file scheme, enabled by `allow_files`
pub const FILE_SCHEMES: &[&str] = &["file://"];

/// Custom origin check consulted after literal and wildcard matching fail
///
/// Implemented for any `Fn(&str) -> bool + Send + Sync`, so closures can be
/// passed directly. Implementations are called on the request path and must
/// be fast and free of side effects.
pub trait OriginValidator: Send + Sync {
    fn is_allowed(&self, origin: &str) -> bool;
}

impl<F> OriginValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_allowed(&self, origin: &str) -> bool {
        self(origin)
    }
}

/// User-facing CORS configuration
///
/// Describes the desired behaviour; it is validated and compiled once into a
/// [`CorsPolicy`](super::CorsPolicy) before any request is served.
///
/// # Example
///
/// ```rust
/// use corsgate::middleware::cors::CorsConfig;
///
/// let mut config = CorsConfig::default_config();
/// config.allow_origins = vec!["https://example.com".into()];
/// config.add_allow_headers(["Authorization"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct CorsConfig {
    /// Accept every origin and answer with `Access-Control-Allow-Origin: *`
    pub allow_all_origins: bool,
    /// Origins a cross-domain request can be executed from
    ///
    /// Literal origins must carry an enabled scheme. With `allow_wildcard`,
    /// entries containing a single `*` act as prefix/suffix patterns. A bare
    /// `"*"` entry is equivalent to `allow_all_origins`.
    pub allow_origins: Vec<String>,
    /// Custom origin check, consulted only when literal and wildcard checks fail
    pub allow_origin_fn: Option<Arc<dyn OriginValidator>>,
    /// Methods the client is allowed to use with cross-domain requests
    pub allow_methods: Vec<String>,
    /// Non-simple headers the client is allowed to use with cross-domain requests
    pub allow_headers: Vec<String>,
    /// Whether the request can include cookies, HTTP auth or client certificates
    pub allow_credentials: bool,
    /// Headers safe to expose to the API of a CORS response
    pub expose_headers: Vec<String>,
    /// How long the results of a preflight request can be cached
    pub max_age: Duration,
    /// Allow origins like `http://some-domain/*`, `https://api.*` or `http://some.*.subdomain.com`
    pub allow_wildcard: bool,
    /// Allow popular browser extension schemes
    pub allow_browser_extensions: bool,
    /// Allow the WebSocket schemes
    pub allow_web_sockets: bool,
    /// Allow the `file://` scheme. Only enable this when it is really needed
    pub allow_files: bool,
}

impl fmt::Debug for CorsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorsConfig")
            .field("allow_all_origins", &self.allow_all_origins)
            .field("allow_origins", &self.allow_origins)
            .field(
                "allow_origin_fn",
                &self.allow_origin_fn.as_ref().map(|_| "<function>"),
            )
            .field("allow_methods", &self.allow_methods)
            .field("allow_headers", &self.allow_headers)
            .field("allow_credentials", &self.allow_credentials)
            .field("expose_headers", &self.expose_headers)
            .field("max_age", &self.max_age)
            .field("allow_wildcard", &self.allow_wildcard)
            .field("allow_browser_extensions", &self.allow_browser_extensions)
            .field("allow_web_sockets", &self.allow_web_sockets)
            .field("allow_files", &self.allow_files)
            .finish()
    }
}

impl CorsConfig {
    /// Generic defaults: common methods, basic headers, 12 hour preflight cache
    ///
    /// No origin is configured, so one of `allow_all_origins`, `allow_origins`
    /// or `allow_origin_fn` must still be set before the config validates.
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            allow_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: ["Origin", "Content-Length", "Content-Type"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_credentials: false,
            max_age: Duration::from_secs(12 * 60 * 60),
            ..Self::default()
        }
    }

    /// Append methods to `allow_methods`
    pub fn add_allow_methods<I>(&mut self, methods: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allow_methods.extend(methods.into_iter().map(Into::into));
    }

    /// Append headers to `allow_headers`
    pub fn add_allow_headers<I>(&mut self, headers: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allow_headers.extend(headers.into_iter().map(Into::into));
    }

    /// Append headers to `expose_headers`
    pub fn add_expose_headers<I>(&mut self, headers: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expose_headers.extend(headers.into_iter().map(Into::into));
    }

    /// Schemes a literal origin may start with, given the feature toggles
    ///
    /// Order: default schemes, extension schemes, WebSocket schemes, file scheme.
    #[must_use]
    pub fn allowed_schemes(&self) -> Vec<&'static str> {
        let mut schemes = DEFAULT_SCHEMES.to_vec();
        if self.allow_browser_extensions {
            schemes.extend_from_slice(EXTENSION_SCHEMES);
        }
        if self.allow_web_sockets {
            schemes.extend_from_slice(WEBSOCKET_SCHEMES);
        }
        if self.allow_files {
            schemes.extend_from_slice(FILE_SCHEMES);
        }
        schemes
    }

    /// Check the configuration for conflicting or unusable settings
    pub fn validate(&self) -> Result<(), CorsConfigError> {
        if self.allow_all_origins
            && (self.allow_origin_fn.is_some() || !self.allow_origins.is_empty())
        {
            return Err(CorsConfigError::ConflictingAllowAll);
        }
        if !self.allow_all_origins && self.allow_origin_fn.is_none() && self.allow_origins.is_empty()
        {
            return Err(CorsConfigError::AllOriginsDisabled);
        }

        let schemes = self.allowed_schemes();
        for origin in &self.allow_origins {
            match origin.matches('*').count() {
                0 => {
                    if !schemes.iter().any(|s| origin.starts_with(s)) {
                        return Err(CorsConfigError::MissingScheme {
                            origin: origin.clone(),
                            allowed: schemes,
                        });
                    }
                }
                1 => {}
                _ => {
                    return Err(CorsConfigError::MultipleWildcards {
                        origin: origin.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Compile the `*`-bearing entries of `allow_origins` into matchers
    ///
    /// Returns no rules unless `allow_wildcard` is set. Rules keep the
    /// configuration order.
    pub fn parse_wildcard_rules(&self) -> Result<Vec<WildcardRule>, CorsConfigError> {
        if !self.allow_wildcard {
            return Ok(Vec::new());
        }

        let mut rules = Vec::new();
        for origin in &self.allow_origins {
            let Some(star) = origin.find('*') else {
                continue;
            };
            if origin[star + 1..].contains('*') {
                return Err(CorsConfigError::MultipleWildcards {
                    origin: origin.clone(),
                });
            }

            let rule = if star == 0 {
                WildcardRule::Suffix(origin[1..].to_string())
            } else if star == origin.len() - 1 {
                // The character right before a trailing `*` is not part of the prefix.
                let head = &origin[..star];
                let cut = head.char_indices().last().map_or(0, |(i, _)| i);
                WildcardRule::Prefix(head[..cut].to_string())
            } else {
                WildcardRule::Infix {
                    prefix: origin[..star].to_string(),
                    suffix: origin[star + 1..].to_string(),
                }
            };
            rules.push(rule);
        }
        Ok(rules)
    }
}

/// An origin pattern with exactly one `*`, split around the star
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardRule {
    /// Leading `*`: the origin must end with the suffix
    Suffix(String),
    /// Trailing `*`: the origin must start with the prefix
    Prefix(String),
    /// Interior `*`: the origin must start with `prefix` and end with `suffix`
    Infix { prefix: String, suffix: String },
}

impl WildcardRule {
    /// Whether `origin` satisfies this pattern
    #[inline]
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            WildcardRule::Suffix(suffix) => origin.ends_with(suffix.as_str()),
            WildcardRule::Prefix(prefix) => origin.starts_with(prefix.as_str()),
            WildcardRule::Infix { prefix, suffix } => {
                origin.starts_with(prefix.as_str()) && origin.ends_with(suffix.as_str())
            }
        }
    }
}
