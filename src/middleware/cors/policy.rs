use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use tracing::{debug, warn};

use super::headers::{
    generate_normal_headers, generate_preflight_headers, normalize, HeaderTable,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use super::{CorsConfig, CorsConfigError, OriginValidator, WildcardRule, DEFAULT_SCHEMES};
use crate::dispatcher::HandlerResponse;

/// Destination for CORS response headers
///
/// Implemented for [`HandlerResponse`] (server path) and [`http::HeaderMap`]
/// (client-proxy path). Setting a header replaces any previous value.
pub trait HeaderWriter {
    fn set_header(&mut self, name: &'static str, value: &str);
}

impl HeaderWriter for HandlerResponse {
    fn set_header(&mut self, name: &'static str, value: &str) {
        HandlerResponse::set_header(self, name, value.to_string());
    }
}

impl HeaderWriter for HeaderMap {
    fn set_header(&mut self, name: &'static str, value: &str) {
        let name = match http::HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(_) => {
                warn!(header = name, "CORS: invalid header name, skipping");
                return;
            }
        };
        match http::HeaderValue::from_str(value) {
            Ok(v) => {
                self.insert(name, v);
            }
            Err(_) => {
                warn!(header = %name, "CORS: header value is not valid, skipping");
            }
        }
    }
}

/// Outcome of checking a request's `Origin` against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginCheck {
    /// No `Origin` header (or an empty one): not a CORS request
    NotCors,
    /// `Origin` names the request's own host
    SameOrigin,
    /// Cross-origin request from an origin the policy does not accept
    Rejected,
    /// Cross-origin request from an accepted origin
    Allowed,
}

/// Compiled, immutable CORS policy
///
/// Built once from a validated [`CorsConfig`]; all normalization, wildcard
/// parsing and header rendering happens here so the request path only does
/// lookups and prefix/suffix comparisons. Safe to share across threads.
pub struct CorsPolicy {
    allow_all_origins: bool,
    allow_origins: HashSet<String>,
    wildcard_rules: Vec<WildcardRule>,
    allow_origin_fn: Option<Arc<dyn OriginValidator>>,
    normal_headers: HeaderTable,
    preflight_headers: HeaderTable,
}

impl fmt::Debug for CorsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorsPolicy")
            .field("allow_all_origins", &self.allow_all_origins)
            .field("allow_origins", &self.allow_origins)
            .field("wildcard_rules", &self.wildcard_rules)
            .field(
                "allow_origin_fn",
                &self.allow_origin_fn.as_ref().map(|_| "<function>"),
            )
            .field("normal_headers", &self.normal_headers)
            .field("preflight_headers", &self.preflight_headers)
            .finish()
    }
}

impl CorsPolicy {
    /// Validate `config` and compile it
    ///
    /// # Errors
    ///
    /// Any [`CorsConfigError`] reported by [`CorsConfig::validate`] or
    /// [`CorsConfig::parse_wildcard_rules`].
    pub fn compile(config: &CorsConfig) -> Result<Self, CorsConfigError> {
        config.validate()?;
        Self::compile_validated(config.clone())
    }

    /// Compile a config that already passed validation
    pub(crate) fn compile_validated(config: CorsConfig) -> Result<Self, CorsConfigError> {
        let wildcard_rules = config.parse_wildcard_rules()?;
        Ok(Self::assemble(config, wildcard_rules))
    }

    /// Build the policy from a validated config and its parsed wildcard rules
    pub(crate) fn assemble(mut config: CorsConfig, wildcard_rules: Vec<WildcardRule>) -> Self {
        if config.allow_origins.iter().any(|o| o == "*") {
            config.allow_all_origins = true;
        }

        let policy = Self {
            allow_all_origins: config.allow_all_origins,
            allow_origins: normalize(&config.allow_origins).into_iter().collect(),
            wildcard_rules,
            normal_headers: generate_normal_headers(&config),
            preflight_headers: generate_preflight_headers(&config),
            allow_origin_fn: config.allow_origin_fn,
        };

        debug!(
            allow_all_origins = policy.allow_all_origins,
            origins = policy.allow_origins.len(),
            wildcard_rules = policy.wildcard_rules.len(),
            custom_validator = policy.allow_origin_fn.is_some(),
            "CORS policy compiled"
        );
        policy
    }

    /// Whether every origin is accepted (`Access-Control-Allow-Origin: *`)
    #[must_use]
    pub fn allows_all_origins(&self) -> bool {
        self.allow_all_origins
    }

    /// Wildcard rules in configuration order
    #[must_use]
    pub fn wildcard_rules(&self) -> &[WildcardRule] {
        &self.wildcard_rules
    }

    /// Headers written on accepted simple requests
    #[must_use]
    pub fn normal_headers(&self) -> &HeaderTable {
        &self.normal_headers
    }

    /// Headers written on accepted preflight requests
    #[must_use]
    pub fn preflight_headers(&self) -> &HeaderTable {
        &self.preflight_headers
    }

    /// Whether `origin` is accepted by this policy
    ///
    /// Checks, in order: allow-all, exact (case-sensitive) match against the
    /// normalized origin set, wildcard rules in configuration order, and
    /// finally the custom validator.
    #[must_use]
    pub fn validate_origin(&self, origin: &str) -> bool {
        if self.allow_all_origins {
            return true;
        }
        if self.allow_origins.contains(origin) {
            return true;
        }
        if self.wildcard_rules.iter().any(|rule| rule.matches(origin)) {
            return true;
        }
        match &self.allow_origin_fn {
            Some(validator) => validator.is_allowed(origin),
            None => false,
        }
    }

    /// Whether `origin` is `http://` or `https://` followed by exactly `host`
    #[must_use]
    pub fn is_same_origin(origin: &str, host: Option<&str>) -> bool {
        let Some(host) = host else {
            return false;
        };
        DEFAULT_SCHEMES
            .iter()
            .any(|scheme| origin.strip_prefix(scheme) == Some(host))
    }

    /// Classify a request by its `Origin` header and declared host
    #[must_use]
    pub fn classify(&self, origin: Option<&str>, host: Option<&str>) -> OriginCheck {
        let origin = match origin {
            Some(o) if !o.is_empty() => o,
            _ => return OriginCheck::NotCors,
        };
        if Self::is_same_origin(origin, host) {
            debug!(origin, "CORS: same-origin request, skipping CORS headers");
            return OriginCheck::SameOrigin;
        }
        if self.validate_origin(origin) {
            OriginCheck::Allowed
        } else {
            OriginCheck::Rejected
        }
    }

    /// Write the simple-request headers for an accepted `origin`
    pub fn handle_normal<W: HeaderWriter + ?Sized>(&self, origin: &str, out: &mut W) {
        self.write(&self.normal_headers, origin, out);
    }

    /// Write the preflight headers for an accepted `origin`
    pub fn handle_preflight<W: HeaderWriter + ?Sized>(&self, origin: &str, out: &mut W) {
        self.write(&self.preflight_headers, origin, out);
    }

    fn write<W: HeaderWriter + ?Sized>(&self, table: &HeaderTable, origin: &str, out: &mut W) {
        for (name, value) in table.iter() {
            out.set_header(name, value);
        }
        if !self.allow_all_origins {
            out.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::cors::headers::{ACCESS_CONTROL_MAX_AGE, VARY};
    use std::time::Duration;

    fn origins(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compile_rejects_invalid_config() {
        assert_eq!(
            CorsPolicy::compile(&CorsConfig::default()).unwrap_err(),
            CorsConfigError::AllOriginsDisabled
        );
    }

    #[test]
    fn test_validate_origin_allow_all() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_all_origins: true,
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.validate_origin("http://google.com"));
        assert!(policy.validate_origin("https://google.com"));
        assert!(policy.validate_origin("example.com"));
        assert!(policy.validate_origin("chrome-extension://random-extension-id"));
    }

    #[test]
    fn test_validate_origin_literal_and_validator() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["https://google.com", "https://github.com"]),
            allow_origin_fn: Some(Arc::new(|origin: &str| {
                origin == "http://abcdefghijklmnopqrstuvwxyz"
            })),
            allow_browser_extensions: true,
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(!policy.validate_origin("http://google.com"));
        assert!(policy.validate_origin("https://google.com"));
        assert!(policy.validate_origin("https://github.com"));
        assert!(policy.validate_origin("http://abcdefghijklmnopqrstuvwxyz"));
        assert!(!policy.validate_origin("http://example.com"));
        assert!(!policy.validate_origin("google.com"));
        assert!(!policy.validate_origin("chrome-extension://random-extension-id"));
    }

    #[test]
    fn test_validate_origin_schemes_not_enabled() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["https://google.com", "https://github.com"]),
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(!policy.validate_origin("chrome-extension://random-extension-id"));
        assert!(!policy.validate_origin("file://some-dangerous-file.js"));
        assert!(!policy.validate_origin("wss://socket-connection"));
    }

    #[test]
    fn test_validate_origin_wildcards() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&[
                "chrome-extension://*",
                "safari-extension://my-extension-*-app",
                "*.some-domain.com",
            ]),
            allow_browser_extensions: true,
            allow_wildcard: true,
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.validate_origin("chrome-extension://random-extension-id"));
        assert!(policy.validate_origin("chrome-extension://another-one"));
        assert!(policy.validate_origin("safari-extension://my-extension-one-app"));
        assert!(policy.validate_origin("safari-extension://my-extension-two-app"));
        assert!(!policy.validate_origin("moz-extension://ext-id-we-not-allow"));
        assert!(policy.validate_origin("http://api.some-domain.com"));
        assert!(!policy.validate_origin("http://api.another-domain.com"));
    }

    #[test]
    fn test_wildcard_patterns_ignored_without_toggle() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["https://*.github.com"]),
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.wildcard_rules().is_empty());
        assert!(!policy.validate_origin("https://gist.github.com"));
        // the pattern text itself is still a literal entry
        assert!(policy.validate_origin("https://*.github.com"));
    }

    #[test]
    fn test_validate_origin_files_and_websockets() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["file://safe-file.js", "wss://some-sessions-layer-connection"]),
            allow_files: true,
            allow_web_sockets: true,
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.validate_origin("file://safe-file.js"));
        assert!(!policy.validate_origin("file://some-dangerous-file.js"));
        assert!(policy.validate_origin("wss://some-sessions-layer-connection"));
        assert!(!policy.validate_origin("ws://not-what-we-expected"));
    }

    #[test]
    fn test_star_origin_switches_to_allow_all() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["*"]),
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.allows_all_origins());
        assert!(policy.validate_origin("http://google.com"));
        assert!(policy.validate_origin("example.com"));
        assert_eq!(
            policy.normal_headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some("*")
        );
        assert_eq!(policy.normal_headers().get(VARY), None);
    }

    #[test]
    fn test_literal_origins_are_lowercased() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["https://Example.COM "]),
            ..CorsConfig::default()
        })
        .unwrap();
        assert!(policy.validate_origin("https://example.com"));
        assert!(!policy.validate_origin("https://Example.COM"));
    }

    #[test]
    fn test_same_origin() {
        assert!(CorsPolicy::is_same_origin("http://facebook.com", Some("facebook.com")));
        assert!(CorsPolicy::is_same_origin("https://facebook.com", Some("facebook.com")));
        assert!(CorsPolicy::is_same_origin("http://localhost:8080", Some("localhost:8080")));
        assert!(!CorsPolicy::is_same_origin("http://localhost:8080", Some("localhost")));
        assert!(!CorsPolicy::is_same_origin("ws://facebook.com", Some("facebook.com")));
        assert!(!CorsPolicy::is_same_origin("http://facebook.com", None));
    }

    #[test]
    fn test_classify() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["http://google.com"]),
            ..CorsConfig::default()
        })
        .unwrap();
        assert_eq!(policy.classify(None, Some("a.com")), OriginCheck::NotCors);
        assert_eq!(policy.classify(Some(""), Some("a.com")), OriginCheck::NotCors);
        assert_eq!(
            policy.classify(Some("http://facebook.com"), Some("facebook.com")),
            OriginCheck::SameOrigin
        );
        assert_eq!(
            policy.classify(Some("http://google.com"), Some("facebook.com")),
            OriginCheck::Allowed
        );
        assert_eq!(
            policy.classify(Some("https://google.com"), Some("facebook.com")),
            OriginCheck::Rejected
        );
    }

    #[test]
    fn test_handle_preflight_echoes_origin() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["http://google.com"]),
            max_age: Duration::from_secs(600),
            ..CorsConfig::default()
        })
        .unwrap();
        let mut resp = HandlerResponse::status_only(204);
        policy.handle_preflight("http://google.com", &mut resp);
        assert_eq!(
            resp.get_header(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some("http://google.com")
        );
        assert_eq!(resp.get_header(ACCESS_CONTROL_MAX_AGE), Some("600"));
        assert_eq!(resp.get_header(VARY), Some("Origin"));
    }

    #[test]
    fn test_handle_normal_into_header_map() {
        let policy = CorsPolicy::compile(&CorsConfig {
            allow_origins: origins(&["http://google.com"]),
            expose_headers: origins(&["x-total"]),
            ..CorsConfig::default()
        })
        .unwrap();
        let mut headers = HeaderMap::new();
        policy.handle_normal("http://google.com", &mut headers);
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://google.com"
        );
        assert_eq!(headers.get("access-control-expose-headers").unwrap(), "X-Total");
        assert_eq!(headers.get("vary").unwrap(), "Origin");
    }

    #[test]
    fn test_header_map_skips_invalid_values() {
        let mut headers = HeaderMap::new();
        HeaderWriter::set_header(&mut headers, ACCESS_CONTROL_ALLOW_ORIGIN, "bad\nvalue");
        assert!(headers.is_empty());
    }
}
