//! Pre-rendered CORS response headers and the normalization helpers behind them.
//!
//! Both tables are built once per policy. Entries whose value would be empty
//! are never stored, so writing a table never produces an empty header.

use std::collections::HashSet;

use smallvec::SmallVec;

use super::CorsConfig;

pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ACCESS_CONTROL_ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
pub const ACCESS_CONTROL_EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";
pub const ACCESS_CONTROL_ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ACCESS_CONTROL_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const ACCESS_CONTROL_MAX_AGE: &str = "Access-Control-Max-Age";
pub const VARY: &str = "Vary";

/// Ordered header name/value pairs with exact output casing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable(SmallVec<[(&'static str, String); 6]>);

impl HeaderTable {
    /// Store `value` under `name`; empty values are dropped
    fn insert(&mut self, name: &'static str, value: String) {
        if value.is_empty() {
            return;
        }
        self.0.retain(|(k, _)| *k != name);
        self.0.push((name, value));
    }

    /// Value stored for `name`, if any
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Trim and lowercase every value, keeping the first occurrence of each
///
/// Empty values are dropped.
#[must_use]
pub fn normalize<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let value = value.as_ref().trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

/// Canonical HTTP header casing: `x-user` becomes `X-User`
///
/// Names containing bytes that are not valid in an HTTP token are returned
/// unchanged.
#[must_use]
pub fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

fn render_header_list(values: &[String]) -> String {
    normalize(values)
        .iter()
        .map(|h| canonical_header_key(h))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_method_list(values: &[String]) -> String {
    normalize(values)
        .iter()
        .map(|m| m.to_uppercase())
        .collect::<Vec<_>>()
        .join(",")
}

/// Origin, credentials and `Vary` entries shared by both tables
fn origin_entries(table: &mut HeaderTable, config: &CorsConfig) {
    if config.allow_credentials {
        table.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string());
    }
    if config.allow_all_origins {
        table.insert(ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string());
    } else {
        // The allowed origin is echoed per request, so caches must key on it.
        table.insert(VARY, "Origin".to_string());
    }
}

/// Headers written on accepted simple (non-preflight) requests
#[must_use]
pub fn generate_normal_headers(config: &CorsConfig) -> HeaderTable {
    let mut table = HeaderTable::default();
    origin_entries(&mut table, config);
    table.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        render_header_list(&config.expose_headers),
    );
    table
}

/// Headers written on accepted preflight (`OPTIONS`) requests
#[must_use]
pub fn generate_preflight_headers(config: &CorsConfig) -> HeaderTable {
    let mut table = HeaderTable::default();
    origin_entries(&mut table, config);
    table.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        render_method_list(&config.allow_methods),
    );
    table.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        render_header_list(&config.allow_headers),
    );
    let max_age = config.max_age.as_secs();
    if max_age > 0 {
        table.insert(ACCESS_CONTROL_MAX_AGE, max_age.to_string());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_normalize() {
        let values = normalize(&["http-Access ", "Post", "POST", " poSt  ", "HTTP-Access", ""]);
        assert_eq!(values, vec!["http-access", "post"]);

        let empty: [&str; 0] = [];
        assert!(normalize(&empty).is_empty());
    }

    #[test]
    fn test_canonical_header_key() {
        assert_eq!(canonical_header_key("x-user"), "X-User");
        assert_eq!(canonical_header_key("xPassword"), "Xpassword");
        assert_eq!(canonical_header_key("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_header_key("a--b"), "A--B");
        assert_eq!(canonical_header_key("bad header"), "bad header");
    }

    #[test]
    fn test_normal_headers_allow_all_origins() {
        let header = generate_normal_headers(&CorsConfig::default());
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_ORIGIN), None);
        assert_eq!(header.get(VARY), Some("Origin"));
        assert_eq!(header.len(), 1);

        let header = generate_normal_headers(&CorsConfig {
            allow_all_origins: true,
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert_eq!(header.get(VARY), None);
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_normal_headers_allow_credentials() {
        let header = generate_normal_headers(&CorsConfig {
            allow_credentials: true,
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_CREDENTIALS), Some("true"));
        assert_eq!(header.get(VARY), Some("Origin"));
        assert_eq!(header.len(), 2);

        let header = generate_normal_headers(&CorsConfig::default());
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_CREDENTIALS), None);
    }

    #[test]
    fn test_normal_headers_expose_headers() {
        let header = generate_normal_headers(&CorsConfig {
            expose_headers: vec!["X-user".into(), "xPassword".into()],
            ..CorsConfig::default()
        });
        assert_eq!(
            header.get(ACCESS_CONTROL_EXPOSE_HEADERS),
            Some("X-User,Xpassword")
        );
        assert_eq!(header.get(VARY), Some("Origin"));
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_preflight_headers_origin_entries() {
        let header = generate_preflight_headers(&CorsConfig::default());
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_ORIGIN), None);
        assert_eq!(header.get(VARY), Some("Origin"));
        assert_eq!(header.len(), 1);

        let header = generate_preflight_headers(&CorsConfig {
            allow_all_origins: true,
            allow_credentials: true,
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_CREDENTIALS), Some("true"));
        assert_eq!(header.get(VARY), None);
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_preflight_headers_allow_methods() {
        let header = generate_preflight_headers(&CorsConfig {
            allow_methods: vec!["GET ".into(), "post".into(), "PUT".into(), " put  ".into()],
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_ALLOW_METHODS), Some("GET,POST,PUT"));
        assert_eq!(header.get(VARY), Some("Origin"));
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_preflight_headers_allow_headers() {
        let header = generate_preflight_headers(&CorsConfig {
            allow_headers: vec!["X-user".into(), "Content-Type".into()],
            ..CorsConfig::default()
        });
        assert_eq!(
            header.get(ACCESS_CONTROL_ALLOW_HEADERS),
            Some("X-User,Content-Type")
        );
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_preflight_headers_max_age() {
        let header = generate_preflight_headers(&CorsConfig {
            max_age: Duration::from_secs(12 * 60 * 60),
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_MAX_AGE), Some("43200"));
        assert_eq!(header.len(), 2);

        let header = generate_preflight_headers(&CorsConfig {
            max_age: Duration::from_millis(900),
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_MAX_AGE), None);
    }

    #[test]
    fn test_preflight_table_has_no_expose_headers() {
        let header = generate_preflight_headers(&CorsConfig {
            expose_headers: vec!["X-Total".into()],
            ..CorsConfig::default()
        });
        assert_eq!(header.get(ACCESS_CONTROL_EXPOSE_HEADERS), None);
    }
}
