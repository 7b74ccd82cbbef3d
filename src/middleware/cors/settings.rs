//! File-based CORS configuration.
//!
//! [`CorsSettings`] mirrors every serializable field of [`CorsConfig`] so a
//! policy can live in `config.yaml` (or JSON) next to the rest of a service's
//! configuration. Omitted keys keep their [`CorsConfig::default()`] values.
//!
//! ```yaml
//! allow_origins:
//!   - https://example.com
//!   - https://*.example.com
//! allow_wildcard: true
//! allow_methods: [GET, POST]
//! allow_headers: [Content-Type, Authorization]
//! expose_headers: [X-Total-Count]
//! allow_credentials: true
//! max_age_secs: 3600
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::CorsConfig;

/// Deserializable CORS settings
///
/// The custom origin validator cannot be expressed in a file; attach it to
/// the [`CorsConfig`] returned by [`CorsSettings::into_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsSettings {
    pub allow_all_origins: bool,
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age_secs: u64,
    pub allow_wildcard: bool,
    pub allow_browser_extensions: bool,
    pub allow_web_sockets: bool,
    pub allow_files: bool,
}

impl CorsSettings {
    /// Load settings from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading CORS settings from {}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        parsed.with_context(|| format!("parsing CORS settings in {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Convert into a programmatic configuration (no origin validator)
    #[must_use]
    pub fn into_config(self) -> CorsConfig {
        CorsConfig {
            allow_all_origins: self.allow_all_origins,
            allow_origins: self.allow_origins,
            allow_origin_fn: None,
            allow_methods: self.allow_methods,
            allow_headers: self.allow_headers,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: Duration::from_secs(self.max_age_secs),
            allow_wildcard: self.allow_wildcard,
            allow_browser_extensions: self.allow_browser_extensions,
            allow_web_sockets: self.allow_web_sockets,
            allow_files: self.allow_files,
        }
    }
}

impl From<&CorsConfig> for CorsSettings {
    fn from(config: &CorsConfig) -> Self {
        Self {
            allow_all_origins: config.allow_all_origins,
            allow_origins: config.allow_origins.clone(),
            allow_methods: config.allow_methods.clone(),
            allow_headers: config.allow_headers.clone(),
            allow_credentials: config.allow_credentials,
            expose_headers: config.expose_headers.clone(),
            max_age_secs: config.max_age.as_secs(),
            allow_wildcard: config.allow_wildcard,
            allow_browser_extensions: config.allow_browser_extensions,
            allow_web_sockets: config.allow_web_sockets,
            allow_files: config.allow_files,
        }
    }
}
