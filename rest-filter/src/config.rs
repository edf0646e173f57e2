//! Filter configuration loading, parsing and validation

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::event::parse_path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/rest-filter/filter.toml";
pub const CONFIG_ENV_VAR: &str = "REST_FILTER_CONFIG";

/// Root of the config file
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log: LogConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Options of a single rest filter instance
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub request: RequestSpec,
    /// Parse the response body as JSON instead of keeping raw text
    #[serde(default)]
    pub json: bool,
    /// Enable `%{field}` interpolation in url, headers, params and body
    #[serde(default)]
    pub sprintf: bool,
    pub target: Option<String>,
    /// Written to `target` instead of tagging when the request fails
    #[serde(default)]
    pub fallback: Option<Map<String, Value>>,
    #[serde(default = "default_rest_failure_tags")]
    pub tag_on_rest_failure: Vec<String>,
    #[serde(default = "default_json_failure_tags")]
    pub tag_on_json_failure: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Declarative request template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSpec {
    pub url: Option<String>,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
    #[serde(default)]
    pub body: Option<Map<String, Value>>,
    #[serde(default)]
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl FilterConfig {
    /// Minimal config for `url` writing into `target`, everything else default.
    pub fn new(url: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            request: RequestSpec {
                url: Some(url.into()),
                method: default_method(),
                ..RequestSpec::default()
            },
            json: false,
            sprintf: false,
            target: Some(target.into()),
            fallback: None,
            tag_on_rest_failure: default_rest_failure_tags(),
            tag_on_json_failure: default_json_failure_tags(),
            timeout_seconds: default_timeout(),
        }
    }

    /// Reject configs the filter cannot run with. Runs once, before any
    /// event is processed; `method` is only checked per request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.target.as_deref() {
            None => return Err(ConfigError::MissingTarget),
            // Anything without an addressable segment ("", " ", ".", "[]")
            Some(t) if parse_path(t).is_empty() => return Err(ConfigError::EmptyTarget),
            Some(_) => {}
        }
        match self.request.url.as_deref() {
            Some(url) if !url.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingUrl),
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The fallback mapping, if one is configured and non-empty.
    pub fn effective_fallback(&self) -> Option<&Map<String, Value>> {
        self.fallback.as_ref().filter(|f| !f.is_empty())
    }
}

fn default_log_level() -> String { "info".into() }
fn default_method() -> String { "get".into() }
fn default_rest_failure_tags() -> Vec<String> { vec!["_restfailure".into()] }
fn default_json_failure_tags() -> Vec<String> { vec!["_jsonparsefailure".into()] }
fn default_timeout() -> u64 { 30 }

/// Resolve the config path: env var, then first CLI argument, then the default.
pub fn config_path(arg: Option<String>) -> PathBuf {
    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .or(arg)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

pub fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate the config file at `path`
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, path)?;
    config.filter.validate()?;
    Ok(config)
}
