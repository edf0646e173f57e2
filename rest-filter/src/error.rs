//! Error types shared across the filter stages

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, raised before any event is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required option `target`")]
    MissingTarget,

    #[error("option `target` must not be empty")]
    EmptyTarget,

    #[error("missing required option `request.url`")]
    MissingUrl,

    #[error("option `timeout_seconds` must be greater than zero")]
    InvalidTimeout,

    #[error("failed to read config from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors reported by an [`HttpClient`](crate::http_client::HttpClient) backend.
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Problems turning the request template into a concrete request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    #[error("failed to encode request body")]
    Encode(#[from] serde_json::Error),
}

/// Why a single event's request did not produce usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport-level failure: bad URL, DNS, connect, timeout, bad method.
    ClientError,
    /// The server answered with a non-2xx status.
    HttpError,
    /// 2xx with nothing usable in the body.
    EmptyResponse,
    /// `json` was enabled but the body was not valid JSON.
    ParseError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::ClientError => "client_error",
            FailureReason::HttpError => "http_error",
            FailureReason::EmptyResponse => "empty_response",
            FailureReason::ParseError => "parse_error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
