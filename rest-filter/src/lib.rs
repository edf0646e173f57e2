//! rest-filter — enrich pipeline events with the result of an HTTP request
//!
//! For every event the filter:
//! - resolves the configured request template (`%{field}` interpolation when
//!   `sprintf` is enabled)
//! - performs a single, time-bounded HTTP call through an injected client
//! - merges the response, or a fallback, into the `target` field, or tags
//!   the event with `_restfailure`

pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod filter;
pub mod http_client;
pub mod reconcile;
pub mod request;
pub mod template;

pub use config::{AppConfig, BasicAuth, FilterConfig, RequestSpec};
pub use error::{ConfigError, FailureReason, HttpClientError, RequestError};
pub use event::Event;
pub use executor::ExecutionResult;
pub use filter::RestFilter;
pub use http_client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestClient};
pub use reconcile::Outcome;
