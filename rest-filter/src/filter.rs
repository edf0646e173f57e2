//! RestFilter — wires request building, execution and reconciliation

use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::error::{ConfigError, FailureReason};
use crate::event::Event;
use crate::executor::{ExecutionResult, Executor};
use crate::http_client::{HttpClient, ReqwestClient};
use crate::reconcile::{Outcome, Reconciler};
use crate::request::RequestTemplate;

/// A configured filter instance.
///
/// Holds only read-only state after construction, so one instance can be
/// shared between tasks that each process their own events.
pub struct RestFilter<C> {
    template: RequestTemplate,
    executor: Executor<C>,
    reconciler: Reconciler,
}

impl RestFilter<ReqwestClient> {
    /// Build a filter with the production HTTP client.
    pub fn from_config(config: FilterConfig) -> Result<Self, ConfigError> {
        let client = ReqwestClient::new(config.timeout());
        Self::new(config, client)
    }
}

impl<C: HttpClient> RestFilter<C> {
    pub fn new(config: FilterConfig, client: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            template: RequestTemplate::from_config(&config),
            executor: Executor::new(client, config.timeout()),
            reconciler: Reconciler::from_config(&config),
        })
    }

    pub fn target(&self) -> &str {
        self.reconciler.target()
    }

    pub fn client(&self) -> &C {
        self.executor.client()
    }

    /// Run one event through the filter. Per-event failures never escape;
    /// they show up as a fallback value or failure tags on the event.
    pub async fn filter(&self, event: &mut Event) -> Outcome {
        let result = match self.template.build(&*event) {
            Ok(request) => {
                debug!("Sending {} {}", request.method, request.url);
                self.executor.execute(request).await
            }
            Err(e) => {
                warn!("Could not build request: {e}");
                ExecutionResult::failure(FailureReason::ClientError)
            }
        };
        self.reconciler.apply(result, event)
    }
}
