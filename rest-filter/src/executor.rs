//! HTTP executor — one bounded attempt per request, never fails outward

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::FailureReason;
use crate::http_client::{HttpClient, HttpRequest};

/// Outcome of a single request, consumed by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success { status: u16, body: String },
    Failure {
        reason: FailureReason,
        status: Option<u16>,
    },
}

impl ExecutionResult {
    pub fn failure(reason: FailureReason) -> Self {
        ExecutionResult::Failure {
            reason,
            status: None,
        }
    }
}

pub struct Executor<C> {
    client: C,
    timeout: Duration,
}

impl<C: HttpClient> Executor<C> {
    pub fn new(client: C, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn execute(&self, request: HttpRequest) -> ExecutionResult {
        let method = request.method;
        let url = request.url.clone();
        let start = Instant::now();

        let response = match tokio::time::timeout(self.timeout, self.client.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("{method} {url} failed: {e}");
                return ExecutionResult::failure(FailureReason::ClientError);
            }
            Err(_) => {
                warn!(
                    "{method} {url} timed out after {}ms",
                    self.timeout.as_millis()
                );
                return ExecutionResult::failure(FailureReason::ClientError);
            }
        };

        let latency = start.elapsed().as_millis();
        if response.is_success() {
            debug!("{method} {url} -> {} in {latency}ms", response.status);
            ExecutionResult::Success {
                status: response.status,
                body: response.body,
            }
        } else {
            warn!("{method} {url} returned HTTP {}", response.status);
            ExecutionResult::Failure {
                reason: FailureReason::HttpError,
                status: Some(response.status),
            }
        }
    }
}
