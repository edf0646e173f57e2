//! Response reconciler — decides what an execution result does to the event

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::FilterConfig;
use crate::error::FailureReason;
use crate::event::Event;
use crate::executor::ExecutionResult;

/// What the reconciler did to an event. Exactly one per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Response data was written to the target field
    Merged,
    /// The fallback mapping was written to the target field
    FellBack(FailureReason),
    /// Target left untouched, failure tags added
    Tagged(FailureReason),
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    target: String,
    json: bool,
    fallback: Option<Map<String, Value>>,
    rest_failure_tags: Vec<String>,
    json_failure_tags: Vec<String>,
}

impl Reconciler {
    /// Expects a config that already passed [`FilterConfig::validate`].
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            target: config.target.clone().unwrap_or_default(),
            json: config.json,
            fallback: config.effective_fallback().cloned(),
            rest_failure_tags: config.tag_on_rest_failure.clone(),
            json_failure_tags: config.tag_on_json_failure.clone(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn apply(&self, result: ExecutionResult, event: &mut Event) -> Outcome {
        let reason = match result {
            ExecutionResult::Success { status, body } => match self.interpret(&body) {
                Ok(value) => {
                    debug!("HTTP {status}: writing response to [{}]", self.target);
                    event.set(&self.target, value);
                    return Outcome::Merged;
                }
                Err(reason) => reason,
            },
            ExecutionResult::Failure { reason, .. } => reason,
        };
        self.fail(reason, event)
    }

    /// Turn a 2xx body into the value to merge, or the reason it is unusable.
    fn interpret(&self, body: &str) -> Result<Value, FailureReason> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(FailureReason::EmptyResponse);
        }

        let parsed = serde_json::from_str::<Value>(trimmed);
        if let Ok(value) = &parsed {
            if is_empty_document(value) {
                return Err(FailureReason::EmptyResponse);
            }
        }

        if !self.json {
            return Ok(Value::String(trimmed.to_string()));
        }
        parsed.map_err(|e| {
            warn!("Response is not valid JSON: {e}");
            FailureReason::ParseError
        })
    }

    fn fail(&self, reason: FailureReason, event: &mut Event) -> Outcome {
        if let Some(fallback) = &self.fallback {
            info!("Request failed ({reason}), applying fallback to [{}]", self.target);
            event.set(&self.target, Value::Object(fallback.clone()));
            return Outcome::FellBack(reason);
        }

        for tag in &self.rest_failure_tags {
            event.tag(tag);
        }
        if reason == FailureReason::ParseError {
            for tag in &self.json_failure_tags {
                event.tag(tag);
            }
        }
        Outcome::Tagged(reason)
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
