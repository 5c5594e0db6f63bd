//! Wait model: what to poll for, how often, and how it ended.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::StewardError;

/// Opaque operation parameters forwarded verbatim to the provider.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Polling cadence of a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterConfig {
    /// Pause between two condition checks.
    pub delay: Duration,

    /// Maximum number of condition checks.
    pub max_attempts: u32,
}

impl WaiterConfig {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    /// Apply caller overrides on top of provider defaults.
    ///
    /// At least one check is always made, so `max_attempts` never ends up 0.
    pub fn with_overrides(self, delay: Option<Duration>, max_attempts: Option<u32>) -> Self {
        Self {
            delay: delay.unwrap_or(self.delay),
            max_attempts: max_attempts.unwrap_or(self.max_attempts).max(1),
        }
    }
}

/// A request to wait for a named condition on a resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitSpec {
    pub resource_kind: String,
    pub waiter_name: String,
    pub parameters: Parameters,
    pub delay: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl WaitSpec {
    pub fn new(resource_kind: impl Into<String>, waiter_name: impl Into<String>) -> Self {
        Self {
            resource_kind: resource_kind.into(),
            waiter_name: waiter_name.into(),
            parameters: Parameters::new(),
            delay: None,
            max_attempts: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// What a single condition check observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Condition {
    /// Target state reached.
    Satisfied,
    /// Not there yet; check again later.
    Pending,
    /// The resource entered a state from which the target is unreachable.
    Failed(String),
}

/// Terminal result of one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitOutcome {
    Succeeded { attempts: u32 },
    TimedOut { attempts: u32 },
    Rejected { reason: String },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded { .. })
    }

    /// Turn the failing outcomes into errors for callers that only care about success.
    pub fn into_result(self) -> Result<u32, StewardError> {
        match self {
            WaitOutcome::Succeeded { attempts } => Ok(attempts),
            WaitOutcome::TimedOut { attempts } => Err(StewardError::TimedOut { attempts }),
            WaitOutcome::Rejected { reason } => Err(StewardError::Rejected { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let defaults = WaiterConfig::new(Duration::from_secs(15), 40);

        let cfg = defaults.with_overrides(None, None);
        assert_eq!(cfg, defaults);

        let cfg = defaults.with_overrides(Some(Duration::from_secs(1)), Some(3));
        assert_eq!(cfg, WaiterConfig::new(Duration::from_secs(1), 3));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let cfg = WaiterConfig::new(Duration::ZERO, 5).with_overrides(None, Some(0));
        assert_eq!(cfg.max_attempts, 1);
    }

    #[test]
    fn into_result_maps_failures() {
        assert_eq!(WaitOutcome::Succeeded { attempts: 2 }.into_result().unwrap(), 2);

        let err = WaitOutcome::TimedOut { attempts: 3 }.into_result().unwrap_err();
        assert!(matches!(err, StewardError::TimedOut { attempts: 3 }));

        let err = WaitOutcome::Rejected { reason: "gone".into() }
            .into_result()
            .unwrap_err();
        assert!(matches!(err, StewardError::Rejected { .. }));
    }

    #[test]
    fn condition_serializes_with_state_tag() {
        let v = serde_json::to_value(Condition::Failed("terminated".into())).unwrap();
        assert_eq!(v, serde_json::json!({"state": "failed", "reason": "terminated"}));

        let c: Condition = serde_json::from_value(serde_json::json!({"state": "pending"})).unwrap();
        assert_eq!(c, Condition::Pending);
    }
}
