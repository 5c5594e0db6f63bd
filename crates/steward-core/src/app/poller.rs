//! Poller - waiter を終端状態まで回す
//!
//! 1. waiter 名を検証（未登録なら check を 1 回も呼ばずに UnknownWaiter）
//! 2. provider の既定値に delay / max_attempts の上書きを適用
//! 3. check → 待機 → check ... を max_attempts 回まで繰り返す
//!
//! リソースの状態は観測するだけで変更しません。future を drop すれば中断できます。

use std::sync::Arc;

use tracing::{Instrument, debug, info_span, warn};

use crate::domain::{Condition, InvocationId, StewardError, WaitOutcome, WaitSpec};
use crate::ports::{Clock, CloudClient, SystemClock};

pub struct Poller {
    client: Arc<dyn CloudClient>,
    clock: Arc<dyn Clock>,
}

impl Poller {
    pub fn new(client: Arc<dyn CloudClient>) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: Arc<dyn CloudClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// Poll until the waiter reaches a terminal state or runs out of attempts.
    ///
    /// `Err` is returned only when the wait could not start (unknown waiter,
    /// waiter lookup failure); every polled result is a `WaitOutcome`.
    pub async fn wait(&self, spec: &WaitSpec) -> Result<WaitOutcome, StewardError> {
        let span = info_span!(
            "wait",
            invocation = %InvocationId::new(),
            kind = %spec.resource_kind,
            waiter = %spec.waiter_name
        );
        self.poll(spec).instrument(span).await
    }

    async fn poll(&self, spec: &WaitSpec) -> Result<WaitOutcome, StewardError> {
        let names = self
            .client
            .waiter_names(&spec.resource_kind)
            .await
            .map_err(|e| StewardError::Rejected {
                reason: e.to_string(),
            })?;
        if !names.contains(&spec.waiter_name) {
            return Err(StewardError::UnknownWaiter {
                resource_kind: spec.resource_kind.clone(),
                waiter_name: spec.waiter_name.clone(),
            });
        }

        let waiter = self
            .client
            .waiter(&spec.resource_kind, &spec.waiter_name)
            .await
            .map_err(|e| StewardError::Rejected {
                reason: e.to_string(),
            })?;
        let config = waiter.config().with_overrides(spec.delay, spec.max_attempts);
        debug!(
            delay = ?config.delay,
            max_attempts = config.max_attempts,
            "polling",
        );

        for attempt in 1..=config.max_attempts {
            match waiter.check(&spec.parameters).await {
                Ok(Condition::Satisfied) => {
                    debug!(attempt, "condition satisfied");
                    return Ok(WaitOutcome::Succeeded { attempts: attempt });
                }
                Ok(Condition::Failed(reason)) => {
                    debug!(attempt, %reason, "terminal failure state");
                    return Ok(WaitOutcome::Rejected { reason });
                }
                Ok(Condition::Pending) => debug!(attempt, "condition pending"),
                Err(err) if err.is_retryable() => {
                    warn!(attempt, error = %err, "transient provider error");
                }
                Err(err) => {
                    debug!(attempt, error = %err, "non-retryable provider error");
                    return Ok(WaitOutcome::Rejected {
                        reason: err.to_string(),
                    });
                }
            }

            if attempt < config.max_attempts {
                self.clock.sleep(config.delay).await;
            }
        }

        Ok(WaitOutcome::TimedOut {
            attempts: config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderError, WaiterConfig};
    use crate::impls::{InMemoryCloud, WaiterScript};
    use crate::ports::RecordingClock;
    use rstest::rstest;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn setup(script: WaiterScript) -> (Arc<InMemoryCloud>, Arc<RecordingClock>, Poller) {
        let cloud = Arc::new(
            InMemoryCloud::new()
                .with_waiter("emr", "cluster_running", script)
                .unwrap(),
        );
        let clock = Arc::new(RecordingClock::new());
        let poller = Poller::with_clock(cloud.clone(), clock.clone());
        (cloud, clock, poller)
    }

    fn spec() -> WaitSpec {
        WaitSpec::new("emr", "cluster_running")
    }

    #[tokio::test]
    async fn unknown_waiter_fails_without_network_calls() {
        let (cloud, clock, poller) = setup(WaiterScript::succeeds_on(1));

        let err = poller.wait(&WaitSpec::new("emr", "bogus")).await.unwrap_err();

        assert!(matches!(
            err,
            StewardError::UnknownWaiter { ref resource_kind, ref waiter_name }
                if resource_kind == "emr" && waiter_name == "bogus"
        ));
        assert_eq!(cloud.calls().network(), 0);
        assert_eq!(cloud.calls().waiter.load(Ordering::Relaxed), 0);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn unknown_resource_kind_is_unknown_waiter() {
        let (_, _, poller) = setup(WaiterScript::never());
        let err = poller
            .wait(&WaitSpec::new("s3", "cluster_running"))
            .await
            .unwrap_err();
        assert!(matches!(err, StewardError::UnknownWaiter { .. }));
    }

    #[tokio::test]
    async fn succeeds_on_third_of_five_attempts() {
        let (cloud, clock, poller) = setup(WaiterScript::succeeds_on(3));

        let outcome = poller
            .wait(&spec().with_max_attempts(5).with_delay(Duration::from_secs(2)))
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Succeeded { attempts: 3 });
        assert_eq!(cloud.calls().checks.load(Ordering::Relaxed), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn times_out_after_max_attempts() {
        let (cloud, clock, poller) = setup(WaiterScript::never());

        let outcome = poller.wait(&spec().with_max_attempts(3)).await.unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut { attempts: 3 });
        assert_eq!(cloud.calls().checks.load(Ordering::Relaxed), 3);
        // no pause after the last attempt
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[rstest]
    #[case::first(1, 1)]
    #[case::last(4, 4)]
    #[tokio::test]
    async fn reports_attempts_used(#[case] succeed_on: u32, #[case] expected: u32) {
        let (_, _, poller) = setup(WaiterScript::succeeds_on(succeed_on));
        let outcome = poller.wait(&spec().with_max_attempts(4)).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Succeeded { attempts: expected });
    }

    #[tokio::test]
    async fn provider_defaults_apply_without_overrides() {
        let script = WaiterScript::never()
            .with_config(WaiterConfig::new(Duration::from_secs(30), 2));
        let (_, clock, poller) = setup(script);

        let outcome = poller.wait(&spec()).await.unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut { attempts: 2 });
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(30)]);
    }

    #[tokio::test]
    async fn oversized_delay_is_slept_unchanged() {
        let (_, clock, poller) = setup(WaiterScript::never());

        let outcome = poller
            .wait(&spec().with_max_attempts(2).with_delay(Duration::MAX))
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut { attempts: 2 });
        assert_eq!(clock.sleeps(), vec![Duration::MAX]);
    }

    #[tokio::test]
    async fn permanent_error_is_rejected_without_retry() {
        let script = WaiterScript::new(
            WaiterConfig::new(Duration::from_secs(1), 10),
            vec![Err(ProviderError::permanent(
                "ClusterNotFound",
                "Cluster j-XXXX does not exist",
            ))],
        );
        let (cloud, _, poller) = setup(script);

        let outcome = poller.wait(&spec()).await.unwrap();

        assert_eq!(
            outcome,
            WaitOutcome::Rejected {
                reason: "ClusterNotFound: Cluster j-XXXX does not exist".into()
            }
        );
        assert_eq!(cloud.calls().checks.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn transient_error_consumes_an_attempt_and_continues() {
        let script = WaiterScript::new(
            WaiterConfig::new(Duration::from_secs(1), 5),
            vec![
                Err(ProviderError::transient("Throttling", "Rate exceeded")),
                Ok(Condition::Satisfied),
            ],
        );
        let (_, _, poller) = setup(script);

        let outcome = poller.wait(&spec()).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Succeeded { attempts: 2 });
    }

    #[tokio::test]
    async fn terminal_failure_state_is_rejected() {
        let script = WaiterScript::new(
            WaiterConfig::new(Duration::from_secs(1), 5),
            vec![
                Ok(Condition::Pending),
                Ok(Condition::Failed("cluster TERMINATED_WITH_ERRORS".into())),
            ],
        );
        let (_, _, poller) = setup(script);

        let outcome = poller.wait(&spec()).await.unwrap();
        assert!(matches!(outcome, WaitOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn repeated_waits_are_independent() {
        let (_, _, poller) = setup(WaiterScript::succeeds_on(2));
        let first = poller.wait(&spec()).await.unwrap();
        let second = poller.wait(&spec()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn system_clock_spaces_attempts_by_delay() {
        let cloud = Arc::new(
            InMemoryCloud::new()
                .with_waiter("emr", "cluster_running", WaiterScript::succeeds_on(3))
                .unwrap(),
        );
        let poller = Poller::new(cloud);
        let start = tokio::time::Instant::now();

        let outcome = poller
            .wait(&spec().with_delay(Duration::from_secs(10)))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert!(start.elapsed() >= Duration::from_secs(20));
    }
}
