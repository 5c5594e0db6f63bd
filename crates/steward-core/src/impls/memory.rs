//! InMemoryCloud - 開発・テスト用の CloudClient 実装
//!
//! # 含まれるもの
//! - リソースごとのタグ（BTreeMap）
//! - スクリプト化された waiter（check ごとに 1 ステップ消費、最後のステップは繰り返し）
//! - operation ごとの固定レスポンス
//! - 呼び出し回数の記録（「ネットワーク呼び出しゼロ」をテストで確認するため）

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Condition, Parameters, ProviderError, TagSet, WaiterConfig};
use crate::ports::{CloudClient, Waiter};

/// One scripted answer of a waiter check.
pub type Step = Result<Condition, ProviderError>;

/// RegistryError は waiter 登録時のエラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Waiter '{waiter_name}' is already registered for '{resource_kind}'")]
    AlreadyRegistered {
        resource_kind: String,
        waiter_name: String,
    },
}

/// Waiter definition: provider defaults plus the answers it will give.
#[derive(Debug, Clone)]
pub struct WaiterScript {
    pub config: WaiterConfig,
    pub steps: Vec<Step>,
}

impl WaiterScript {
    pub fn new(config: WaiterConfig, steps: Vec<Step>) -> Self {
        Self { config, steps }
    }

    /// `Pending` for `attempt - 1` checks, then `Satisfied`.
    pub fn succeeds_on(attempt: u32) -> Self {
        let mut steps: Vec<Step> = (1..attempt).map(|_| Ok(Condition::Pending)).collect();
        steps.push(Ok(Condition::Satisfied));
        Self::new(default_waiter_config(), steps)
    }

    /// Never leaves `Pending`.
    pub fn never() -> Self {
        Self::new(default_waiter_config(), vec![Ok(Condition::Pending)])
    }

    pub fn with_config(mut self, config: WaiterConfig) -> Self {
        self.config = config;
        self
    }
}

/// boto 系 waiter の典型的な既定値
fn default_waiter_config() -> WaiterConfig {
    WaiterConfig::new(Duration::from_secs(15), 40)
}

/// Number of provider calls made so far, per method.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub waiter_names: AtomicU32,
    pub waiter: AtomicU32,
    pub checks: Arc<AtomicU32>,
    pub describe_tags: AtomicU32,
    pub add_tags: AtomicU32,
    pub remove_tags: AtomicU32,
    pub call: AtomicU32,
}

impl CallCounts {
    /// Calls that reach the provider's API (waiter metadata lookups are local).
    pub fn network(&self) -> u32 {
        self.checks.load(Ordering::Relaxed)
            + self.describe_tags.load(Ordering::Relaxed)
            + self.add_tags.load(Ordering::Relaxed)
            + self.remove_tags.load(Ordering::Relaxed)
            + self.call.load(Ordering::Relaxed)
    }

    pub fn mutations(&self) -> u32 {
        self.add_tags.load(Ordering::Relaxed) + self.remove_tags.load(Ordering::Relaxed)
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// In-memory cloud provider.
///
/// Build it with the `with_*` methods, then share it behind an `Arc`.
#[derive(Default)]
pub struct InMemoryCloud {
    resources: Mutex<BTreeMap<String, TagSet>>,
    waiters: HashMap<(String, String), WaiterScript>,
    operations: HashMap<(String, String), serde_json::Value>,
    mutation_error: Option<ProviderError>,
    calls: CallCounts,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>, tags: TagSet) -> Self {
        self.resources.get_mut().insert(resource_id.into(), tags);
        self
    }

    pub fn register_waiter(
        &mut self,
        resource_kind: impl Into<String>,
        waiter_name: impl Into<String>,
        script: WaiterScript,
    ) -> Result<(), RegistryError> {
        let key = (resource_kind.into(), waiter_name.into());
        if self.waiters.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered {
                resource_kind: key.0,
                waiter_name: key.1,
            });
        }
        self.waiters.insert(key, script);
        Ok(())
    }

    pub fn with_waiter(
        mut self,
        resource_kind: impl Into<String>,
        waiter_name: impl Into<String>,
        script: WaiterScript,
    ) -> Result<Self, RegistryError> {
        self.register_waiter(resource_kind, waiter_name, script)?;
        Ok(self)
    }

    pub fn with_operation(
        mut self,
        service: impl Into<String>,
        operation: impl Into<String>,
        response: serde_json::Value,
    ) -> Self {
        self.operations
            .insert((service.into(), operation.into()), response);
        self
    }

    /// Make every add/remove call fail with `error`.
    pub fn with_mutation_error(mut self, error: ProviderError) -> Self {
        self.mutation_error = Some(error);
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Current tags of every resource.
    pub async fn snapshot(&self) -> BTreeMap<String, TagSet> {
        self.resources.lock().await.clone()
    }

    fn not_found(resource_id: &str) -> ProviderError {
        ProviderError::permanent(
            "LoadBalancerNotFound",
            format!("There is no ACTIVE Load Balancer named '{resource_id}'"),
        )
    }

    fn check_mutation(&self) -> Result<(), ProviderError> {
        match &self.mutation_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct ScriptedWaiter {
    config: WaiterConfig,
    steps: Arc<[Step]>,
    cursor: AtomicUsize,
    checks: Arc<AtomicU32>,
}

#[async_trait]
impl Waiter for ScriptedWaiter {
    fn config(&self) -> WaiterConfig {
        self.config
    }

    async fn check(&self, _parameters: &Parameters) -> Result<Condition, ProviderError> {
        bump(&self.checks);
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        match self.steps.get(i).or_else(|| self.steps.last()) {
            Some(step) => step.clone(),
            None => Ok(Condition::Pending),
        }
    }
}

#[async_trait]
impl CloudClient for InMemoryCloud {
    async fn waiter_names(&self, resource_kind: &str) -> Result<BTreeSet<String>, ProviderError> {
        bump(&self.calls.waiter_names);
        Ok(self
            .waiters
            .keys()
            .filter(|(kind, _)| kind == resource_kind)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn waiter(
        &self,
        resource_kind: &str,
        waiter_name: &str,
    ) -> Result<Box<dyn Waiter>, ProviderError> {
        bump(&self.calls.waiter);
        let script = self
            .waiters
            .get(&(resource_kind.to_string(), waiter_name.to_string()))
            .ok_or_else(|| {
                ProviderError::permanent(
                    "UnknownWaiter",
                    format!("no waiter {waiter_name} for {resource_kind}"),
                )
            })?;
        Ok(Box::new(ScriptedWaiter {
            config: script.config,
            steps: script.steps.clone().into(),
            cursor: AtomicUsize::new(0),
            checks: Arc::clone(&self.calls.checks),
        }))
    }

    async fn describe_tags(
        &self,
        resource_id: &str,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        bump(&self.calls.describe_tags);
        let resources = self.resources.lock().await;
        let tags = resources
            .get(resource_id)
            .ok_or_else(|| Self::not_found(resource_id))?;
        Ok(tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }

    async fn add_tags(
        &self,
        resource_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        bump(&self.calls.add_tags);
        self.check_mutation()?;
        let mut resources = self.resources.lock().await;
        let current = resources
            .get_mut(resource_id)
            .ok_or_else(|| Self::not_found(resource_id))?;
        for (key, value) in tags {
            current.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn remove_tags(&self, resource_id: &str, keys: &[String]) -> Result<(), ProviderError> {
        bump(&self.calls.remove_tags);
        self.check_mutation()?;
        let mut resources = self.resources.lock().await;
        let current = resources
            .get_mut(resource_id)
            .ok_or_else(|| Self::not_found(resource_id))?;
        for key in keys {
            current.remove(key);
        }
        Ok(())
    }

    async fn call(
        &self,
        service: &str,
        operation: &str,
        _parameters: &Parameters,
    ) -> Result<serde_json::Value, ProviderError> {
        bump(&self.calls.call);
        self.operations
            .get(&(service.to_string(), operation.to_string()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::permanent(
                    "UnknownOperation",
                    format!("'{service}' client has no operation '{operation}'"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lb() -> InMemoryCloud {
        InMemoryCloud::new().with_resource("my-lb", [("env", "prod")].into_iter().collect())
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut cloud = InMemoryCloud::new();
        cloud
            .register_waiter("emr", "cluster_running", WaiterScript::never())
            .unwrap();
        let result = cloud.register_waiter("emr", "cluster_running", WaiterScript::never());
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered { .. })));
    }

    #[tokio::test]
    async fn waiter_names_are_scoped_by_kind() {
        let cloud = InMemoryCloud::new()
            .with_waiter("emr", "cluster_running", WaiterScript::never())
            .unwrap()
            .with_waiter("ec2", "instance_running", WaiterScript::never())
            .unwrap();

        let names = cloud.waiter_names("emr").await.unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["cluster_running"]);
    }

    #[tokio::test]
    async fn scripted_waiter_repeats_last_step() {
        let cloud = InMemoryCloud::new()
            .with_waiter("emr", "cluster_running", WaiterScript::succeeds_on(2))
            .unwrap();
        let waiter = cloud.waiter("emr", "cluster_running").await.unwrap();
        let params = Parameters::new();

        assert_eq!(waiter.check(&params).await.unwrap(), Condition::Pending);
        assert_eq!(waiter.check(&params).await.unwrap(), Condition::Satisfied);
        assert_eq!(waiter.check(&params).await.unwrap(), Condition::Satisfied);
        assert_eq!(cloud.calls().checks.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn add_and_remove_update_resource() {
        let cloud = lb();
        cloud
            .add_tags("my-lb", &[("tier".into(), "web".into())])
            .await
            .unwrap();
        cloud.remove_tags("my-lb", &["env".into()]).await.unwrap();

        let tags = cloud.describe_tags("my-lb").await.unwrap();
        assert_eq!(tags, vec![("tier".to_string(), "web".to_string())]);
        assert_eq!(cloud.calls().mutations(), 2);
    }

    #[tokio::test]
    async fn unknown_resource_is_permanent_error() {
        let err = lb().describe_tags("other").await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.code, "LoadBalancerNotFound");
    }

    #[tokio::test]
    async fn injected_mutation_error_is_returned() {
        let cloud = lb().with_mutation_error(ProviderError::permanent("AccessDenied", "nope"));
        let err = cloud
            .add_tags("my-lb", &[("a".into(), "b".into())])
            .await
            .unwrap_err();
        assert_eq!(err.code, "AccessDenied");
        assert_eq!(cloud.snapshot().await["my-lb"].len(), 1);
    }
}
