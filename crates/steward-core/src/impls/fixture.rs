//! FixtureCloud - JSON ファイルで状態を持つ CloudClient
//!
//! CLI はこの実装を使います。起動時にファイルを読み込み、
//! タグの変更が成功するたびにファイルへ書き戻します。
//!
//! ```json
//! {
//!   "resources":  { "my-lb": { "Name": "uberlb" } },
//!   "waiters":    { "emr": { "cluster_running": {
//!                     "delay_secs": 30, "max_attempts": 50,
//!                     "steps": [ {"state": "pending"}, {"state": "satisfied"} ] } } },
//!   "operations": { "emr": { "list_clusters": { "Clusters": [] } } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::memory::{InMemoryCloud, Step, WaiterScript};
use crate::domain::{Condition, Parameters, ProviderError, StewardError, TagSet, WaiterConfig};
use crate::ports::{CloudClient, Waiter};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub resources: BTreeMap<String, TagSet>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub waiters: BTreeMap<String, BTreeMap<String, FixtureWaiter>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operations: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureWaiter {
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub steps: Vec<FixtureStep>,
}

fn default_delay_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    40
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureStep {
    Error { error: FixtureError },
    Condition(Condition),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub retryable: bool,
}

impl FixtureStep {
    fn to_step(&self) -> Step {
        match self {
            FixtureStep::Condition(condition) => Ok(condition.clone()),
            FixtureStep::Error { error } if error.retryable => Err(ProviderError::transient(
                error.code.clone(),
                error.message.clone(),
            )),
            FixtureStep::Error { error } => Err(ProviderError::permanent(
                error.code.clone(),
                error.message.clone(),
            )),
        }
    }
}

pub struct FixtureCloud {
    path: PathBuf,
    document: FixtureDocument,
    inner: InMemoryCloud,
}

impl FixtureCloud {
    /// Load a fixture document from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StewardError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| StewardError::Config(format!("cannot read {}: {e}", path.display())))?;
        let document: FixtureDocument = serde_json::from_str(&raw)
            .map_err(|e| StewardError::Config(format!("invalid fixture {}: {e}", path.display())))?;
        Self::from_document(path, document)
    }

    pub fn from_document(path: PathBuf, document: FixtureDocument) -> Result<Self, StewardError> {
        let mut inner = InMemoryCloud::new();
        for (resource_id, tags) in &document.resources {
            inner = inner.with_resource(resource_id.clone(), tags.clone());
        }
        for (kind, waiters) in &document.waiters {
            for (name, waiter) in waiters {
                let config =
                    WaiterConfig::new(Duration::from_secs(waiter.delay_secs), waiter.max_attempts);
                let steps = waiter.steps.iter().map(FixtureStep::to_step).collect();
                inner
                    .register_waiter(kind.clone(), name.clone(), WaiterScript::new(config, steps))
                    .map_err(|e| StewardError::Config(e.to_string()))?;
            }
        }
        for (service, operations) in &document.operations {
            for (operation, response) in operations {
                inner = inner.with_operation(service.clone(), operation.clone(), response.clone());
            }
        }
        Ok(Self {
            path,
            document,
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> Result<(), ProviderError> {
        let mut document = self.document.clone();
        document.resources = self.inner.snapshot().await;
        let body = serde_json::to_string_pretty(&document)
            .map_err(|e| ProviderError::permanent("FixtureWriteFailed", e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || std::fs::write(&path, body))
            .await
            .map_err(|e| ProviderError::permanent("FixtureWriteFailed", e.to_string()))?
            .map_err(|e| ProviderError::permanent("FixtureWriteFailed", e.to_string()))
    }
}

#[async_trait]
impl CloudClient for FixtureCloud {
    async fn waiter_names(&self, resource_kind: &str) -> Result<BTreeSet<String>, ProviderError> {
        self.inner.waiter_names(resource_kind).await
    }

    async fn waiter(
        &self,
        resource_kind: &str,
        waiter_name: &str,
    ) -> Result<Box<dyn Waiter>, ProviderError> {
        self.inner.waiter(resource_kind, waiter_name).await
    }

    async fn describe_tags(
        &self,
        resource_id: &str,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        self.inner.describe_tags(resource_id).await
    }

    async fn add_tags(
        &self,
        resource_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        self.inner.add_tags(resource_id, tags).await?;
        self.persist().await
    }

    async fn remove_tags(&self, resource_id: &str, keys: &[String]) -> Result<(), ProviderError> {
        self.inner.remove_tags(resource_id, keys).await?;
        self.persist().await
    }

    async fn call(
        &self,
        service: &str,
        operation: &str,
        parameters: &Parameters,
    ) -> Result<serde_json::Value, ProviderError> {
        self.inner.call(service, operation, parameters).await
    }
}
