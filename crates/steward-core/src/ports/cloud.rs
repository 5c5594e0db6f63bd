//! CloudClient port - クラウドプロバイダー API の抽象化
//!
//! poller / reconciler / invoker はこの trait だけに依存します。
//! 認証情報やリージョンの解決は実装側の責務です。
//!
//! # 設計原則
//! - 1 メソッド = 1 リクエスト（バッチ化は provider 側に任せる）
//! - エラーは `ProviderError` の kind で Transient / Permanent を区別する
//! - waiter は `Waiter` trait に閉じ込め、provider 固有の設定変更を外に出さない

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Condition, Parameters, ProviderError, WaiterConfig};

/// A named condition check for one resource kind.
#[async_trait]
pub trait Waiter: Send + Sync {
    /// Provider defaults for this waiter.
    fn config(&self) -> WaiterConfig;

    /// Run one condition check.
    ///
    /// A `Permanent` error means the condition can never be met
    /// (e.g. the target resource does not exist).
    async fn check(&self, parameters: &Parameters) -> Result<Condition, ProviderError>;
}

#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Waiter names advertised for a resource kind.
    async fn waiter_names(&self, resource_kind: &str) -> Result<BTreeSet<String>, ProviderError>;

    async fn waiter(
        &self,
        resource_kind: &str,
        waiter_name: &str,
    ) -> Result<Box<dyn Waiter>, ProviderError>;

    async fn describe_tags(
        &self,
        resource_id: &str,
    ) -> Result<Vec<(String, String)>, ProviderError>;

    async fn add_tags(
        &self,
        resource_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError>;

    async fn remove_tags(&self, resource_id: &str, keys: &[String]) -> Result<(), ProviderError>;

    /// Call an arbitrary service operation and return its raw response.
    async fn call(
        &self,
        service: &str,
        operation: &str,
        parameters: &Parameters,
    ) -> Result<serde_json::Value, ProviderError>;
}
