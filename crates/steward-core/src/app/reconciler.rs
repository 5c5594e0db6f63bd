//! Reconciler - リソースのタグを desired に合わせる
//!
//! - **Present**: 欠けている／値が違うタグだけを 1 回の add で追加
//! - **Absent**: key と値の両方が一致するタグだけを 1 回の remove で削除
//! - **List**: 取得して返すだけ
//!
//! dry-run では mutation を呼ばず、結果のタグを diff から合成します。
//! 実行パスと dry-run パスは同じ `TagSet` を返します。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span};

use crate::domain::{DesiredTags, InvocationId, StewardError, TagDiff, TagSet};
use crate::ports::CloudClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    #[default]
    Present,
    Absent,
    List,
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TagMode::Present => "present",
            TagMode::Absent => "absent",
            TagMode::List => "list",
        };
        f.write_str(s)
    }
}

impl FromStr for TagMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(TagMode::Present),
            "absent" => Ok(TagMode::Absent),
            "list" => Ok(TagMode::List),
            other => Err(format!(
                "invalid state '{other}', expected one of: present, absent, list"
            )),
        }
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub changed: bool,
    pub tags: TagSet,
    /// Mutations that were applied (or would have been, on a dry run).
    pub diff: TagDiff,
}

impl Reconciliation {
    fn unchanged(tags: TagSet) -> Self {
        Self {
            changed: false,
            tags,
            diff: TagDiff::default(),
        }
    }
}

pub struct Reconciler {
    client: Arc<dyn CloudClient>,
}

impl Reconciler {
    pub fn new(client: Arc<dyn CloudClient>) -> Self {
        Self { client }
    }

    pub async fn reconcile(
        &self,
        mode: TagMode,
        resource_id: &str,
        desired: &DesiredTags,
        dry_run: bool,
    ) -> Result<Reconciliation, StewardError> {
        let span = info_span!(
            "reconcile",
            invocation = %InvocationId::new(),
            resource = %resource_id,
            %mode,
            dry_run
        );
        self.run(mode, resource_id, desired, dry_run)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        mode: TagMode,
        resource_id: &str,
        desired: &DesiredTags,
        dry_run: bool,
    ) -> Result<Reconciliation, StewardError> {
        let actual = self.fetch(resource_id).await?;

        let diff = match mode {
            TagMode::List => return Ok(Reconciliation::unchanged(actual)),
            TagMode::Present => TagDiff::for_present(&actual, desired),
            TagMode::Absent => TagDiff::for_absent(&actual, desired),
        };
        debug!(
            to_add = diff.to_add.len(),
            to_remove = diff.to_remove.len(),
            "computed tag diff",
        );
        if diff.is_empty() {
            return Ok(Reconciliation::unchanged(actual));
        }

        let tags = if dry_run {
            diff.apply_to(&actual)
        } else {
            self.apply(resource_id, &diff).await?;
            self.fetch(resource_id).await?
        };

        Ok(Reconciliation {
            changed: true,
            tags,
            diff,
        })
    }

    async fn fetch(&self, resource_id: &str) -> Result<TagSet, StewardError> {
        let pairs = self
            .client
            .describe_tags(resource_id)
            .await
            .map_err(|source| StewardError::TagFetchFailed {
                resource_id: resource_id.to_string(),
                source,
            })?;
        Ok(pairs.into_iter().collect())
    }

    async fn apply(&self, resource_id: &str, diff: &TagDiff) -> Result<(), StewardError> {
        let result = if !diff.to_add.is_empty() {
            info!(count = diff.to_add.len(), "adding tags");
            self.client.add_tags(resource_id, &diff.to_add).await
        } else {
            info!(count = diff.to_remove.len(), "removing tags");
            self.client.remove_tags(resource_id, &diff.to_remove).await
        };
        result.map_err(|source| StewardError::MutationFailed {
            resource_id: resource_id.to_string(),
            source,
        })
    }
}
