//! Errors - エラー型と分類
//!
//! - `ProviderError`: Cloud API Client（port）が返すエラー
//! - `StewardError`: poller / reconciler / invoker が呼び出し側に返すエラー
//!
//! 呼び出し側は文字列ではなく variant で分岐できます。

use thiserror::Error;

/// ErrorKind はプロバイダーエラーの分類
///
/// - Transient: 一時的なエラー（waiter は次の attempt で再確認する）
/// - Permanent: 恒久的なエラー（リソースが存在しない等、再試行は無意味）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

/// An error reported by the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn permanent(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Permanent,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

/// StewardError はドメインエラー
#[derive(Debug, Error)]
pub enum StewardError {
    #[error("Waiter \"{waiter_name}\" does not exist in \"{resource_kind}\" client.")]
    UnknownWaiter {
        resource_kind: String,
        waiter_name: String,
    },

    #[error(
        "You must specify a region. You can also configure your region by setting STEWARD_REGION."
    )]
    RegionRequired,

    #[error("failed to describe tags of {resource_id}: {source}")]
    TagFetchFailed {
        resource_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to update tags of {resource_id}: {source}")]
    MutationFailed {
        resource_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("waiter rejected: {reason}")]
    Rejected { reason: String },

    #[error("max attempts exceeded ({attempts})")]
    TimedOut { attempts: u32 },

    #[error("{service}.{operation} failed: {source}")]
    CallFailed {
        service: String,
        operation: String,
        #[source]
        source: ProviderError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl StewardError {
    /// Stable category name used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StewardError::UnknownWaiter { .. } => "unknown_waiter",
            StewardError::RegionRequired => "region_required",
            StewardError::TagFetchFailed { .. } => "tag_fetch_failed",
            StewardError::MutationFailed { .. } => "mutation_failed",
            StewardError::Rejected { .. } => "rejected",
            StewardError::TimedOut { .. } => "timed_out",
            StewardError::CallFailed { .. } => "call_failed",
            StewardError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_waiter_message_names_both_parts() {
        let err = StewardError::UnknownWaiter {
            resource_kind: "emr".into(),
            waiter_name: "bogus".into(),
        };
        assert_eq!(
            err.to_string(),
            "Waiter \"bogus\" does not exist in \"emr\" client."
        );
        assert_eq!(err.kind(), "unknown_waiter");
    }

    #[test]
    fn provider_error_is_kept_as_source() {
        let err = StewardError::MutationFailed {
            resource_id: "my-lb".into(),
            source: ProviderError::permanent("AccessDenied", "not allowed"),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "AccessDenied: not allowed");
        assert!(err.to_string().contains("my-lb"));
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(ProviderError::transient("Throttling", "slow down").is_retryable());
        assert!(!ProviderError::permanent("NotFound", "no such cluster").is_retryable());
    }
}
