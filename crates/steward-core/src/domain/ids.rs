//! Invocation identifiers.
//!
//! 各 poll / reconcile / invoke の呼び出しに ULID を振り、tracing の span に載せます。
//! 時刻でソート可能なので、ログを並べたときに呼び出し順がそのまま読めます。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Correlates every log line emitted by one operation call.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvocationId(Ulid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}
