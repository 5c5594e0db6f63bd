//! Domain model (tags, waits, errors, reports, ids).

pub mod errors;
pub mod ids;
pub mod report;
pub mod tags;
pub mod wait;

pub use self::errors::{ErrorKind, ProviderError, StewardError};
pub use self::ids::InvocationId;
pub use self::report::{FailureReport, Report};
pub use self::tags::{DesiredTags, TagDiff, TagSet, TagValue};
pub use self::wait::{Condition, Parameters, WaitOutcome, WaitSpec, WaiterConfig};
