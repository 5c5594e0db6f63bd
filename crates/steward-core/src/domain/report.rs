//! Report model: the structured result printed by the command surface.
//!
//! Success reports always carry `changed`; failure reports carry a message
//! and the error category so scripts can branch without parsing text.

use serde::{Deserialize, Serialize};

use super::errors::StewardError;
use super::tags::TagSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub changed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,

    /// Raw provider response (operation calls only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl Report {
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            tags: None,
            response: None,
        }
    }

    pub fn with_tags(changed: bool, tags: TagSet) -> Self {
        Self {
            changed,
            tags: Some(tags),
            response: None,
        }
    }

    pub fn with_response(response: serde_json::Value) -> Self {
        Self {
            changed: true,
            tags: None,
            response: Some(response),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    pub kind: String,
}

impl From<&StewardError> for FailureReport {
    fn from(err: &StewardError) -> Self {
        Self {
            failed: true,
            msg: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_report_has_no_optional_fields() {
        let v = serde_json::to_value(Report::unchanged()).unwrap();
        assert_eq!(v, serde_json::json!({"changed": false}));
    }

    #[test]
    fn tag_report_includes_tags() {
        let tags: TagSet = [("env", "prod")].into_iter().collect();
        let v = serde_json::to_value(Report::with_tags(true, tags)).unwrap();
        assert_eq!(v, serde_json::json!({"changed": true, "tags": {"env": "prod"}}));
    }

    #[test]
    fn failure_report_carries_kind() {
        let report = FailureReport::from(&StewardError::TimedOut { attempts: 3 });
        assert!(report.failed);
        assert_eq!(report.kind, "timed_out");
        assert_eq!(report.msg, "max attempts exceeded (3)");
    }
}
