//! Invoker - 任意の service operation をそのまま呼ぶ
//!
//! 冪等性は保証しないので、結果は常に changed = true として報告します。

use std::sync::Arc;

use tracing::{Instrument, debug, info_span};

use crate::domain::{InvocationId, Parameters, StewardError};
use crate::ports::CloudClient;

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub changed: bool,
    pub response: serde_json::Value,
}

pub struct Invoker {
    client: Arc<dyn CloudClient>,
}

impl Invoker {
    pub fn new(client: Arc<dyn CloudClient>) -> Self {
        Self { client }
    }

    pub async fn invoke(
        &self,
        service: &str,
        operation: &str,
        parameters: &Parameters,
    ) -> Result<Invocation, StewardError> {
        let span = info_span!(
            "invoke",
            invocation = %InvocationId::new(),
            %service,
            %operation
        );
        self.call(service, operation, parameters)
            .instrument(span)
            .await
    }

    async fn call(
        &self,
        service: &str,
        operation: &str,
        parameters: &Parameters,
    ) -> Result<Invocation, StewardError> {
        let response = self
            .client
            .call(service, operation, parameters)
            .await
            .map_err(|source| StewardError::CallFailed {
                service: service.to_string(),
                operation: operation.to_string(),
                source,
            })?;
        debug!("operation returned");
        Ok(Invocation {
            changed: true,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryCloud;
    use serde_json::json;

    fn invoker() -> Invoker {
        let cloud = InMemoryCloud::new().with_operation(
            "emr",
            "list_clusters",
            json!({"Clusters": [{"Id": "j-1", "Status": {"State": "RUNNING"}}]}),
        );
        Invoker::new(Arc::new(cloud))
    }

    #[tokio::test]
    async fn returns_raw_response_and_always_changed() {
        let result = invoker()
            .invoke("emr", "list_clusters", &Parameters::new())
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.response["Clusters"][0]["Id"], "j-1");
    }

    #[tokio::test]
    async fn unknown_operation_is_call_failed() {
        let err = invoker()
            .invoke("emr", "terminate_everything", &Parameters::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StewardError::CallFailed { ref operation, .. } if operation == "terminate_everything"
        ));
        assert_eq!(err.kind(), "call_failed");
    }
}
