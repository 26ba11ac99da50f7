use async_trait::async_trait;

use crate::errors::BrokerError;
use crate::models::{
    LastOperation, OperationState, ServiceBroker, ServiceInstance,
};

/// Reply to a deprovision call. `last_operation` carries the state the
/// caller must persist; `warnings` are non-fatal notes the broker attached
/// to the response.
#[derive(Debug, Clone)]
pub struct DeprovisionResponse {
    pub last_operation: LastOperation,
    pub warnings: Vec<String>,
}

impl DeprovisionResponse {
    pub fn succeeded() -> Self {
        Self {
            last_operation: LastOperation::delete_succeeded(),
            warnings: Vec::new(),
        }
    }

    pub fn in_progress(operation: Option<String>) -> Self {
        Self {
            last_operation: LastOperation::delete_in_progress()
                .with_broker_operation(operation),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LastOperationResponse {
    pub state: OperationState,
    pub description: Option<String>,
}

/// Outbound seam to a service broker. Transport and protocol failures are
/// raised as `BrokerError`; the orchestrators convert them into collected
/// per-instance errors at the deprovision boundary.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Ask the broker to deprovision `instance`. Brokers that cannot finish
    /// synchronously reply with an in-progress operation when
    /// `accepts_incomplete` is set, and reject the request otherwise.
    async fn deprovision(
        &self,
        instance: &ServiceInstance,
        accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError>;

    /// Poll the state of the instance's pending operation.
    async fn fetch_last_operation(
        &self,
        instance: &ServiceInstance,
    ) -> Result<LastOperationResponse, BrokerError>;

    /// Probe the broker's catalog endpoint; used by the creation workflow's
    /// synchronization job.
    async fn check_catalog(
        &self,
        broker: &ServiceBroker,
    ) -> Result<(), BrokerError>;
}
