use thiserror::Error;

use crate::models::DependentKind;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Service instance error: {0}")]
    Instance(#[from] InstanceError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Invalid service broker: {0}")]
    InvalidBroker(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    /// True for children that are still converging rather than broken;
    /// callers may choose to retry later instead of treating the cascade
    /// as permanently failed.
    pub fn is_dependent_in_progress(&self) -> bool {
        matches!(
            self,
            LifecycleError::Instance(
                InstanceError::DependentOperationInProgress { .. }
            )
        )
    }
}

#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("An operation for service instance {0} is in progress")]
    OperationInProgress(String),

    #[error("An operation for the {kind} {name} is in progress")]
    DependentOperationInProgress { kind: DependentKind, name: String },

    #[error("Failed to delete {kind} {name}: {message}")]
    DependentDeleteFailed {
        kind: DependentKind,
        name: String,
        message: String,
    },

    #[error(
        "Failed to unshare service instance {name} from space {space_id}: {message}"
    )]
    UnshareFailed {
        name: String,
        space_id: String,
        message: String,
    },

    #[error(
        "Deletion of service instance {name} failed because one or more associated resources could not be deleted.\n\n{nested}"
    )]
    RecursiveDeleteFailed { name: String, nested: String },
}

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Broker request failed with status: {0}")]
    RequestFailed(reqwest::StatusCode),

    #[error("Broker reported the operation failed: {0}")]
    OperationFailed(String),

    #[error("Malformed broker response: {0}")]
    MalformedResponse(String),

    #[error("Broker client configuration error: {0}")]
    Configuration(String),
}

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Service instance {0} is being operated on by another task")]
    Unavailable(String),
}
