use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operation states as the broker protocol spells them on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationKind {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
}

/// The persisted marker for the most recent broker operation on a record.
/// A record whose marker is `InProgress` must not be mutated by a new
/// operation until the marker reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastOperation {
    pub kind: OperationKind,
    pub state: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque operation token handed back by the broker for async replies;
    /// echoed on last_operation polls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_operation: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl LastOperation {
    pub fn new(kind: OperationKind, state: OperationState) -> Self {
        Self {
            kind,
            state,
            description: None,
            broker_operation: None,
            updated_at: Utc::now(),
        }
    }

    pub fn delete_in_progress() -> Self {
        Self::new(OperationKind::Delete, OperationState::InProgress)
    }

    pub fn delete_succeeded() -> Self {
        Self::new(OperationKind::Delete, OperationState::Succeeded)
    }

    pub fn delete_failed(description: impl Into<String>) -> Self {
        let mut op = Self::new(OperationKind::Delete, OperationState::Failed);
        op.description = Some(description.into());
        op
    }

    pub fn with_broker_operation(mut self, token: Option<String>) -> Self {
        self.broker_operation = token;
        self
    }

    pub fn in_progress(&self) -> bool {
        self.state == OperationState::InProgress
    }
}
