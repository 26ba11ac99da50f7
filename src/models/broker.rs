use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceBroker {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    /// Space-scoped brokers belong to one space; None means platform-wide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
}

/// Catalog synchronization state for a broker, written alongside the broker
/// record at creation and flipped by the synchronization job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BrokerSyncState {
    #[serde(rename = "SYNCHRONIZING")]
    Synchronizing,
    #[serde(rename = "AVAILABLE")]
    Available,
    #[serde(rename = "SYNCHRONIZATION_FAILED")]
    SynchronizationFailed,
}
