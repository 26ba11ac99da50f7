use serde::{Deserialize, Serialize};

use crate::models::LastOperation;

/// Managed instances live behind a broker; user-provided ones exist only as
/// platform records. The tag drives audit event selection on delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstanceKind {
    #[serde(rename = "MANAGED")]
    Managed,
    #[serde(rename = "USER_PROVIDED")]
    UserProvided,
}

impl Default for InstanceKind {
    fn default() -> Self {
        Self::Managed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub space_id: String,
    #[serde(default)]
    pub kind: InstanceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,
    /// Spaces this instance is shared into beyond its own.
    #[serde(default)]
    pub shared_space_ids: Vec<String>,
}

impl ServiceInstance {
    pub fn operation_in_progress(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(LastOperation::in_progress)
    }

    pub fn shared(&self) -> bool {
        !self.shared_space_ids.is_empty()
    }

    pub fn managed(&self) -> bool {
        self.kind == InstanceKind::Managed
    }
}

/// Dependent-resource collections owned by one service instance. Each must
/// be gone before the instance itself can be deprovisioned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DependentKind {
    #[serde(rename = "SERVICE_BINDING")]
    Binding,
    #[serde(rename = "SERVICE_KEY")]
    Key,
    #[serde(rename = "ROUTE_BINDING")]
    RouteBinding,
}

impl std::fmt::Display for DependentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DependentKind::Binding => "service binding",
            DependentKind::Key => "service key",
            DependentKind::RouteBinding => "route binding",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceBinding {
    pub id: String,
    pub instance_id: String,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,
}

impl ServiceBinding {
    pub fn operation_in_progress(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(LastOperation::in_progress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceKey {
    pub id: String,
    pub instance_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,
}

impl ServiceKey {
    pub fn operation_in_progress(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(LastOperation::in_progress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteBinding {
    pub id: String,
    pub instance_id: String,
    pub route_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,
}

impl RouteBinding {
    pub fn operation_in_progress(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(LastOperation::in_progress)
    }
}
