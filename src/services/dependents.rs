use std::sync::Arc;
use tracing::warn;

use crate::errors::{InstanceError, LifecycleError};
use crate::models::{
    DependentKind, LifecycleWarning, RouteBinding, ServiceBinding,
    ServiceInstance, ServiceKey,
};
use crate::storage::{
    BindingStorage, InstanceStorage, KeyStorage, RouteBindingStorage,
};

/// Deletes the service bindings of one instance. Every member is attempted
/// exactly once; failures are collected, never raised, so siblings still
/// get their attempt. Bindings whose own operation is in progress are
/// reported with the filterable in-progress kind instead of a hard failure.
pub struct ServiceBindingDelete {
    storage: Arc<dyn BindingStorage>,
}

impl ServiceBindingDelete {
    pub fn new(storage: Arc<dyn BindingStorage>) -> Self {
        Self { storage }
    }

    pub async fn delete(
        &self,
        bindings: Vec<ServiceBinding>,
    ) -> (Vec<LifecycleError>, Vec<LifecycleWarning>) {
        let mut errors = Vec::new();
        let warnings = Vec::new();
        for binding in bindings {
            if binding.operation_in_progress() {
                errors.push(
                    InstanceError::DependentOperationInProgress {
                        kind: DependentKind::Binding,
                        name: binding.id.clone(),
                    }
                    .into(),
                );
                continue;
            }
            if let Err(e) = self.storage.delete_binding(&binding.id).await {
                warn!(binding=%binding.id, error=%e, "binding delete failed");
                errors.push(
                    InstanceError::DependentDeleteFailed {
                        kind: DependentKind::Binding,
                        name: binding.id.clone(),
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
        (errors, warnings)
    }
}

pub struct ServiceKeyDelete {
    storage: Arc<dyn KeyStorage>,
}

impl ServiceKeyDelete {
    pub fn new(storage: Arc<dyn KeyStorage>) -> Self {
        Self { storage }
    }

    pub async fn delete(&self, keys: Vec<ServiceKey>) -> Vec<LifecycleError> {
        let mut errors = Vec::new();
        for key in keys {
            if key.operation_in_progress() {
                errors.push(
                    InstanceError::DependentOperationInProgress {
                        kind: DependentKind::Key,
                        name: key.name.clone(),
                    }
                    .into(),
                );
                continue;
            }
            if let Err(e) = self.storage.delete_key(&key.id).await {
                warn!(key=%key.id, error=%e, "service key delete failed");
                errors.push(
                    InstanceError::DependentDeleteFailed {
                        kind: DependentKind::Key,
                        name: key.name.clone(),
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
        errors
    }
}

pub struct RouteBindingDelete {
    storage: Arc<dyn RouteBindingStorage>,
}

impl RouteBindingDelete {
    pub fn new(storage: Arc<dyn RouteBindingStorage>) -> Self {
        Self { storage }
    }

    pub async fn delete(
        &self,
        bindings: Vec<RouteBinding>,
    ) -> Vec<LifecycleError> {
        let mut errors = Vec::new();
        for binding in bindings {
            if binding.operation_in_progress() {
                errors.push(
                    InstanceError::DependentOperationInProgress {
                        kind: DependentKind::RouteBinding,
                        name: binding.id.clone(),
                    }
                    .into(),
                );
                continue;
            }
            if let Err(e) =
                self.storage.delete_route_binding(&binding.id).await
            {
                warn!(route_binding=%binding.id, error=%e, "route binding delete failed");
                errors.push(
                    InstanceError::DependentDeleteFailed {
                        kind: DependentKind::RouteBinding,
                        name: binding.id.clone(),
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
        errors
    }
}

/// Withdraws cross-space shares. Shares are only removal candidates once
/// the instance has zero bindings and is actually shared; unshare failures
/// are collected per target space.
pub struct ServiceInstanceUnshare {
    instances: Arc<dyn InstanceStorage>,
    bindings: Arc<dyn BindingStorage>,
}

impl ServiceInstanceUnshare {
    pub fn new(
        instances: Arc<dyn InstanceStorage>,
        bindings: Arc<dyn BindingStorage>,
    ) -> Self {
        Self { instances, bindings }
    }

    pub async fn unshare_from_all_spaces(
        &self,
        instance: &ServiceInstance,
    ) -> Vec<LifecycleError> {
        let mut errors = Vec::new();

        // Re-fetch: binding deletion just ran and the share set must be
        // judged against current state.
        let current = match self.instances.get_instance(&instance.id).await {
            Ok(Some(current)) => current,
            Ok(None) => return errors,
            Err(e) => {
                errors.push(e.into());
                return errors;
            }
        };
        let remaining = match self.bindings.list_bindings(&current.id).await {
            Ok(bindings) => bindings,
            Err(e) => {
                errors.push(e.into());
                return errors;
            }
        };
        if !remaining.is_empty() || !current.shared() {
            return errors;
        }

        for space_id in &current.shared_space_ids {
            if let Err(e) = self
                .instances
                .remove_shared_space(&current.id, space_id)
                .await
            {
                warn!(
                    instance=%current.id,
                    space=%space_id,
                    error=%e,
                    "unshare failed"
                );
                errors.push(
                    InstanceError::UnshareFailed {
                        name: current.name.clone(),
                        space_id: space_id.clone(),
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
        errors
    }
}
