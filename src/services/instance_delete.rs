use std::sync::Arc;
use tracing::{info, warn};

use crate::broker::BrokerClient;
use crate::config::ReconcilePolicyConfig;
use crate::errors::{BrokerError, InstanceError, LifecycleError};
use crate::events::EventRecorder;
use crate::jobs::JobScheduler;
use crate::models::{
    LifecycleWarning, OperationState, ServiceInstance,
};
use crate::services::{
    DeleterLock, InstanceStateFetchJob, RouteBindingDelete,
    ServiceBindingDelete, ServiceInstanceUnshare, ServiceKeyDelete,
};
use crate::storage::ServiceStores;

/// Cascading delete of service instances.
///
/// Instances in a batch are processed independently; per-instance failures
/// are collected, never raised. Dependents are removed before the instance
/// itself because brokers reject deprovision of instances with live
/// bindings, and a partially cleaned instance is reported as one aggregate
/// error rather than silently abandoned.
pub struct ServiceInstanceDelete {
    stores: ServiceStores,
    broker: Arc<dyn BrokerClient>,
    scheduler: Arc<dyn JobScheduler>,
    events: Arc<dyn EventRecorder>,
    accepts_incomplete: bool,
    reconcile_policy: ReconcilePolicyConfig,
}

impl ServiceInstanceDelete {
    pub fn new(
        stores: ServiceStores,
        broker: Arc<dyn BrokerClient>,
        scheduler: Arc<dyn JobScheduler>,
        events: Arc<dyn EventRecorder>,
        accepts_incomplete: bool,
        reconcile_policy: ReconcilePolicyConfig,
    ) -> Self {
        Self {
            stores,
            broker,
            scheduler,
            events,
            accepts_incomplete,
            reconcile_policy,
        }
    }

    /// Delete a batch of instances by id, returning the ordered error and
    /// warning accumulators. No instance's outcome blocks another's.
    pub async fn delete(
        &self,
        instance_ids: &[String],
    ) -> (Vec<LifecycleError>, Vec<LifecycleWarning>) {
        let mut errors_accumulator = Vec::new();
        let mut warnings_accumulator = Vec::new();

        for instance_id in instance_ids {
            let instance =
                match self.stores.instances.get_instance(instance_id).await {
                    Ok(Some(instance)) => instance,
                    // Already removed by a concurrent path: no-op success.
                    Ok(None) => continue,
                    Err(e) => {
                        errors_accumulator.push(e.into());
                        continue;
                    }
                };

            if instance.operation_in_progress() {
                errors_accumulator.push(
                    InstanceError::OperationInProgress(instance.name.clone())
                        .into(),
                );
                continue;
            }

            info!(instance=%instance.id, name=%instance.name, "deleting service instance");

            let (mut errors, warnings) =
                self.delete_service_bindings(&instance).await;
            errors.extend(self.unshare_from_all_spaces(&instance).await);
            errors.extend(self.delete_service_keys(&instance).await);
            errors.extend(self.delete_route_bindings(&instance).await);

            if errors.is_empty() {
                let (instance_errors, instance_warnings) =
                    self.delete_service_instance(&instance).await;
                errors_accumulator.extend(instance_errors);
                warnings_accumulator.extend(instance_warnings);
            } else {
                warn!(
                    instance=%instance.id,
                    nested=%errors.len(),
                    "dependent deletion failed, skipping deprovision"
                );
                errors_accumulator
                    .push(recursive_delete_error(&instance, errors));
            }

            warnings_accumulator.extend(warnings);
        }

        (errors_accumulator, warnings_accumulator)
    }

    async fn delete_service_bindings(
        &self,
        instance: &ServiceInstance,
    ) -> (Vec<LifecycleError>, Vec<LifecycleWarning>) {
        let bindings =
            match self.stores.bindings.list_bindings(&instance.id).await {
                Ok(bindings) => bindings,
                Err(e) => return (vec![e.into()], Vec::new()),
            };
        ServiceBindingDelete::new(self.stores.bindings.clone())
            .delete(bindings)
            .await
    }

    async fn unshare_from_all_spaces(
        &self,
        instance: &ServiceInstance,
    ) -> Vec<LifecycleError> {
        ServiceInstanceUnshare::new(
            self.stores.instances.clone(),
            self.stores.bindings.clone(),
        )
        .unshare_from_all_spaces(instance)
        .await
    }

    async fn delete_service_keys(
        &self,
        instance: &ServiceInstance,
    ) -> Vec<LifecycleError> {
        let keys = match self.stores.keys.list_keys(&instance.id).await {
            Ok(keys) => keys,
            Err(e) => return vec![e.into()],
        };
        ServiceKeyDelete::new(self.stores.keys.clone())
            .delete(keys)
            .await
    }

    async fn delete_route_bindings(
        &self,
        instance: &ServiceInstance,
    ) -> Vec<LifecycleError> {
        let bindings = match self
            .stores
            .route_bindings
            .list_route_bindings(&instance.id)
            .await
        {
            Ok(bindings) => bindings,
            Err(e) => return vec![e.into()],
        };
        RouteBindingDelete::new(self.stores.route_bindings.clone())
            .delete(bindings)
            .await
    }

    /// The lock-governed deprovision. State machine:
    /// `REQUESTED -> {SUCCEEDED, IN_PROGRESS, FAILED}`; `IN_PROGRESS` hands
    /// off to the state-fetch job. Whatever happens, exactly one terminal
    /// lock disposition runs before this returns.
    async fn delete_service_instance(
        &self,
        instance: &ServiceInstance,
    ) -> (Vec<LifecycleError>, Vec<LifecycleWarning>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut lock = match DeleterLock::acquire(
            self.stores.instances.clone(),
            &instance.id,
        )
        .await
        {
            Ok(Some(lock)) => lock,
            // Gone between the batch check and now: no-op success.
            Ok(None) => return (errors, warnings),
            Err(e) => {
                errors.push(e);
                return (errors, warnings);
            }
        };

        match self
            .broker
            .deprovision(lock.instance(), self.accepts_incomplete)
            .await
        {
            Ok(reply) => {
                warnings.extend(
                    reply.warnings.into_iter().map(LifecycleWarning::new),
                );
                match reply.last_operation.state {
                    OperationState::Succeeded => {
                        match lock.unlock_and_destroy().await {
                            Ok(()) => {
                                self.events
                                    .record_instance_delete(lock.instance());
                                info!(instance=%instance.id, "service instance deleted");
                            }
                            Err(e) => errors.push(e.into()),
                        }
                    }
                    OperationState::InProgress => {
                        let job = InstanceStateFetchJob::new(
                            self.stores.instances.clone(),
                            self.broker.clone(),
                            self.events.clone(),
                            instance.id.clone(),
                            &self.reconcile_policy,
                        );
                        match lock
                            .enqueue_unlock(
                                reply.last_operation,
                                Box::new(job),
                                self.scheduler.as_ref(),
                            )
                            .await
                        {
                            Ok(handle) => {
                                info!(
                                    instance=%instance.id,
                                    job=%handle.id(),
                                    "deprovision in progress, reconciliation scheduled"
                                );
                            }
                            Err(e) => errors.push(e.into()),
                        }
                    }
                    OperationState::Failed => {
                        errors.push(
                            BrokerError::OperationFailed(
                                reply
                                    .last_operation
                                    .description
                                    .unwrap_or_else(|| {
                                        "deprovision failed".to_string()
                                    }),
                            )
                            .into(),
                        );
                    }
                }
            }
            Err(e) => errors.push(e.into()),
        }

        // Fallback release: any path above that did not reach a terminal
        // disposition must not leak the lock.
        if lock.needs_unlock() {
            if let Err(e) = lock.unlock_and_fail().await {
                errors.push(e.into());
            }
        }

        (errors, warnings)
    }
}

fn recursive_delete_error(
    instance: &ServiceInstance,
    errors: Vec<LifecycleError>,
) -> LifecycleError {
    let nested = errors
        .iter()
        .map(|e| format!("\t{e}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    InstanceError::RecursiveDeleteFailed {
        name: instance.name.clone(),
        nested,
    }
    .into()
}
