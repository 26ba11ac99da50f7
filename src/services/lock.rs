use std::sync::Arc;
use tracing::debug;

use crate::errors::{LifecycleError, LockError};
use crate::jobs::{Job, JobScheduler, PollableJobHandle};
use crate::models::{LastOperation, ServiceInstance};
use crate::storage::{InstanceStorage, LockAcquisition, StorageResult};

/// Advisory lock over one service instance for the duration of a delete.
///
/// Acquisition writes a delete-in-progress marker through the storage
/// check-and-set; concurrent operations observe the marker and fail with
/// `LockError::Unavailable`. The holder must drive the lock to exactly one
/// terminal disposition:
///
/// - `unlock_and_destroy` when the broker confirmed completion,
/// - `unlock_and_fail` on any error, keeping the instance retryable,
/// - `enqueue_unlock` when the broker deferred, which intentionally leaves
///   the instance marked in-progress for the reconciliation job.
///
/// `needs_unlock` stays true until a disposition runs; the orchestrator
/// checks it on every exit path and fail-releases as a fallback so no path
/// leaks a held lock.
pub struct DeleterLock {
    storage: Arc<dyn InstanceStorage>,
    instance: ServiceInstance,
    needs_unlock: bool,
}

impl DeleterLock {
    /// Returns `Ok(None)` when the instance is already gone: deletion of an
    /// absent instance is a no-op success, not an error.
    pub async fn acquire(
        storage: Arc<dyn InstanceStorage>,
        instance_id: &str,
    ) -> Result<Option<Self>, LifecycleError> {
        let acquisition = storage
            .begin_operation(instance_id, LastOperation::delete_in_progress())
            .await?;
        match acquisition {
            LockAcquisition::Gone => Ok(None),
            LockAcquisition::Unavailable(name) => {
                Err(LockError::Unavailable(name).into())
            }
            LockAcquisition::Acquired(instance) => {
                debug!(instance=%instance.id, "delete lock acquired");
                Ok(Some(Self {
                    storage,
                    instance,
                    needs_unlock: true,
                }))
            }
        }
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    pub fn needs_unlock(&self) -> bool {
        self.needs_unlock
    }

    pub async fn unlock_and_destroy(&mut self) -> StorageResult<()> {
        self.storage.delete_instance(&self.instance.id).await?;
        self.needs_unlock = false;
        debug!(instance=%self.instance.id, "instance destroyed, lock released");
        Ok(())
    }

    pub async fn unlock_and_fail(&mut self) -> StorageResult<()> {
        self.storage
            .set_last_operation(
                &self.instance.id,
                Some(LastOperation::delete_failed(
                    "deprovision did not complete",
                )),
            )
            .await?;
        self.needs_unlock = false;
        debug!(instance=%self.instance.id, "lock released after failure");
        Ok(())
    }

    /// Persist the broker-returned operation state and hand reconciliation
    /// to `job`. The instance stays marked in-progress on purpose; the
    /// reconciliation job owns the terminal transition from here.
    pub async fn enqueue_unlock(
        &mut self,
        last_operation: LastOperation,
        job: Box<dyn Job>,
        scheduler: &dyn JobScheduler,
    ) -> StorageResult<PollableJobHandle> {
        self.storage
            .set_last_operation(&self.instance.id, Some(last_operation))
            .await?;
        let handle = scheduler.enqueue(job);
        self.needs_unlock = false;
        debug!(
            instance=%self.instance.id,
            job=%handle.id(),
            "lock deferred to reconciliation job"
        );
        Ok(handle)
    }
}
