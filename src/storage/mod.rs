pub mod error;
pub mod memory;

pub use error::*;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    BrokerSyncState, LastOperation, RouteBinding, ServiceBinding,
    ServiceBroker, ServiceInstance, ServiceKey,
};

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of the advisory-lock check-and-set on an instance row.
#[derive(Debug, Clone)]
pub enum LockAcquisition {
    /// The marker was written; the snapshot is the pre-deprovision state.
    Acquired(ServiceInstance),
    /// Another operation currently marks the instance; value is its name.
    Unavailable(String),
    /// The instance no longer exists.
    Gone,
}

#[async_trait]
pub trait InstanceStorage: Send + Sync {
    async fn store_instance(
        &self,
        instance: &ServiceInstance,
    ) -> StorageResult<()>;
    async fn get_instance(
        &self,
        id: &str,
    ) -> StorageResult<Option<ServiceInstance>>;
    async fn instance_exists(&self, id: &str) -> StorageResult<bool>;
    async fn delete_instance(&self, id: &str) -> StorageResult<()>;
    /// Atomically install `op` as the instance's operation marker unless one
    /// is already in progress. This is the advisory-lock primitive; backends
    /// must make the check and the write a single step.
    async fn begin_operation(
        &self,
        id: &str,
        op: LastOperation,
    ) -> StorageResult<LockAcquisition>;
    async fn set_last_operation(
        &self,
        id: &str,
        op: Option<LastOperation>,
    ) -> StorageResult<()>;
    async fn remove_shared_space(
        &self,
        id: &str,
        space_id: &str,
    ) -> StorageResult<()>;
}

#[async_trait]
pub trait BindingStorage: Send + Sync {
    async fn store_binding(&self, binding: &ServiceBinding)
    -> StorageResult<()>;
    async fn list_bindings(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<ServiceBinding>>;
    async fn delete_binding(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait KeyStorage: Send + Sync {
    async fn store_key(&self, key: &ServiceKey) -> StorageResult<()>;
    async fn list_keys(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<ServiceKey>>;
    async fn delete_key(&self, id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait RouteBindingStorage: Send + Sync {
    async fn store_route_binding(
        &self,
        binding: &RouteBinding,
    ) -> StorageResult<()>;
    async fn list_route_bindings(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<RouteBinding>>;
    async fn delete_route_binding(&self, id: &str) -> StorageResult<()>;
}

/// Unit of work for broker creation: the broker row and its initial sync
/// state row commit together or not at all.
#[derive(Debug, Clone)]
pub struct BrokerUnitOfWork {
    pub broker: ServiceBroker,
    pub state: BrokerSyncState,
}

#[async_trait]
pub trait BrokerStorage: Send + Sync {
    async fn create_broker(
        &self,
        uow: BrokerUnitOfWork,
    ) -> StorageResult<ServiceBroker>;
    async fn get_broker(
        &self,
        id: &str,
    ) -> StorageResult<Option<ServiceBroker>>;
    async fn get_sync_state(
        &self,
        broker_id: &str,
    ) -> StorageResult<Option<BrokerSyncState>>;
    async fn set_sync_state(
        &self,
        broker_id: &str,
        state: BrokerSyncState,
    ) -> StorageResult<()>;
}

/// The per-collection stores the lifecycle orchestrators work against.
#[derive(Clone)]
pub struct ServiceStores {
    pub instances: Arc<dyn InstanceStorage>,
    pub bindings: Arc<dyn BindingStorage>,
    pub keys: Arc<dyn KeyStorage>,
    pub route_bindings: Arc<dyn RouteBindingStorage>,
}

impl ServiceStores {
    pub fn in_memory() -> Self {
        Self {
            instances: Arc::new(memory::MemoryInstanceStorage::new()),
            bindings: Arc::new(memory::MemoryBindingStorage::new()),
            keys: Arc::new(memory::MemoryKeyStorage::new()),
            route_bindings: Arc::new(memory::MemoryRouteBindingStorage::new()),
        }
    }
}
