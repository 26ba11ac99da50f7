use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{
    BrokerSyncState, LastOperation, RouteBinding, ServiceBinding,
    ServiceBroker, ServiceInstance, ServiceKey,
};
use crate::storage::{
    BindingStorage, BrokerStorage, BrokerUnitOfWork, InstanceStorage,
    KeyStorage, LockAcquisition, RouteBindingStorage, StorageError,
    StorageResult,
};

type MemoryStore<T> = Arc<RwLock<HashMap<String, T>>>;

#[derive(Clone)]
pub struct MemoryInstanceStorage {
    store: MemoryStore<ServiceInstance>,
}

#[derive(Clone)]
pub struct MemoryBindingStorage {
    store: MemoryStore<ServiceBinding>,
}

#[derive(Clone)]
pub struct MemoryKeyStorage {
    store: MemoryStore<ServiceKey>,
}

#[derive(Clone)]
pub struct MemoryRouteBindingStorage {
    store: MemoryStore<RouteBinding>,
}

impl MemoryInstanceStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryInstanceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBindingStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryBindingStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKeyStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryKeyStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRouteBindingStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryRouteBindingStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstanceStorage for MemoryInstanceStorage {
    async fn store_instance(
        &self,
        instance: &ServiceInstance,
    ) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn get_instance(
        &self,
        id: &str,
    ) -> StorageResult<Option<ServiceInstance>> {
        let store = self.store.read().await;
        Ok(store.get(id).cloned())
    }

    async fn instance_exists(&self, id: &str) -> StorageResult<bool> {
        let store = self.store.read().await;
        Ok(store.contains_key(id))
    }

    async fn delete_instance(&self, id: &str) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }

    async fn begin_operation(
        &self,
        id: &str,
        op: LastOperation,
    ) -> StorageResult<LockAcquisition> {
        // Check and write under one write guard so two concurrent callers
        // cannot both acquire the marker.
        let mut store = self.store.write().await;
        let Some(instance) = store.get_mut(id) else {
            return Ok(LockAcquisition::Gone);
        };
        if instance.operation_in_progress() {
            return Ok(LockAcquisition::Unavailable(instance.name.clone()));
        }
        let snapshot = instance.clone();
        instance.last_operation = Some(op);
        Ok(LockAcquisition::Acquired(snapshot))
    }

    async fn set_last_operation(
        &self,
        id: &str,
        op: Option<LastOperation>,
    ) -> StorageResult<()> {
        let mut store = self.store.write().await;
        let instance = store
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        instance.last_operation = op;
        Ok(())
    }

    async fn remove_shared_space(
        &self,
        id: &str,
        space_id: &str,
    ) -> StorageResult<()> {
        let mut store = self.store.write().await;
        let instance = store
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        instance.shared_space_ids.retain(|s| s != space_id);
        Ok(())
    }
}

#[async_trait]
impl BindingStorage for MemoryBindingStorage {
    async fn store_binding(
        &self,
        binding: &ServiceBinding,
    ) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.insert(binding.id.clone(), binding.clone());
        Ok(())
    }

    async fn list_bindings(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<ServiceBinding>> {
        let store = self.store.read().await;
        let mut bindings: Vec<ServiceBinding> = store
            .values()
            .filter(|b| b.instance_id == instance_id)
            .cloned()
            .collect();
        bindings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bindings)
    }

    async fn delete_binding(&self, id: &str) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }
}

#[async_trait]
impl KeyStorage for MemoryKeyStorage {
    async fn store_key(&self, key: &ServiceKey) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.insert(key.id.clone(), key.clone());
        Ok(())
    }

    async fn list_keys(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<ServiceKey>> {
        let store = self.store.read().await;
        let mut keys: Vec<ServiceKey> = store
            .values()
            .filter(|k| k.instance_id == instance_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(keys)
    }

    async fn delete_key(&self, id: &str) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }
}

#[async_trait]
impl RouteBindingStorage for MemoryRouteBindingStorage {
    async fn store_route_binding(
        &self,
        binding: &RouteBinding,
    ) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.insert(binding.id.clone(), binding.clone());
        Ok(())
    }

    async fn list_route_bindings(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<RouteBinding>> {
        let store = self.store.read().await;
        let mut bindings: Vec<RouteBinding> = store
            .values()
            .filter(|b| b.instance_id == instance_id)
            .cloned()
            .collect();
        bindings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bindings)
    }

    async fn delete_route_binding(&self, id: &str) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }
}

/// Broker rows and their sync-state rows live under one lock so the
/// creation unit of work commits both atomically.
#[derive(Clone)]
pub struct MemoryBrokerStorage {
    inner: Arc<RwLock<BrokerTables>>,
}

#[derive(Default)]
struct BrokerTables {
    brokers: HashMap<String, ServiceBroker>,
    states: HashMap<String, BrokerSyncState>,
}

impl MemoryBrokerStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BrokerTables::default())),
        }
    }
}

impl Default for MemoryBrokerStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerStorage for MemoryBrokerStorage {
    async fn create_broker(
        &self,
        uow: BrokerUnitOfWork,
    ) -> StorageResult<ServiceBroker> {
        let mut tables = self.inner.write().await;
        let duplicate = tables
            .brokers
            .values()
            .any(|b| b.name == uow.broker.name);
        if duplicate {
            return Err(StorageError::AlreadyExists(uow.broker.name));
        }
        tables
            .states
            .insert(uow.broker.id.clone(), uow.state);
        tables
            .brokers
            .insert(uow.broker.id.clone(), uow.broker.clone());
        Ok(uow.broker)
    }

    async fn get_broker(
        &self,
        id: &str,
    ) -> StorageResult<Option<ServiceBroker>> {
        let tables = self.inner.read().await;
        Ok(tables.brokers.get(id).cloned())
    }

    async fn get_sync_state(
        &self,
        broker_id: &str,
    ) -> StorageResult<Option<BrokerSyncState>> {
        let tables = self.inner.read().await;
        Ok(tables.states.get(broker_id).copied())
    }

    async fn set_sync_state(
        &self,
        broker_id: &str,
        state: BrokerSyncState,
    ) -> StorageResult<()> {
        let mut tables = self.inner.write().await;
        if !tables.brokers.contains_key(broker_id) {
            return Err(StorageError::NotFound(broker_id.to_string()));
        }
        tables.states.insert(broker_id.to_string(), state);
        Ok(())
    }
}
