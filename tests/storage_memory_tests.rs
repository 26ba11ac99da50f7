mod common;

use common::*;
use osb_lm::models::{BrokerSyncState, LastOperation, ServiceBroker};
use osb_lm::storage::memory::{MemoryBrokerStorage, MemoryInstanceStorage};
use osb_lm::storage::{
    BrokerStorage, BrokerUnitOfWork, InstanceStorage, LockAcquisition,
    StorageError,
};

fn broker_record(id: &str, name: &str) -> ServiceBroker {
    ServiceBroker {
        id: id.to_string(),
        name: name.to_string(),
        url: "https://broker.example.com".to_string(),
        auth_username: None,
        auth_password: None,
        space_id: None,
    }
}

#[tokio::test]
async fn instance_store_get_exists_delete() {
    let storage = MemoryInstanceStorage::new();
    let instance = managed_instance("si-1", "db");

    storage.store_instance(&instance).await.unwrap();
    assert!(storage.instance_exists("si-1").await.unwrap());
    assert_eq!(storage.get_instance("si-1").await.unwrap(), Some(instance));

    storage.delete_instance("si-1").await.unwrap();
    assert!(!storage.instance_exists("si-1").await.unwrap());
    assert_eq!(storage.get_instance("si-1").await.unwrap(), None);
}

#[tokio::test]
async fn begin_operation_is_check_and_set() {
    let storage = MemoryInstanceStorage::new();
    storage
        .store_instance(&managed_instance("si-1", "db"))
        .await
        .unwrap();

    let first = storage
        .begin_operation("si-1", in_progress_delete())
        .await
        .unwrap();
    match first {
        LockAcquisition::Acquired(snapshot) => {
            assert_eq!(snapshot.name, "db");
            assert!(snapshot.last_operation.is_none(), "pre-lock snapshot");
        }
        other => panic!("expected acquisition, got {other:?}"),
    }

    let second = storage
        .begin_operation("si-1", in_progress_delete())
        .await
        .unwrap();
    assert!(matches!(second, LockAcquisition::Unavailable(name) if name == "db"));
}

#[tokio::test]
async fn begin_operation_on_missing_instance_is_gone() {
    let storage = MemoryInstanceStorage::new();
    let result = storage
        .begin_operation("ghost", in_progress_delete())
        .await
        .unwrap();
    assert!(matches!(result, LockAcquisition::Gone));
}

#[tokio::test]
async fn remove_shared_space_drops_only_that_space() {
    let storage = MemoryInstanceStorage::new();
    let mut instance = managed_instance("si-1", "db");
    instance.shared_space_ids =
        vec!["space-a".to_string(), "space-b".to_string()];
    storage.store_instance(&instance).await.unwrap();

    storage.remove_shared_space("si-1", "space-a").await.unwrap();

    let shared = storage
        .get_instance("si-1")
        .await
        .unwrap()
        .unwrap()
        .shared_space_ids;
    assert_eq!(shared, vec!["space-b".to_string()]);
}

#[tokio::test]
async fn set_last_operation_on_missing_instance_is_not_found() {
    let storage = MemoryInstanceStorage::new();
    let err = storage
        .set_last_operation("ghost", Some(LastOperation::delete_in_progress()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn bindings_list_filters_by_instance_and_sorts_by_id() {
    let stores = stores();
    stores
        .bindings
        .store_binding(&binding("b-2", "si-1"))
        .await
        .unwrap();
    stores
        .bindings
        .store_binding(&binding("b-1", "si-1"))
        .await
        .unwrap();
    stores
        .bindings
        .store_binding(&binding("b-3", "si-2"))
        .await
        .unwrap();

    let listed = stores.bindings.list_bindings("si-1").await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["b-1", "b-2"]);
}

#[tokio::test]
async fn duplicate_broker_name_leaves_no_partial_write() {
    let storage = MemoryBrokerStorage::new();
    storage
        .create_broker(BrokerUnitOfWork {
            broker: broker_record("br-1", "shared-name"),
            state: BrokerSyncState::Synchronizing,
        })
        .await
        .unwrap();

    let err = storage
        .create_broker(BrokerUnitOfWork {
            broker: broker_record("br-2", "shared-name"),
            state: BrokerSyncState::Synchronizing,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists(name) if name == "shared-name"));
    assert_eq!(storage.get_broker("br-2").await.unwrap(), None);
    assert_eq!(storage.get_sync_state("br-2").await.unwrap(), None);
}

#[tokio::test]
async fn set_sync_state_requires_an_existing_broker() {
    let storage = MemoryBrokerStorage::new();
    let err = storage
        .set_sync_state("ghost", BrokerSyncState::Available)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}
