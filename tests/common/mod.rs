#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use osb_lm::broker::{
    BrokerClient, DeprovisionResponse, LastOperationResponse,
};
use osb_lm::errors::BrokerError;
use osb_lm::events::{
    EventRecorder, SERVICE_BROKER_CREATE, SERVICE_INSTANCE_DELETE,
    USER_PROVIDED_SERVICE_INSTANCE_DELETE,
};
use osb_lm::jobs::{Job, JobOutcome, JobScheduler, JobState, PollableJobHandle};
use osb_lm::models::{
    InstanceKind, LastOperation, OperationState, RouteBinding, ServiceBinding,
    ServiceBroker, ServiceInstance, ServiceKey,
};
use osb_lm::storage::{
    BindingStorage, InstanceStorage, LockAcquisition, StorageError,
    StorageResult,
    memory::{MemoryBindingStorage, MemoryInstanceStorage},
};
use osb_lm::{ReconcilePolicyConfig, ServiceStores};

/// Installs a fmt subscriber once so `RUST_LOG` works in test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Broker double with scripted replies. Queues are popped per call; an
/// empty queue answers synchronous success.
pub struct FakeBroker {
    deprovision_replies:
        Mutex<VecDeque<Result<DeprovisionResponse, BrokerError>>>,
    last_operation_replies:
        Mutex<VecDeque<Result<LastOperationResponse, BrokerError>>>,
    catalog_fails: AtomicBool,
    deprovision_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            deprovision_replies: Mutex::new(VecDeque::new()),
            last_operation_replies: Mutex::new(VecDeque::new()),
            catalog_fails: AtomicBool::new(false),
            deprovision_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_deprovision(
        &self,
        reply: Result<DeprovisionResponse, BrokerError>,
    ) {
        self.deprovision_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_last_operation(
        &self,
        reply: Result<LastOperationResponse, BrokerError>,
    ) {
        self.last_operation_replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_catalog(&self) {
        self.catalog_fails.store(true, Ordering::SeqCst);
    }

    pub fn deprovision_count(&self) -> usize {
        self.deprovision_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for FakeBroker {
    async fn deprovision(
        &self,
        _instance: &ServiceInstance,
        _accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError> {
        self.deprovision_calls.fetch_add(1, Ordering::SeqCst);
        self.deprovision_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DeprovisionResponse::succeeded()))
    }

    async fn fetch_last_operation(
        &self,
        _instance: &ServiceInstance,
    ) -> Result<LastOperationResponse, BrokerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.last_operation_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(LastOperationResponse {
                    state: OperationState::Succeeded,
                    description: None,
                })
            })
    }

    async fn check_catalog(
        &self,
        _broker: &ServiceBroker,
    ) -> Result<(), BrokerError> {
        if self.catalog_fails.load(Ordering::SeqCst) {
            Err(BrokerError::RequestFailed(
                reqwest::StatusCode::BAD_GATEWAY,
            ))
        } else {
            Ok(())
        }
    }
}

pub struct RecordingEventRecorder {
    events: Mutex<Vec<String>>,
}

impl RecordingEventRecorder {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl EventRecorder for RecordingEventRecorder {
    fn record_instance_delete(&self, instance: &ServiceInstance) {
        let event = match instance.kind {
            InstanceKind::Managed => SERVICE_INSTANCE_DELETE,
            InstanceKind::UserProvided => {
                USER_PROVIDED_SERVICE_INSTANCE_DELETE
            }
        };
        self.events.lock().unwrap().push(event.to_string());
    }

    fn record_broker_create(&self, _broker: &ServiceBroker) {
        self.events
            .lock()
            .unwrap()
            .push(SERVICE_BROKER_CREATE.to_string());
    }
}

/// Scheduler double that records job names without ever running them. The
/// senders are retained so returned handles stay in `Processing`.
pub struct RecordingScheduler {
    enqueued: Mutex<Vec<String>>,
    senders: Mutex<Vec<watch::Sender<JobState>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self {
            enqueued: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn enqueued_names(&self) -> Vec<String> {
        self.enqueued.lock().unwrap().clone()
    }
}

impl JobScheduler for RecordingScheduler {
    fn enqueue(&self, job: Box<dyn Job>) -> PollableJobHandle {
        self.enqueued.lock().unwrap().push(job.name().to_string());
        let (tx, rx) = watch::channel(JobState::Processing);
        self.senders.lock().unwrap().push(tx);
        PollableJobHandle::new(nanoid::nanoid!(), rx)
    }
}

pub struct NoopJob;

#[async_trait]
impl Job for NoopJob {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&self) -> JobOutcome {
        JobOutcome::Complete
    }
}

/// Binding storage whose deletes always fail; reads delegate to memory.
pub struct FailingBindingStorage {
    inner: MemoryBindingStorage,
}

impl FailingBindingStorage {
    pub fn new(inner: MemoryBindingStorage) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl BindingStorage for FailingBindingStorage {
    async fn store_binding(
        &self,
        binding: &ServiceBinding,
    ) -> StorageResult<()> {
        self.inner.store_binding(binding).await
    }

    async fn list_bindings(
        &self,
        instance_id: &str,
    ) -> StorageResult<Vec<ServiceBinding>> {
        self.inner.list_bindings(instance_id).await
    }

    async fn delete_binding(&self, id: &str) -> StorageResult<()> {
        Err(StorageError::Backend(format!(
            "simulated delete failure for binding {id}"
        )))
    }
}

/// Instance storage whose unshare always fails; everything else delegates
/// to memory.
pub struct FailingUnshareStorage {
    inner: MemoryInstanceStorage,
}

impl FailingUnshareStorage {
    pub fn new(inner: MemoryInstanceStorage) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl InstanceStorage for FailingUnshareStorage {
    async fn store_instance(
        &self,
        instance: &ServiceInstance,
    ) -> StorageResult<()> {
        self.inner.store_instance(instance).await
    }

    async fn get_instance(
        &self,
        id: &str,
    ) -> StorageResult<Option<ServiceInstance>> {
        self.inner.get_instance(id).await
    }

    async fn instance_exists(&self, id: &str) -> StorageResult<bool> {
        self.inner.instance_exists(id).await
    }

    async fn delete_instance(&self, id: &str) -> StorageResult<()> {
        self.inner.delete_instance(id).await
    }

    async fn begin_operation(
        &self,
        id: &str,
        op: LastOperation,
    ) -> StorageResult<LockAcquisition> {
        self.inner.begin_operation(id, op).await
    }

    async fn set_last_operation(
        &self,
        id: &str,
        op: Option<LastOperation>,
    ) -> StorageResult<()> {
        self.inner.set_last_operation(id, op).await
    }

    async fn remove_shared_space(
        &self,
        id: &str,
        space_id: &str,
    ) -> StorageResult<()> {
        Err(StorageError::Backend(format!(
            "simulated unshare failure for {id} in space {space_id}"
        )))
    }
}

pub fn managed_instance(id: &str, name: &str) -> ServiceInstance {
    ServiceInstance {
        id: id.to_string(),
        name: name.to_string(),
        space_id: "space-1".to_string(),
        kind: InstanceKind::Managed,
        service_id: Some("service-1".to_string()),
        plan_id: Some("plan-1".to_string()),
        last_operation: None,
        shared_space_ids: Vec::new(),
    }
}

pub fn user_provided_instance(id: &str, name: &str) -> ServiceInstance {
    let mut instance = managed_instance(id, name);
    instance.kind = InstanceKind::UserProvided;
    instance.service_id = None;
    instance.plan_id = None;
    instance
}

pub fn binding(id: &str, instance_id: &str) -> ServiceBinding {
    ServiceBinding {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        app_id: "app-1".to_string(),
        last_operation: None,
    }
}

pub fn service_key(id: &str, instance_id: &str) -> ServiceKey {
    ServiceKey {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        name: format!("key-{id}"),
        last_operation: None,
    }
}

pub fn route_binding(id: &str, instance_id: &str) -> RouteBinding {
    RouteBinding {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        route_url: "https://route.example.com".to_string(),
        last_operation: None,
    }
}

pub fn in_progress_delete() -> LastOperation {
    LastOperation::delete_in_progress()
}

pub fn fast_policy() -> ReconcilePolicyConfig {
    ReconcilePolicyConfig {
        poll_interval: Duration::from_millis(10),
        max_poll_duration: Duration::from_secs(5),
    }
}

pub fn stores() -> ServiceStores {
    ServiceStores::in_memory()
}
