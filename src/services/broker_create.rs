use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::broker::BrokerClient;
use crate::errors::LifecycleError;
use crate::events::EventRecorder;
use crate::jobs::{Job, JobOutcome, JobScheduler, PollableJobHandle};
use crate::models::{BrokerSyncState, ServiceBroker};
use crate::storage::{BrokerStorage, BrokerUnitOfWork, StorageError};

#[derive(Debug, Clone)]
pub struct BrokerCreateRequest {
    pub name: String,
    pub url: String,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub space_id: Option<String>,
}

#[derive(Debug)]
pub struct BrokerCreateResult {
    pub broker: ServiceBroker,
    /// Handle for the enqueued catalog synchronization; callers poll it for
    /// completion while the create call itself returns immediately.
    pub job: PollableJobHandle,
}

/// Registers a new service broker: commits the broker row together with its
/// initial synchronizing state, records the audit event, then fires off the
/// catalog synchronization job.
pub struct ServiceBrokerCreate {
    storage: Arc<dyn BrokerStorage>,
    broker_client: Arc<dyn BrokerClient>,
    scheduler: Arc<dyn JobScheduler>,
    events: Arc<dyn EventRecorder>,
}

impl ServiceBrokerCreate {
    pub fn new(
        storage: Arc<dyn BrokerStorage>,
        broker_client: Arc<dyn BrokerClient>,
        scheduler: Arc<dyn JobScheduler>,
        events: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            storage,
            broker_client,
            scheduler,
            events,
        }
    }

    pub async fn create(
        &self,
        request: BrokerCreateRequest,
    ) -> Result<BrokerCreateResult, LifecycleError> {
        if !(request.url.starts_with("http://")
            || request.url.starts_with("https://"))
        {
            return Err(LifecycleError::InvalidBroker(
                "broker URL must start with http:// or https://".into(),
            ));
        }

        let broker = ServiceBroker {
            id: nanoid::nanoid!(),
            name: request.name,
            url: request.url,
            auth_username: request.auth_username,
            auth_password: request.auth_password,
            space_id: request.space_id,
        };

        let broker = self
            .storage
            .create_broker(BrokerUnitOfWork {
                broker,
                state: BrokerSyncState::Synchronizing,
            })
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists(name) => {
                    LifecycleError::InvalidBroker(format!(
                        "name {name} is already taken"
                    ))
                }
                e => e.into(),
            })?;

        self.events.record_broker_create(&broker);
        info!(broker=%broker.id, name=%broker.name, "service broker created");

        let job = SynchronizeCatalogJob {
            storage: self.storage.clone(),
            broker_client: self.broker_client.clone(),
            broker: broker.clone(),
        };
        let handle = self.scheduler.enqueue(Box::new(job));

        Ok(BrokerCreateResult {
            broker,
            job: handle,
        })
    }
}

/// One-shot synchronization probe against the new broker's catalog. Flips
/// the sync state to available or failed by what the broker answers.
pub struct SynchronizeCatalogJob {
    storage: Arc<dyn BrokerStorage>,
    broker_client: Arc<dyn BrokerClient>,
    broker: ServiceBroker,
}

#[async_trait]
impl Job for SynchronizeCatalogJob {
    fn name(&self) -> &str {
        "synchronize-broker-catalog"
    }

    async fn run(&self) -> JobOutcome {
        match self.broker_client.check_catalog(&self.broker).await {
            Ok(()) => {
                if let Err(e) = self
                    .storage
                    .set_sync_state(&self.broker.id, BrokerSyncState::Available)
                    .await
                {
                    return JobOutcome::Failed(e.to_string());
                }
                JobOutcome::Complete
            }
            Err(e) => {
                let _ = self
                    .storage
                    .set_sync_state(
                        &self.broker.id,
                        BrokerSyncState::SynchronizationFailed,
                    )
                    .await;
                JobOutcome::Failed(e.to_string())
            }
        }
    }
}
