use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::broker::BrokerClient;
use crate::config::ReconcilePolicyConfig;
use crate::events::EventRecorder;
use crate::jobs::{Job, JobOutcome};
use crate::models::{LastOperation, OperationState};
use crate::storage::InstanceStorage;

const JOB_NAME: &str = "service-instance-state-fetch";

/// Reconciliation task for a deprovision the broker deferred. Each run
/// re-fetches broker status and applies the same terminal transitions the
/// synchronous path uses; a still-running operation re-arms the job through
/// the scheduler's retry contract.
pub struct InstanceStateFetchJob {
    instances: Arc<dyn InstanceStorage>,
    broker: Arc<dyn BrokerClient>,
    events: Arc<dyn EventRecorder>,
    instance_id: String,
    poll_interval: std::time::Duration,
    deadline: Instant,
}

impl InstanceStateFetchJob {
    pub fn new(
        instances: Arc<dyn InstanceStorage>,
        broker: Arc<dyn BrokerClient>,
        events: Arc<dyn EventRecorder>,
        instance_id: String,
        policy: &ReconcilePolicyConfig,
    ) -> Self {
        Self {
            instances,
            broker,
            events,
            instance_id,
            poll_interval: policy.poll_interval,
            deadline: Instant::now() + policy.max_poll_duration,
        }
    }

    async fn mark_failed(&self, description: String) {
        if let Err(e) = self
            .instances
            .set_last_operation(
                &self.instance_id,
                Some(LastOperation::delete_failed(description)),
            )
            .await
        {
            warn!(instance=%self.instance_id, error=%e, "failed to persist failed operation state");
        }
    }
}

#[async_trait]
impl Job for InstanceStateFetchJob {
    fn name(&self) -> &str {
        JOB_NAME
    }

    async fn run(&self) -> JobOutcome {
        // The deadline bounds every re-arm, including runs where storage or
        // the broker keep erroring, so a persistently failing poll target
        // cannot keep the job alive forever.
        if Instant::now() >= self.deadline {
            let description = "maximum polling duration exceeded".to_string();
            self.mark_failed(description.clone()).await;
            return JobOutcome::Failed(description);
        }

        let instance =
            match self.instances.get_instance(&self.instance_id).await {
                Ok(Some(instance)) => instance,
                // Removed by a concurrent path; nothing left to reconcile.
                Ok(None) => return JobOutcome::Complete,
                Err(e) => {
                    warn!(instance=%self.instance_id, error=%e, "state fetch could not load instance");
                    return JobOutcome::Retry(self.poll_interval);
                }
            };

        let reply = match self.broker.fetch_last_operation(&instance).await {
            Ok(reply) => reply,
            Err(e) => {
                // Transport hiccups re-poll; only the broker's word about
                // the operation itself is terminal.
                warn!(instance=%self.instance_id, error=%e, "last_operation fetch failed");
                return JobOutcome::Retry(self.poll_interval);
            }
        };

        match reply.state {
            OperationState::Succeeded => {
                if let Err(e) =
                    self.instances.delete_instance(&instance.id).await
                {
                    warn!(instance=%instance.id, error=%e, "reconciled destroy failed");
                    return JobOutcome::Retry(self.poll_interval);
                }
                self.events.record_instance_delete(&instance);
                info!(instance=%instance.id, "deprovision reconciled, instance destroyed");
                JobOutcome::Complete
            }
            OperationState::Failed => {
                let description = reply
                    .description
                    .unwrap_or_else(|| "deprovision failed".to_string());
                self.mark_failed(description.clone()).await;
                JobOutcome::Failed(description)
            }
            OperationState::InProgress => {
                if let Some(description) = reply.description {
                    let op = LastOperation {
                        description: Some(description),
                        ..instance
                            .last_operation
                            .unwrap_or_else(LastOperation::delete_in_progress)
                    };
                    if let Err(e) = self
                        .instances
                        .set_last_operation(&instance.id, Some(op))
                        .await
                    {
                        warn!(instance=%instance.id, error=%e, "failed to persist poll progress");
                    }
                }
                JobOutcome::Retry(self.poll_interval)
            }
        }
    }
}
