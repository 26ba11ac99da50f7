use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// One unit of background work. A job is re-run by its scheduler for as
/// long as it returns `Retry`; `Complete` and `Failed` are terminal.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn run(&self) -> JobOutcome;
}

#[derive(Debug)]
pub enum JobOutcome {
    Complete,
    /// Re-arm the same job after the given delay. The scheduler re-runs the
    /// job it already holds; no duplicate task is spawned.
    Retry(Duration),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Complete,
    Failed(String),
}

impl JobState {
    pub fn terminal(&self) -> bool {
        !matches!(self, JobState::Processing)
    }
}

/// Trackable handle returned from `JobScheduler::enqueue`. Callers may poll
/// `state()` or block on `wait()` for the terminal state.
pub struct PollableJobHandle {
    id: String,
    state: watch::Receiver<JobState>,
}

impl PollableJobHandle {
    pub fn new(id: String, state: watch::Receiver<JobState>) -> Self {
        Self { id, state }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    pub async fn wait(&mut self) -> JobState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if current.terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                // Sender dropped without a terminal send; report last seen.
                return self.state.borrow().clone();
            }
        }
    }
}

impl std::fmt::Debug for PollableJobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollableJobHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

pub trait JobScheduler: Send + Sync {
    fn enqueue(&self, job: Box<dyn Job>) -> PollableJobHandle;
}

/// Scheduler backed by one spawned tokio task per job. Retries sleep inside
/// the same task, so a job polling an external system re-arms rather than
/// fanning out.
pub struct TokioJobScheduler;

impl TokioJobScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioJobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler for TokioJobScheduler {
    fn enqueue(&self, job: Box<dyn Job>) -> PollableJobHandle {
        let (tx, rx) = watch::channel(JobState::Processing);
        let id = nanoid::nanoid!();
        let job_id = id.clone();
        tokio::spawn(async move {
            loop {
                match job.run().await {
                    JobOutcome::Complete => {
                        debug!(job=%job.name(), id=%job_id, "job complete");
                        let _ = tx.send(JobState::Complete);
                        break;
                    }
                    JobOutcome::Failed(msg) => {
                        warn!(job=%job.name(), id=%job_id, error=%msg, "job failed");
                        let _ = tx.send(JobState::Failed(msg));
                        break;
                    }
                    JobOutcome::Retry(delay) => {
                        debug!(job=%job.name(), id=%job_id, delay_ms=%delay.as_millis(), "job re-armed");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        });
        PollableJobHandle::new(id, rx)
    }
}
