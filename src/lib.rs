pub mod broker;
pub mod config;
pub mod errors;
pub mod events;
pub mod jobs;
pub mod models;
pub mod services;
pub mod storage;

pub use config::*;
pub use errors::*;
pub use models::*;
pub use storage::*;

// Re-export the collaborator seams and orchestrators by name to avoid
// dragging every wire type to the crate root.
pub use broker::{
    BrokerClient, DeprovisionResponse, HttpBrokerClient, LastOperationResponse,
};
pub use events::{EventRecorder, TracingEventRecorder};
pub use jobs::{
    Job, JobOutcome, JobScheduler, JobState, PollableJobHandle,
    TokioJobScheduler,
};
pub use services::{
    BrokerCreateRequest, BrokerCreateResult, DeleterLock, InstanceStateFetchJob,
    ServiceBrokerCreate, ServiceInstanceDelete,
};
