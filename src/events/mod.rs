use tracing::info;

use crate::models::{InstanceKind, ServiceBroker, ServiceInstance};

pub const SERVICE_INSTANCE_DELETE: &str = "audit.service_instance.delete";
pub const USER_PROVIDED_SERVICE_INSTANCE_DELETE: &str =
    "audit.user_provided_service_instance.delete";
pub const SERVICE_BROKER_CREATE: &str = "audit.service_broker.create";

/// Audit sink. Exactly one delete event is recorded per successful deletion,
/// whether it completed synchronously or through reconciliation; the event
/// kind follows the instance kind.
pub trait EventRecorder: Send + Sync {
    fn record_instance_delete(&self, instance: &ServiceInstance);
    fn record_broker_create(&self, broker: &ServiceBroker);
}

pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn record_instance_delete(&self, instance: &ServiceInstance) {
        let event = match instance.kind {
            InstanceKind::Managed => SERVICE_INSTANCE_DELETE,
            InstanceKind::UserProvided => {
                USER_PROVIDED_SERVICE_INSTANCE_DELETE
            }
        };
        info!(
            target: "audit",
            event = %event,
            instance = %instance.id,
            name = %instance.name,
            space = %instance.space_id,
        );
    }

    fn record_broker_create(&self, broker: &ServiceBroker) {
        info!(
            target: "audit",
            event = %SERVICE_BROKER_CREATE,
            broker = %broker.id,
            name = %broker.name,
            url = %broker.url,
        );
    }
}
