mod broker_create;
mod dependents;
mod instance_delete;
mod lock;
mod state_fetch;

pub use broker_create::*;
pub use dependents::*;
pub use instance_delete::*;
pub use lock::*;
pub use state_fetch::*;
