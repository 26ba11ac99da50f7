pub mod broker;
pub mod instance;
pub mod operation;

pub use broker::*;
pub use instance::*;
pub use operation::*;

use serde::{Deserialize, Serialize};

/// Non-fatal observation surfaced alongside a batch outcome; warnings never
/// block success reporting for instances that otherwise succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleWarning {
    pub detail: String,
}

impl LifecycleWarning {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for LifecycleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}
