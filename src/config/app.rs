use anyhow::Result;
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Broker client configuration
    #[envconfig(from = "BROKER_URL")]
    pub broker_url: Option<String>,

    #[envconfig(from = "BROKER_API_VERSION", default = "2.15")]
    pub broker_api_version: String,

    #[envconfig(from = "BROKER_USERNAME")]
    pub broker_username: Option<String>,

    #[envconfig(from = "BROKER_PASSWORD")]
    pub broker_password: Option<String>,

    #[envconfig(from = "BROKER_TIMEOUT", default = "60")]
    pub broker_timeout_seconds: u64,

    // Deprovision behavior
    #[envconfig(from = "ACCEPTS_INCOMPLETE", default = "true")]
    pub accepts_incomplete: bool,

    // Async operation reconciliation
    #[envconfig(from = "STATE_POLL_INTERVAL", default = "60")]
    pub state_poll_interval_seconds: u64,

    /// Ceiling on how long a deferred operation is polled before it is
    /// marked failed. Default is one week.
    #[envconfig(from = "STATE_POLL_MAX_DURATION", default = "604800")]
    pub state_poll_max_duration_seconds: u64,

    // Observability configuration
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(from = "LOG_FORMAT", default = "json")]
    pub log_format: String,
}

impl AppConfig {
    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self> {
        Ok(Self::init_from_env()?)
    }

    // Helper methods to get derived configurations
    pub fn broker_client(&self) -> Option<BrokerClientConfig> {
        self.broker_url.as_ref().map(|url| BrokerClientConfig {
            url: url.clone(),
            api_version: self.broker_api_version.clone(),
            auth_username: self.broker_username.clone(),
            auth_password: self.broker_password.clone(),
            timeout: Some(self.broker_timeout_seconds),
        })
    }

    pub fn reconcile_policy(&self) -> ReconcilePolicyConfig {
        ReconcilePolicyConfig {
            poll_interval: Duration::from_secs(
                self.state_poll_interval_seconds,
            ),
            max_poll_duration: Duration::from_secs(
                self.state_poll_max_duration_seconds,
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerClientConfig {
    pub url: String,
    pub api_version: String,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ReconcilePolicyConfig {
    pub poll_interval: Duration,
    pub max_poll_duration: Duration,
}

impl Default for ReconcilePolicyConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            max_poll_duration: Duration::from_secs(604_800),
        }
    }
}
