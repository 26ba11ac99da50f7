use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::broker::{
    BrokerClient, DeprovisionResponse, LastOperationResponse,
};
use crate::config::BrokerClientConfig;
use crate::errors::BrokerError;
use crate::models::{OperationState, ServiceBroker, ServiceInstance};

#[derive(Debug, Deserialize)]
struct AsyncReplyBody {
    #[serde(default)]
    operation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LastOperationBody {
    state: OperationState,
    #[serde(default)]
    description: Option<String>,
}

/// OSB v2 HTTP client. Connections are pooled by reqwest; every request
/// carries the API version header and basic auth when configured.
pub struct HttpBrokerClient {
    http: reqwest::Client,
    config: BrokerClientConfig,
}

impl HttpBrokerClient {
    pub fn new(config: BrokerClientConfig) -> Result<Self, BrokerError> {
        if !(config.url.starts_with("http://")
            || config.url.starts_with("https://"))
        {
            return Err(BrokerError::Configuration(
                "broker URL must start with http:// or https://".into(),
            ));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(BrokerError::Request)?;
        Ok(Self { http, config })
    }

    fn instance_url(&self, instance: &ServiceInstance) -> String {
        format!(
            "{}/v2/service_instances/{}",
            self.config.url.trim_end_matches('/'),
            instance.id
        )
    }

    fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        let req =
            req.header("X-Broker-API-Version", &self.config.api_version);
        if let Some(user) = &self.config.auth_username {
            req.basic_auth(user, self.config.auth_password.as_deref())
        } else {
            req
        }
    }

    fn collect_warnings(resp: &reqwest::Response) -> Vec<String> {
        resp.headers()
            .get_all(header::WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl BrokerClient for HttpBrokerClient {
    async fn deprovision(
        &self,
        instance: &ServiceInstance,
        accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError> {
        let mut req = self
            .http
            .delete(self.instance_url(instance))
            .query(&[("accepts_incomplete", accepts_incomplete.to_string())]);
        if let Some(service_id) = &instance.service_id {
            req = req.query(&[("service_id", service_id)]);
        }
        if let Some(plan_id) = &instance.plan_id {
            req = req.query(&[("plan_id", plan_id)]);
        }
        let resp = self.decorate(req).send().await?;
        let warnings = Self::collect_warnings(&resp);
        debug!(instance=%instance.id, status=%resp.status(), "deprovision reply");
        match resp.status() {
            // 410 means the broker no longer knows the instance; for a
            // delete that is completion, not an error.
            StatusCode::OK | StatusCode::GONE => {
                let mut out = DeprovisionResponse::succeeded();
                out.warnings = warnings;
                Ok(out)
            }
            StatusCode::ACCEPTED => {
                let body: AsyncReplyBody =
                    resp.json().await.map_err(BrokerError::Request)?;
                let mut out = DeprovisionResponse::in_progress(body.operation);
                out.warnings = warnings;
                Ok(out)
            }
            status => Err(BrokerError::RequestFailed(status)),
        }
    }

    async fn fetch_last_operation(
        &self,
        instance: &ServiceInstance,
    ) -> Result<LastOperationResponse, BrokerError> {
        let mut req = self
            .http
            .get(format!("{}/last_operation", self.instance_url(instance)));
        if let Some(op) = instance
            .last_operation
            .as_ref()
            .and_then(|o| o.broker_operation.as_ref())
        {
            req = req.query(&[("operation", op)]);
        }
        if let Some(service_id) = &instance.service_id {
            req = req.query(&[("service_id", service_id)]);
        }
        if let Some(plan_id) = &instance.plan_id {
            req = req.query(&[("plan_id", plan_id)]);
        }
        let resp = self.decorate(req).send().await?;
        match resp.status() {
            StatusCode::OK => {
                let body: LastOperationBody =
                    resp.json().await.map_err(BrokerError::Request)?;
                Ok(LastOperationResponse {
                    state: body.state,
                    description: body.description,
                })
            }
            // Polling a deleted instance: gone is terminal success.
            StatusCode::GONE => Ok(LastOperationResponse {
                state: OperationState::Succeeded,
                description: None,
            }),
            status => Err(BrokerError::RequestFailed(status)),
        }
    }

    async fn check_catalog(
        &self,
        broker: &ServiceBroker,
    ) -> Result<(), BrokerError> {
        let url =
            format!("{}/v2/catalog", broker.url.trim_end_matches('/'));
        let mut req = self
            .http
            .get(url)
            .header("X-Broker-API-Version", &self.config.api_version);
        if let Some(user) = &broker.auth_username {
            req = req.basic_auth(user, broker.auth_password.as_deref());
        }
        let resp = req.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BrokerError::RequestFailed(resp.status()))
        }
    }
}
