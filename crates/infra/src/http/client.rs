use std::time::Duration;

use async_trait::async_trait;
use imds_tagger_core::InstanceMetadataProvider;
use imds_tagger_domain::constants::{
    DEFAULT_IMDS_API_VERSION, DEFAULT_IMDS_ENDPOINT, DEFAULT_IMDS_FORMAT, DEFAULT_TIMEOUT,
    IMDS_COMPUTE_PATH, IMDS_MARKER_HEADER, IMDS_MARKER_VALUE,
};
use imds_tagger_domain::{InstanceDocument, TaggerConfig, TaggerError};
use reqwest::{Client as ReqwestClient, Url};
use serde_json::Value;
use tracing::debug;

use crate::errors::InfraError;

/// Client for the compute section of the instance metadata service.
///
/// Every request carries the `Metadata: True` marker header and the
/// `format` / `api-version` query parameters. Proxies are bypassed: the
/// endpoint is link-local and must never be routed through one.
#[derive(Clone)]
pub struct ImdsClient {
    client: ReqwestClient,
    url: String,
    format: String,
    api_version: String,
}

impl ImdsClient {
    /// Start building a new metadata client.
    pub fn builder() -> ImdsClientBuilder {
        ImdsClientBuilder::default()
    }

    /// Build a client for the endpoint and API version named in `config`.
    pub fn from_config(config: &TaggerConfig) -> Result<Self, TaggerError> {
        Self::builder()
            .endpoint(&config.endpoint)
            .api_version(&config.api_version)
            .timeout(config.timeout)
            .build()
    }

    /// Full URL of the compute document, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode the compute document.
    ///
    /// # Errors
    /// `TaggerError::Transport` when the request fails, times out or returns
    /// a non-success status; `TaggerError::Decode` when the body is not a
    /// JSON object.
    pub async fn fetch_document(&self, timeout: Duration) -> Result<InstanceDocument, TaggerError> {
        debug!(url = %self.url, api_version = %self.api_version, "requesting instance metadata");

        let response = self
            .client
            .get(&self.url)
            .header(IMDS_MARKER_HEADER, IMDS_MARKER_VALUE)
            .query(&[("format", self.format.as_str()), ("api-version", self.api_version.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| TaggerError::from(InfraError::from(err)))?;

        let status = response.status();
        debug!(%status, "received instance metadata response");

        let body = response
            .error_for_status()
            .map_err(|err| TaggerError::from(InfraError::from(err)))?
            .bytes()
            .await
            .map_err(|err| TaggerError::from(InfraError::from(err)))?;

        decode_document(&body)
    }
}

#[async_trait]
impl InstanceMetadataProvider for ImdsClient {
    async fn fetch(&self, timeout: Duration) -> imds_tagger_domain::Result<InstanceDocument> {
        self.fetch_document(timeout).await
    }
}

fn decode_document(body: &[u8]) -> Result<InstanceDocument, TaggerError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| TaggerError::from(InfraError::from(err)))?;

    if !value.is_object() {
        return Err(TaggerError::Decode("metadata response is not a JSON object".into()));
    }

    serde_json::from_value(value).map_err(|err| TaggerError::from(InfraError::from(err)))
}

/// Builder for [`ImdsClient`].
#[derive(Debug)]
pub struct ImdsClientBuilder {
    endpoint: String,
    path: String,
    format: String,
    api_version: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ImdsClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
            path: IMDS_COMPUTE_PATH.to_string(),
            format: DEFAULT_IMDS_FORMAT.to_string(),
            api_version: DEFAULT_IMDS_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

impl ImdsClientBuilder {
    /// Base URL of the metadata service, e.g. `http://169.254.169.254`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Upper bound for requests that do not carry their own deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ImdsClient, TaggerError> {
        if self.endpoint.trim().is_empty() {
            return Err(TaggerError::Config("metadata endpoint must not be empty".into()));
        }

        let endpoint = self.endpoint.trim();
        let parsed = Url::parse(endpoint).map_err(|err| {
            TaggerError::Config(format!("invalid metadata endpoint {endpoint:?}: {err}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(TaggerError::Config(format!(
                "metadata endpoint {endpoint:?} must be an http(s) URL with a host"
            )));
        }

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| TaggerError::from(InfraError::from(err)))?;

        let url = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );

        Ok(ImdsClient { client, url, format: self.format, api_version: self.api_version })
    }
}
