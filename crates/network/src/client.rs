// crates/network/src/client.rs
//! HTTP client for a single Radarr/Sonarr instance

use crate::error::{NetworkError, NetworkResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use guidesync_core::{RecordKind, RemoteApi, RemoteId, RemoteResult};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response, Url};
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";
const MAX_ERROR_BODY: usize = 300;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Path between the base URL and the resource name
    pub api_prefix: String,
    /// Retry policy for reads; writes are attempted once
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("guidesync/{}", env!("CARGO_PKG_VERSION")),
            api_prefix: "api/v3".to_string(),
            retry_policy: RetryPolicy::new(3),
        }
    }
}

/// Authenticated client for one service instance
#[derive(Clone)]
pub struct ServiceClient {
    inner: ReqwestClient,
    base_url: String,
    config: ClientConfig,
}

impl ServiceClient {
    /// Creates a client with default configuration
    pub fn new(base_url: &str, api_key: &str) -> NetworkResult<Self> {
        Self::with_config(base_url, api_key, ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(base_url: &str, api_key: &str, config: ClientConfig) -> NetworkResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| NetworkError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(format!(
                "{trimmed}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut key = HeaderValue::from_str(api_key).map_err(|_| NetworkError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner,
            base_url: trimmed.to_string(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a resource collection, or of one record when `id` is given
    pub fn resource_url(&self, kind: RecordKind, id: Option<&RemoteId>) -> String {
        let prefix = self.config.api_prefix.trim_matches('/');
        match id {
            Some(id) => format!("{}/{}/{}/{}", self.base_url, prefix, kind.api_resource(), id),
            None => format!("{}/{}/{}", self.base_url, prefix, kind.api_resource()),
        }
    }

    /// Sends one request and turns non-success statuses into errors
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> NetworkResult<Response> {
        log::debug!("{} {}", method, url);

        let mut request = self.inner.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            text.chars().take(MAX_ERROR_BODY).collect()
        };

        Err(NetworkError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json(response: Response) -> NetworkResult<Value> {
        response
            .json::<Value>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }

    /// GET with retry of transport failures and 5xx responses
    pub async fn get_json(&self, url: &str) -> NetworkResult<Value> {
        self.config
            .retry_policy
            .run(
                || async {
                    let response = self.execute(Method::GET, url, None).await?;
                    Self::read_json(response).await
                },
                NetworkError::is_retryable,
            )
            .await
    }
}

#[async_trait]
impl RemoteApi for ServiceClient {
    async fn get_records(&self, kind: RecordKind) -> RemoteResult<Vec<Value>> {
        let url = self.resource_url(kind, None);
        match self.get_json(&url).await? {
            Value::Array(records) => {
                log::debug!("Fetched {} {} record(s)", records.len(), kind);
                Ok(records)
            }
            other => Err(NetworkError::InvalidResponse(format!(
                "expected a list of {} records, got {}",
                kind,
                json_type(&other)
            ))
            .into()),
        }
    }

    async fn create_record(&self, kind: RecordKind, payload: &Value) -> RemoteResult<Value> {
        let url = self.resource_url(kind, None);
        let response = self.execute(Method::POST, &url, Some(payload)).await?;
        Ok(Self::read_json(response).await?)
    }

    async fn update_record(
        &self,
        kind: RecordKind,
        id: &RemoteId,
        payload: &Value,
    ) -> RemoteResult<()> {
        let url = self.resource_url(kind, Some(id));
        self.execute(Method::PUT, &url, Some(payload)).await?;
        Ok(())
    }

    async fn delete_record(&self, kind: RecordKind, id: &RemoteId) -> RemoteResult<()> {
        let url = self.resource_url(kind, Some(id));
        self.execute(Method::DELETE, &url, None).await?;
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
