// HTTP client for the backend chat service

use crate::buffer_utils::{parse_payload_stream, PayloadStream};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::streaming::StreamHandle;
use crate::traits::ChatBackend;
use crate::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use std::time::Duration;

const EVENT_STREAM: &str = "text/event-stream";

/// Chat service client (HTTP direct)
///
/// One request per turn on either endpoint:
/// - `POST {base_url}{chat_path}` answers with a single JSON reply
/// - `POST {base_url}{stream_path}` answers with an event stream of `data:` frames
#[derive(Debug, Clone)]
pub struct ChatClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::default()
    }

    /// Client with default paths for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ChatClientBuilder::from(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        validate(&request)?;

        let url = self.url(&self.config.chat_path);
        tracing::debug!(url = %url, session_id = ?request.session_id, "Sending chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        let response = ensure_body(ensure_success(response).await?)?;
        let body = response.text().await?;

        Ok(serde_json::from_str(&body)?)
    }

    fn chat_stream(&self, request: ChatRequest) -> StreamHandle {
        let url = self.url(&self.config.stream_path);
        let open = open_stream(self.http_client.clone(), url, request);
        StreamHandle::spawn(open, self.config.channel_capacity)
    }
}

async fn open_stream(
    http_client: reqwest::Client,
    url: String,
    request: ChatRequest,
) -> Result<PayloadStream> {
    validate(&request)?;

    tracing::debug!(url = %url, session_id = ?request.session_id, "Opening chat stream");

    let response = http_client
        .post(&url)
        .header(ACCEPT, EVENT_STREAM)
        .json(&request)
        .send()
        .await?;

    let response = ensure_body(ensure_success(response).await?)?;

    Ok(parse_payload_stream(response.bytes_stream()))
}

fn validate(request: &ChatRequest) -> Result<()> {
    if request.message.trim().is_empty() {
        return Err(ChatError::InvalidRequest("message must not be empty".to_string()));
    }
    Ok(())
}

/// Turn a non-success status into an error carrying the full body text
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await;
    Err(status_error(status, body))
}

fn status_error<E: std::fmt::Display>(
    status: StatusCode,
    body: std::result::Result<String, E>,
) -> ChatError {
    let body = body.unwrap_or_else(|e| {
        tracing::debug!(status = %status, error = %e, "Failed to read error body");
        String::new()
    });
    tracing::warn!(
        status = %status,
        body_len = body.len(),
        "Chat backend returned an error status"
    );
    ChatError::from_status(status.as_u16(), &body)
}

/// Success statuses that carry no body by definition cannot be read
fn ensure_body(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT => Err(ChatError::MissingBody {
            status: response.status().as_u16(),
        }),
        _ => Ok(response),
    }
}

/// Builder for [`ChatClient`]
#[derive(Debug, Default)]
pub struct ChatClientBuilder {
    base_url: Option<String>,
    chat_path: Option<String>,
    stream_path: Option<String>,
    channel_capacity: Option<usize>,
    connect_timeout: Option<Duration>,
}

impl From<ClientConfig> for ChatClientBuilder {
    fn from(config: ClientConfig) -> Self {
        Self {
            base_url: Some(config.base_url),
            chat_path: Some(config.chat_path),
            stream_path: Some(config.stream_path),
            channel_capacity: Some(config.channel_capacity),
            connect_timeout: config.connect_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl ChatClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = Some(path.into());
        self
    }

    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = Some(path.into());
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ChatError::Config("Base URL is required".to_string()))?;

        reqwest::Url::parse(&base_url)
            .map_err(|e| ChatError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        // Remove trailing slash from base URL
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut config = ClientConfig::new(base_url);
        if let Some(path) = self.chat_path {
            config.chat_path = path;
        }
        if let Some(path) = self.stream_path {
            config.stream_path = path;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        config.connect_timeout_ms = self
            .connect_timeout
            .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut http_builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.connect_timeout {
            http_builder = http_builder.connect_timeout(timeout);
        }

        let http_client = http_builder
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ChatClient {
            http_client,
            config,
        })
    }
}
