// Client configuration, deserializable from the caller's config layer

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_PATH: &str = "/chat";
pub const DEFAULT_STREAM_PATH: &str = "/chat/stream";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Connection settings for the backend chat service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. "http://localhost:9000/api"
    pub base_url: String,

    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Bound of the payload channel between the stream task and the caller
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Applies to connection establishment only; reads are never timed out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: default_chat_path(),
            stream_path: default_stream_path(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            connect_timeout_ms: None,
        }
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_stream_path() -> String {
    DEFAULT_STREAM_PATH.to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
