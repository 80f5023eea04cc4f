pub mod buffer_utils;
pub mod client;
pub mod config;
pub mod error;
pub mod streaming;
pub mod traits;
pub mod types;

pub use buffer_utils::{extract_frames, parse_payload_stream, PendingBuffer, Utf8Decoder};
pub use client::{ChatClient, ChatClientBuilder};
pub use config::ClientConfig;
pub use error::{ChatError, Result};
pub use streaming::{FailureKind, StreamEvent, StreamHandle, StreamOutcome};
pub use traits::ChatBackend;
pub use types::{ChatRequest, ChatResponse, SessionAnnouncement};
