use crate::error::Result;
use crate::streaming::StreamHandle;
use crate::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;

/// A backend that can answer one conversational turn
///
/// Provides both a synchronous reply and a streamed one. Each call is a single
/// exchange with no retry: resending a turn would risk generating it twice.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Whole reply in one response
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Reply as incremental payloads on a cancellable handle.
    ///
    /// Never fails up front: request and transport errors arrive as the
    /// handle's single `Finished` outcome.
    fn chat_stream(&self, request: ChatRequest) -> StreamHandle;
}
