use futures::{Future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::buffer_utils::PayloadStream;
use crate::error::{ChatError, Result};

/// Item delivered on a stream handle's channel.
///
/// Zero or more `Payload`s are followed by exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Payload {
        content: String,
    },

    Finished {
        outcome: StreamOutcome,
    },
}

/// Terminal state of one streaming exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamOutcome {
    Completed {
        payloads: usize,
    },

    Failed {
        kind: FailureKind,
        message: String,
    },

    Cancelled {
        payloads: usize,
    },
}

impl StreamOutcome {
    pub fn failed(error: &ChatError) -> Self {
        Self::Failed {
            kind: FailureKind::from(error),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Status { status: u16 },
    MissingBody,
    Read,
    Decode,
    InvalidRequest,
    Config,
}

impl From<&ChatError> for FailureKind {
    fn from(error: &ChatError) -> Self {
        match error {
            ChatError::Transport(_) => FailureKind::Transport,
            ChatError::Status { status, .. } => FailureKind::Status { status: *status },
            ChatError::MissingBody { .. } => FailureKind::MissingBody,
            ChatError::Read(_) => FailureKind::Read,
            ChatError::Decode(_) => FailureKind::Decode,
            ChatError::InvalidRequest(_) => FailureKind::InvalidRequest,
            ChatError::Config(_) => FailureKind::Config,
        }
    }
}

/// Running stream exchange: a payload channel plus a cancel switch.
///
/// Dropping the handle cancels the exchange.
pub struct StreamHandle {
    events: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
}

impl StreamHandle {
    /// Run `open` and the payload stream it yields on a background task
    pub fn spawn<F>(open: F, capacity: usize) -> Self
    where
        F: Future<Output = Result<PayloadStream>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let outcome = drive(open, &tx, &token).await;
            tracing::debug!(?outcome, "Stream finished");
            let _ = tx.send(StreamEvent::Finished { outcome }).await;
        });

        Self {
            events: rx,
            cancel,
        }
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Stop reading; the outcome becomes `Cancelled` unless already decided
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token for cancelling from elsewhere, e.g. a signal handler
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the channel, handing each payload to `on_payload`
    pub async fn for_each_payload<F>(mut self, mut on_payload: F) -> StreamOutcome
    where
        F: FnMut(&str),
    {
        while let Some(event) = self.next_event().await {
            match event {
                StreamEvent::Payload { content } => on_payload(&content),
                StreamEvent::Finished { outcome } => return outcome,
            }
        }

        StreamOutcome::Failed {
            kind: FailureKind::Read,
            message: "stream task ended without an outcome".to_string(),
        }
    }

    /// Concatenate every payload into one reply
    pub async fn collect_reply(self) -> (String, StreamOutcome) {
        let mut reply = String::new();
        let outcome = self.for_each_payload(|payload| reply.push_str(payload)).await;
        (reply, outcome)
    }
}

impl Stream for StreamHandle {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive<F>(
    open: F,
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> StreamOutcome
where
    F: Future<Output = Result<PayloadStream>>,
{
    let mut payloads = 0;

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamOutcome::Cancelled { payloads },
        opened = open => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => return StreamOutcome::failed(&e),
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled { payloads },
            next = stream.next() => next,
        };

        match next {
            Some(Ok(content)) => {
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return StreamOutcome::Cancelled { payloads },
                    sent = tx.send(StreamEvent::Payload { content }) => sent,
                };
                if sent.is_err() {
                    // receiver dropped, nobody left to render
                    return StreamOutcome::Cancelled { payloads };
                }
                payloads += 1;
            }
            Some(Err(e)) => return StreamOutcome::failed(&e),
            None => return StreamOutcome::Completed { payloads },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_utils::parse_payload_stream;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn body(parts: Vec<&'static str>) -> PayloadStream {
        parse_payload_stream(stream::iter(
            parts.into_iter().map(|p| Ok::<_, String>(p.as_bytes().to_vec())),
        ))
    }

    #[tokio::test]
    async fn test_payloads_then_single_outcome() {
        let mut handle = StreamHandle::spawn(async { Ok(body(vec!["data: a\n", "data: b\n"])) }, 4);

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::Payload { content: "a".to_string() },
                StreamEvent::Payload { content: "b".to_string() },
                StreamEvent::Finished { outcome: StreamOutcome::Completed { payloads: 2 } },
            ]
        );
    }

    #[tokio::test]
    async fn test_open_failure_reported_once() {
        let handle = StreamHandle::spawn(
            async { Err(ChatError::from_status(429, "rate limited")) },
            4,
        );

        let events: Vec<_> = handle.collect().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Finished { outcome } => {
                assert_eq!(outcome.error_message(), Some("rate limited"));
                assert!(matches!(
                    outcome,
                    StreamOutcome::Failed { kind: FailureKind::Status { status: 429 }, .. }
                ));
            }
            other => panic!("expected outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_failure_keeps_prior_payloads() {
        let source = stream::iter(vec![
            Ok(b"data: partial reply\n".to_vec()),
            Err("reset by peer".to_string()),
        ]);
        let handle = StreamHandle::spawn(async move { Ok(parse_payload_stream(source)) }, 4);

        let (reply, outcome) = handle.collect_reply().await;
        assert_eq!(reply, "partial reply");
        assert_eq!(outcome.error_message(), Some("stream read error: reset by peer"));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_bytes() {
        let pending = stream::iter(vec![Ok::<_, String>(b"data: first\n".to_vec())])
            .chain(stream::pending());
        let mut handle = StreamHandle::spawn(async move { Ok(parse_payload_stream(pending)) }, 4);

        assert_eq!(
            handle.next_event().await,
            Some(StreamEvent::Payload { content: "first".to_string() })
        );

        handle.cancel();

        assert_eq!(
            handle.next_event().await,
            Some(StreamEvent::Finished { outcome: StreamOutcome::Cancelled { payloads: 1 } })
        );
        assert_eq!(handle.next_event().await, None);
    }

    /// Sets its flag when the byte source holding it is dropped
    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn tracked_body<S>(source: S) -> (PayloadStream, Arc<AtomicBool>)
    where
        S: Stream<Item = std::result::Result<Vec<u8>, String>> + Send + 'static,
    {
        let released = Arc::new(AtomicBool::new(false));
        let flag = ReleaseFlag(released.clone());
        let source = source.map(move |chunk| {
            let _held = &flag;
            chunk
        });
        (parse_payload_stream(source), released)
    }

    #[tokio::test]
    async fn test_byte_source_released_on_cancel() {
        let (body, released) = tracked_body(
            stream::iter(vec![Ok(b"data: first\n".to_vec())]).chain(stream::pending()),
        );
        let mut handle = StreamHandle::spawn(async move { Ok(body) }, 4);

        assert_eq!(
            handle.next_event().await,
            Some(StreamEvent::Payload { content: "first".to_string() })
        );
        assert!(!released.load(Ordering::SeqCst));

        handle.cancel();

        assert_eq!(
            handle.next_event().await,
            Some(StreamEvent::Finished { outcome: StreamOutcome::Cancelled { payloads: 1 } })
        );
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_byte_source_released_on_read_error() {
        let (body, released) = tracked_body(stream::iter(vec![
            Ok(b"data: a\n".to_vec()),
            Err("boom".to_string()),
        ]));
        let handle = StreamHandle::spawn(async move { Ok(body) }, 4);

        let (reply, outcome) = handle.collect_reply().await;
        assert_eq!(reply, "a");
        assert_eq!(
            outcome,
            StreamOutcome::Failed {
                kind: FailureKind::Read,
                message: "stream read error: boom".to_string(),
            }
        );
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_before_open_completes() {
        let handle = StreamHandle::spawn(
            async {
                futures::future::pending::<()>().await;
                Ok(body(vec![]))
            },
            1,
        );
        handle.cancel();

        let (reply, outcome) = handle.collect_reply().await;
        assert!(reply.is_empty());
        assert_eq!(outcome, StreamOutcome::Cancelled { payloads: 0 });
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = StreamOutcome::Failed {
            kind: FailureKind::MissingBody,
            message: "no response body".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"]["kind"], "missing_body");
        assert_eq!(json["message"], "no response body");
    }
}
