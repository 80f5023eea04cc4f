use std::io::Write;
use std::sync::Arc;

use chatwire_client::{ChatBackend, ChatRequest};

use crate::config::ChatConfig;
use crate::render::{render_reply, render_stream, TurnReport};

/// One conversation as seen from the terminal
///
/// Remembers the session id the backend announces, so later turns continue
/// the same conversation.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    session_id: Option<i64>,
    doc_type_id: String,
    stream: bool,
    cancel_on_interrupt: bool,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, chat: &ChatConfig) -> Self {
        Self {
            backend,
            session_id: None,
            doc_type_id: chat.doc_type_id.clone(),
            stream: chat.stream,
            cancel_on_interrupt: false,
        }
    }

    pub fn with_session(mut self, session_id: Option<i64>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Let Ctrl-C cancel an in-flight streaming turn
    pub fn cancel_on_interrupt(mut self, enabled: bool) -> Self {
        self.cancel_on_interrupt = enabled;
        self
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn request(&self, message: &str) -> ChatRequest {
        let request = ChatRequest::new(message).with_doc_type(self.doc_type_id.clone());
        match self.session_id {
            Some(id) => request.with_session(id),
            None => request,
        }
    }

    /// Send one turn and write the reply to `out`
    pub async fn send<W: Write>(
        &mut self,
        message: &str,
        out: &mut W,
    ) -> anyhow::Result<TurnReport> {
        let request = self.request(message);
        tracing::info!(session_id = ?self.session_id, stream = self.stream, "Sending turn");

        let report = if self.stream {
            let handle = self.backend.chat_stream(request);

            let watcher = self.cancel_on_interrupt.then(|| {
                let token = handle.cancellation_token();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                })
            });

            let report = render_stream(handle, out).await;
            if let Some(watcher) = watcher {
                watcher.abort();
            }
            report?
        } else {
            render_reply(self.backend.chat(request).await, out)?
        };

        if let Some(id) = report.session_id {
            self.session_id = Some(id);
        }

        tracing::info!(outcome = ?report.outcome, shown = report.shown, "Turn finished");
        Ok(report)
    }
}
