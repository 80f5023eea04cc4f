use serde::{Deserialize, Serialize};

/// One conversational turn sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    /// Existing session to continue; the backend opens a new one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            doc_type_id: None,
        }
    }

    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_doc_type(mut self, doc_type_id: impl Into<String>) -> Self {
        self.doc_type_id = Some(doc_type_id.into());
        self
    }
}

/// Synchronous reply from the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,

    #[serde(
        rename = "sessionId",
        alias = "session_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<i64>,
}
