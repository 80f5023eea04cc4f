use serde::Deserialize;

/// First frame of a backend stream: `{"sessionId": 42}`.
///
/// The pipeline delivers it like any other payload. Callers that track
/// sessions recognise it here and keep it out of the visible reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionAnnouncement {
    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: i64,
}

impl SessionAnnouncement {
    pub fn from_payload(payload: &str) -> Option<Self> {
        let trimmed = payload.trim_start();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }
}
