use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Display is exactly the server-provided body, or a synthesized
    /// `request failed: <code>` when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("no response body")]
    MissingBody { status: u16 },

    #[error("stream read error: {0}")]
    Read(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Build a status error from a non-success response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("request failed: {}", status)
        } else {
            body.to_string()
        };
        ChatError::Status { status, message }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
