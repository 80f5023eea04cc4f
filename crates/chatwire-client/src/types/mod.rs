pub mod request;
pub mod session;

pub use request::{ChatRequest, ChatResponse};
pub use session::SessionAnnouncement;
