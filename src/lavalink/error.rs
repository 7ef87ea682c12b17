use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised while talking to a Lavalink node
#[derive(Error, Debug)]
pub enum LavalinkError {
    #[error("HTTP request to node failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node {0} has no active session")]
    NoSession(String),

    #[error("Node responded with {status}: {message}")]
    Rest { status: u16, message: String },

    #[error("Failed to load tracks: {0}")]
    LoadFailed(String),

    #[error("Invalid header value for node {0}")]
    InvalidHeader(String),
}

pub type LavalinkResult<T> = Result<T, LavalinkError>;
