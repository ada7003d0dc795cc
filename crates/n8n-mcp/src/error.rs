//! Error types for the n8n MCP server.

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Main error type for talking to n8n.
#[derive(Error, Debug)]
pub enum N8nError {
    /// Required credential missing or unusable. Aborts only the requesting call.
    #[error("{0}")]
    Configuration(String),

    /// n8n answered with a non-2xx status.
    #[error("n8n API {method} {path} failed: {status} {status_text}")]
    RemoteApi {
        method: Method,
        path: String,
        status: u16,
        status_text: String,
        /// Decoded response body (or `{"raw": ...}`); `None` when the body was empty.
        details: Option<Value>,
    },

    /// Network or protocol failure before a response was read.
    #[error("n8n request failed: {0}")]
    Transport(String),

    /// Request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for n8n operations.
pub type Result<T> = std::result::Result<T, N8nError>;

impl From<reqwest::Error> for N8nError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

impl N8nError {
    /// Upstream response detail, if this is a [`N8nError::RemoteApi`] carrying a body.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::RemoteApi { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
