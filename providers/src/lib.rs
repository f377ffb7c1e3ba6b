//! HTTP transport for OpenAI-compatible chat endpoints.
//!
//! # Architecture
//!
//! - [`ChatClient::send_chat`] - single non-streaming `POST /v1/chat/completions`
//!   that returns the assistant text plus any document actions the server attached
//! - [`ChatClient::check_connection`] - models-list probe with a `/health` fallback
//!
//! # Error Handling
//!
//! Chat requests return [`TransportError`] for non-2xx statuses, transport
//! failures and undecodable bodies. Connection probes never fail: every outcome
//! is folded into a [`ConnectionReport`].

mod chat;
mod probe;

use std::sync::OnceLock;
use std::time::Duration;

pub use chat::{ChatReply, parse_chat_reply};
pub use probe::parse_model_ids;
pub use quill_types;

use quill_types::ApiKey;

const CONNECT_TIMEOUT_SECS: u64 = 30;

// TCP keepalive; reqwest only exposes the idle time, interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {}", .status.as_u16())]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl TransportError {
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Request(e) => e.status(),
            TransportError::Decode(_) => None,
        }
    }
}

/// Shared client with no whole-request timeout.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build tuned HTTP client: {e}. Using defaults.");
            reqwest::Client::new()
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(concat!("quill/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

pub fn http_client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Client for one OpenAI-compatible server.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClient {
    /// Uses the shared client; requests run until the server answers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: http_client().clone(),
        }
    }

    /// Dedicated client that gives up after `timeout_secs` per request.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http_client_with_timeout(timeout_secs)?,
        })
    }

    pub(crate) fn get(&self, url: &str, api_key: Option<&ApiKey>) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }
}
