//! Chat-completion request/response handling.

use quill_types::{ActionRecord, ChatEndpoint, WireMessage};
use serde::Serialize;
use serde_json::Value;

use crate::{ChatClient, TransportError, read_capped_error_body};

/// Host tag sent in `extra.host`; servers use it to decide which actions to emit.
const HOST_TAG: &str = "word";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage<'a>],
    stream: bool,
    extra: RequestExtra,
}

#[derive(Serialize)]
struct RequestExtra {
    mcp: bool,
    host: &'static str,
}

/// Parsed assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatReply {
    pub assistant_text: String,
    /// `None` when the response carried no action array at all.
    pub actions: Option<Vec<ActionRecord>>,
}

/// Extract the assistant text and action batch from a completion body.
///
/// Text comes from `choices[0].message.content` (empty when absent). Actions
/// come from `choices[0].message.mcp_actions`, falling back to a top-level
/// `mcp_actions`; either must be an array to count.
#[must_use]
pub fn parse_chat_reply(body: &Value) -> ChatReply {
    let message = body.pointer("/choices/0/message");

    let assistant_text = message
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let actions = message
        .and_then(|m| m.get("mcp_actions"))
        .and_then(ActionRecord::parse_batch)
        .or_else(|| body.get("mcp_actions").and_then(ActionRecord::parse_batch));

    ChatReply {
        assistant_text,
        actions,
    }
}

impl ChatClient {
    /// Send the whole conversation and wait for one complete reply.
    pub async fn send_chat(
        &self,
        endpoint: &ChatEndpoint,
        messages: &[WireMessage<'_>],
    ) -> Result<ChatReply, TransportError> {
        let body = ChatRequest {
            model: endpoint.model(),
            messages,
            stream: false,
            extra: RequestExtra {
                mcp: true,
                host: HOST_TAG,
            },
        };

        let url = endpoint.chat_completions_url();
        tracing::debug!(
            url = %url,
            model = endpoint.model(),
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(endpoint.api_key().expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(%status, body_bytes = body.len(), "Chat completion failed");
            return Err(TransportError::Http { status, body });
        }

        let bytes = response.bytes().await?;
        let json: Value = serde_json::from_slice(&bytes).map_err(TransportError::Decode)?;
        let reply = parse_chat_reply(&json);
        tracing::debug!(
            text_chars = reply.assistant_text.chars().count(),
            actions = reply.actions.as_ref().map_or(0, Vec::len),
            "Chat completion received"
        );
        Ok(reply)
    }
}
