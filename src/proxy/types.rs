use crate::{Error, Result};
use axum::{body::Bytes, http::StatusCode};
use serde_json::{Value, json};

/// What the chat-completion provider sent back, kept verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Turns a client payload into a provider chat-completion request.
///
/// `{"input": ...}` becomes a single user message; anything else is assumed
/// to already be a chat request and only gains `model` if it lacks one.
pub fn build_forward_body(payload: Value, model: &str) -> Result<Value> {
    let Value::Object(mut body) = payload else {
        return Err(Error::bad_request("Expected a JSON object"));
    };

    if let Some(input) = body.remove("input") {
        return Ok(json!({
            "model": model,
            "messages": [
                {"role": "user", "content": input}
            ]
        }));
    }

    body.entry("model")
        .or_insert_with(|| Value::String(model.to_string()));
    Ok(Value::Object(body))
}
