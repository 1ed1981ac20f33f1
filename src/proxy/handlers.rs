use super::{client::ChatUpstream, types::build_forward_body};
use crate::{
    Error,
    server::{handlers::error_response, types::StatusResponse},
};
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ProxyState {
    pub upstream: Arc<dyn ChatUpstream>,
    pub model: String,
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Forwards a chat payload to the provider and mirrors its reply.
/// The body is parsed as JSON whatever the declared content type.
pub async fn generate(State(state): State<ProxyState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("JSON parse error: {}", e);
            return error_response(Error::bad_request("Invalid JSON")).into_response();
        }
    };

    info!("Received payload: {}", payload);

    let forward_body = match build_forward_body(payload, &state.model) {
        Ok(forward_body) => forward_body,
        Err(e) => {
            warn!("Rejected payload: {}", e);
            return error_response(e).into_response();
        }
    };

    match state.upstream.forward(forward_body).await {
        Ok(reply) => {
            info!("Upstream response status: {}", reply.status);
            let content_type = reply
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            (reply.status, [(header::CONTENT_TYPE, content_type)], reply.body).into_response()
        }
        Err(e) => {
            error!("Upstream request failed: {}", e);
            error_response(e).into_response()
        }
    }
}
