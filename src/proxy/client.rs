use super::types::UpstreamReply;
use crate::{Error, Result, config::ProxyConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ChatUpstream: Send + Sync {
    async fn forward(&self, body: Value) -> Result<UpstreamReply>;
}

/// OpenAI-compatible chat-completion endpoint (Groq by default).
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatUpstream for GroqClient {
    async fn forward(&self, body: Value) -> Result<UpstreamReply> {
        debug!("Forwarding to {}: {}", self.endpoint, body);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(e.to_string()))?;

        debug!("Upstream responded {} with {} bytes", status, body.len());

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
