//! Chat-completion proxy: reshapes simple `{"input": ...}` payloads into
//! provider requests and relays the provider's answer untouched.

mod client;
pub mod handlers;
mod types;

pub use client::{ChatUpstream, GroqClient};
pub use types::{UpstreamReply, build_forward_body};

use crate::{Result, config::ProxyConfig};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(upstream: Arc<dyn ChatUpstream>, model: impl Into<String>) -> Router {
    let state = handlers::ProxyState {
        upstream,
        model: model.into(),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ProxyConfig) -> Result<()> {
    if config.api_key.is_empty() {
        warn!("No provider API key configured; upstream calls will be rejected");
    }

    let upstream = Arc::new(GroqClient::new(&config)?);
    let app = router(upstream, config.model.clone());

    let addr = SocketAddr::new(config.host.parse()?, config.port);

    info!(
        "Starting chat proxy on {} (endpoint: {}, model: {})",
        addr, config.endpoint, config.model
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
