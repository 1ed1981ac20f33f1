pub mod handlers;
pub mod types;

use crate::{Result, classifier::ClassificationService, config::ServerConfig};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, post},
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Builds the classification router. CORS headers on `POST /predict` come
/// from the CORS layer; `OPTIONS /predict` is answered by its own handler so
/// preflights always get the JSON acknowledgement.
pub fn router(classifier: ClassificationService, max_upload_bytes: usize) -> Router {
    let app_state = handlers::AppState { classifier };

    let predict: MethodRouter<handlers::AppState> =
        post(handlers::predict).layer(CorsLayer::permissive());

    Router::new()
        .route("/predict", predict.options(handlers::preflight))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: ServerConfig, classifier: ClassificationService) -> Result<()> {
    let app = router(classifier, config.max_upload_bytes);

    let addr = SocketAddr::new(config.host.parse()?, config.port);

    info!("Starting classification server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
