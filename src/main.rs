use anyhow::Result;
use grape_master::{
    classifier::{ClassificationService, OnnxClassifier},
    config, proxy, server,
};
use std::sync::Arc;
use tracing::info;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG directives override the configured level
    let log_level = config.server.logs.level.clone();
    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(&log_level)?,
    };
    let log_level = filter.to_string();
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting grape-master with log level: {}", log_level);
    info!("Configuration loaded successfully");

    // Loaded once, shared read-only by every request
    let model = Arc::new(OnnxClassifier::load(&config.model)?);
    let classifier = ClassificationService::new(model, config.server.uploads_dir.clone());

    let classification = server::run(config.server.clone(), classifier);

    match config.proxy {
        Some(proxy_config) => {
            tokio::try_join!(classification, proxy::run(proxy_config))?;
        }
        None => classification.await?,
    }

    Ok(())
}
