use crate::Result;
use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Result of one probe call, as seen from the client side.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Prediction { prediction: String, confidence: f64 },
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    prediction: String,
    confidence: f64,
}

/// Uploads images to a running `/predict` endpoint.
pub struct PredictClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PredictClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn predict_file(&self, image: &Path) -> Result<ProbeOutcome> {
        let bytes = tokio::fs::read(image).await?;
        let filename = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        debug!("Uploading {} ({} bytes) to {}", filename, bytes.len(), self.endpoint);

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));
        let response = self.http.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if status == StatusCode::OK {
            let body: PredictionBody = response.json().await?;
            Ok(ProbeOutcome::Prediction {
                prediction: body.prediction,
                confidence: body.confidence,
            })
        } else {
            Ok(ProbeOutcome::Rejected {
                status,
                body: response.text().await?,
            })
        }
    }
}

/// Supported images directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Exercises a running chat proxy.
pub struct ProxyProbe {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyProbe {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> Result<(StatusCode, String)> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok((response.status(), response.text().await?))
    }

    pub async fn generate(&self, input: &str) -> Result<(StatusCode, String)> {
        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .json(&json!({ "input": input }))
            .send()
            .await?;
        Ok((response.status(), response.text().await?))
    }
}
