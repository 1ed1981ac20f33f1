use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use grape_master::{classifier::ClassificationService, server};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::mocks::StubClassifier;

pub const BOUNDARY: &str = "----grape-master-test-boundary";

/// One part of a multipart/form-data body.
pub enum FormPart<'a> {
    File {
        name: &'a str,
        filename: Option<&'a str>,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::File {
                name,
                filename,
                bytes,
            } => {
                let disposition = match filename {
                    Some(filename) => format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    ),
                    None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
                };
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(parts: &[FormPart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn image_request(filename: &str, bytes: &[u8]) -> Request<Body> {
    multipart_request(&[FormPart::File {
        name: "file",
        filename: Some(filename),
        bytes,
    }])
}

/// Router over a stub model, staging into a fresh temp directory.
pub struct TestApp {
    pub router: Router,
    pub model: StubClassifier,
    pub uploads_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new(model: StubClassifier) -> Self {
        Self::with_limit(model, 16 * 1024 * 1024)
    }

    pub fn with_limit(model: StubClassifier, max_upload_bytes: usize) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let uploads_dir = temp_dir.path().join("uploads");
        let service = ClassificationService::new(Arc::new(model.clone()), &uploads_dir);

        Self {
            router: server::router(service, max_upload_bytes),
            model,
            uploads_dir,
            _temp_dir: temp_dir,
        }
    }

    pub fn staged_files(&self) -> usize {
        count_files(&self.uploads_dir)
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
