use super::types::{ErrorResponse, StatusResponse};
use crate::{
    Error, Result,
    classifier::{ClassificationService, PredictionResult, UploadedImage},
};
use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub classifier: ClassificationService,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(e: Error) -> ApiError {
    (
        e.status_code(),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<PredictionResult>, ApiError> {
    let upload = read_upload(multipart).await.map_err(|e| {
        warn!("Unreadable upload: {}", e);
        error_response(e)
    })?;

    let prediction = state
        .classifier
        .classify(upload)
        .await
        .map_err(error_response)?;

    Ok(Json(prediction))
}

/// Answers CORS preflight without touching the upload path.
pub async fn preflight() -> impl IntoResponse {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
        Json(StatusResponse::ok()),
    )
}

/// Pulls the first `file` part carrying a filename out of the form. Bodies
/// that are not multipart at all count as having no file.
async fn read_upload(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Option<UploadedImage>> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            info!("Received non-multipart /predict request: {}", rejection);
            return Ok(None);
        }
    };

    let mut parts = Vec::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if upload.is_none() && name == "file" {
            if let Some(filename) = field.file_name().map(str::to_string) {
                info!("File received: {}", filename);
                let bytes = field.bytes().await.map_err(upload_error)?;
                upload = Some(UploadedImage::new(filename, bytes));
            }
        }
        parts.push(name);
    }

    info!("Received /predict request with parts: {:?}", parts);
    Ok(upload)
}

fn upload_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge(e.body_text())
    } else {
        Error::MalformedUpload(e.body_text())
    }
}
