use super::{
    lifecycle::{RequestEvent, RequestLifecycle},
    model::ImageClassifier,
    staging::StagedFile,
    types::{Classification, PredictionResult, UploadedImage},
};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Owns the upload → stage → infer → cleanup → reply cycle for one model.
#[derive(Clone)]
pub struct ClassificationService {
    model: Arc<dyn ImageClassifier>,
    uploads_dir: PathBuf,
}

impl ClassificationService {
    pub fn new(model: Arc<dyn ImageClassifier>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Classifies one upload. `None` means the request carried no file part.
    pub async fn classify(&self, upload: Option<UploadedImage>) -> Result<PredictionResult> {
        let mut lifecycle = RequestLifecycle::new(Uuid::new_v4().to_string());

        match self.run(&mut lifecycle, upload).await {
            Ok(prediction) => {
                lifecycle.transition(RequestEvent::Respond)?;
                Ok(prediction)
            }
            Err(e) => {
                if e.is_client_error() {
                    warn!("Rejected request {}: {}", lifecycle.request_id(), e);
                } else {
                    error!("Request {} failed: {:?}", lifecycle.request_id(), e);
                }
                // Already logged by the state machine if this is illegal.
                lifecycle.transition(RequestEvent::Fail).ok();
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        lifecycle: &mut RequestLifecycle,
        upload: Option<UploadedImage>,
    ) -> Result<PredictionResult> {
        let upload = validate(upload)?;
        lifecycle.transition(RequestEvent::Validate)?;

        let staged = StagedFile::create(&self.uploads_dir, &upload.filename, &upload.bytes).await?;
        lifecycle.transition(RequestEvent::Stage)?;
        info!(
            "Image '{}' saved to: {}",
            upload.filename,
            staged.path().display()
        );

        let prediction = self.infer(staged).await?;
        lifecycle.transition(RequestEvent::Infer)?;
        lifecycle.transition(RequestEvent::Cleanup)?;

        info!(
            "Prediction: {} (confidence: {:.4})",
            prediction.label, prediction.confidence
        );
        Ok(prediction)
    }

    /// Runs the model on the blocking pool. The staged file lives until the
    /// model returns, even if the request is dropped first.
    async fn infer(&self, staged: StagedFile) -> Result<PredictionResult> {
        let model = Arc::clone(&self.model);

        let classification = tokio::task::spawn_blocking(move || {
            let classification = model.classify(staged.path());
            drop(staged);
            classification
        })
        .await
        .map_err(|e| Error::inference(format!("Model task failed: {}", e)))??;

        top1_prediction(&classification)
    }
}

fn validate(upload: Option<UploadedImage>) -> Result<UploadedImage> {
    let upload = upload.ok_or(Error::MissingFile)?;
    if upload.filename.is_empty() {
        return Err(Error::EmptyFilename);
    }
    Ok(upload)
}

/// Picks the highest-scoring class and checks it is presentable.
pub fn top1_prediction(classification: &Classification) -> Result<PredictionResult> {
    let index = classification
        .probs
        .top1()
        .ok_or_else(|| Error::inference("Model returned no class scores"))?;

    let label = classification
        .names
        .get(&index)
        .ok_or_else(|| Error::inference(format!("Model has no label for class index {}", index)))?;

    let confidence = classification.probs.0[index];
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(Error::inference(format!(
            "Model returned unusable confidence {} for class '{}'",
            confidence, label
        )));
    }

    Ok(PredictionResult::new(label.clone(), confidence))
}
