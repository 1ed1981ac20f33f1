use super::types::Classification;
use crate::Result;
use std::path::Path;

/// A loaded image-classification model.
///
/// Implementations are loaded once at startup and shared read-only across
/// requests. `classify` is a blocking call; the service runs it on the
/// blocking thread pool.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: &Path) -> Result<Classification>;
}
