use crate::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;

/// A scratch file holding one upload for the duration of one request.
///
/// The file is removed when the guard is dropped, whichever way the request
/// ends (success, error, panic or cancellation).
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Writes `bytes` under `dir` using a request-unique name derived from
    /// `filename`. Creates `dir` if needed.
    pub async fn create(dir: &Path, filename: &str, bytes: &[u8]) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(staged_name(filename));
        // Armed before the write so a partially written file is still removed.
        let staged = Self { path };
        tokio::fs::write(&staged.path, bytes).await?;

        debug!("Staged {} bytes at {}", bytes.len(), staged.path.display());
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

fn staged_name(filename: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(filename))
}

/// Reduces an untrusted client filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    }
}
