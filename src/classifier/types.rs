use axum::body::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;

/// An image as received from the client, before any validation.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Top-1 prediction as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    #[serde(rename = "prediction")]
    pub label: String,
    pub confidence: f64,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            confidence: round_confidence(f64::from(probability)),
        }
    }
}

/// Rounds half away from zero to four decimal places.
pub fn round_confidence(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Score vector produced by a model, indexed by class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Probabilities(pub Vec<f32>);

impl Probabilities {
    /// Index of the highest score. NaN entries never win.
    pub fn top1(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, score)| !score.is_nan())
            .fold(None, |best: Option<(usize, f32)>, (idx, &score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((idx, score)),
            })
            .map(|(idx, _)| idx)
    }

    pub fn top1conf(&self) -> Option<f32> {
        self.top1().map(|idx| self.0[idx])
    }
}

/// Raw output of one model invocation.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub names: BTreeMap<usize, String>,
    pub probs: Probabilities,
}
