pub mod lifecycle;
mod model;
mod onnx;
mod service;
mod staging;
mod types;

pub use model::ImageClassifier;
pub use onnx::{OnnxClassifier, load_labels, preprocess, softmax};
pub use service::{ClassificationService, top1_prediction};
pub use staging::{StagedFile, sanitize_filename};
pub use types::*;
