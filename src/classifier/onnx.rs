use super::{
    model::ImageClassifier,
    types::{Classification, Probabilities},
};
use crate::{Error, Result, config::ModelConfig};
use image::{DynamicImage, imageops::FilterType};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Image classifier backed by an ONNX graph taking one `1x3xNxN` f32 input.
pub struct OnnxClassifier {
    plan: OnnxPlan,
    labels: Vec<String>,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
    softmax: bool,
}

impl OnnxClassifier {
    pub fn load(config: &ModelConfig) -> Result<Self> {
        info!("Loading model from: {}", config.path.display());

        let size = config.input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(&config.path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                Error::model(format!(
                    "Failed to load {}: {:#}",
                    config.path.display(),
                    e
                ))
            })?;

        let labels = match &config.labels_path {
            Some(path) => load_labels(path)?,
            None => Vec::new(),
        };

        info!(
            "Model ready ({}x{} input, {} labels)",
            config.input_size,
            config.input_size,
            labels.len()
        );

        Ok(Self {
            plan,
            labels,
            input_size: config.input_size,
            mean: config.mean,
            std: config.std,
            softmax: config.softmax,
        })
    }

    fn scores(&self, image: &DynamicImage) -> TractResult<Vec<f32>> {
        let input: Tensor = preprocess(image, self.input_size, self.mean, self.std).into();
        let outputs = self.plan.run(tvec!(input.into()))?;
        let scores = outputs[0].to_array_view::<f32>()?.iter().copied().collect();
        Ok(scores)
    }

    fn names(&self, classes: usize) -> BTreeMap<usize, String> {
        class_names(&self.labels, classes)
    }
}

/// Maps each output index to its label, falling back to the index itself.
fn class_names(labels: &[String], classes: usize) -> BTreeMap<usize, String> {
    (0..classes)
        .map(|idx| {
            let name = labels.get(idx).cloned().unwrap_or_else(|| idx.to_string());
            (idx, name)
        })
        .collect()
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, path: &Path) -> Result<Classification> {
        let decoded = image::open(path).map_err(|e| {
            Error::inference(format!("Failed to decode image {}: {}", path.display(), e))
        })?;

        let mut scores = self
            .scores(&decoded)
            .map_err(|e| Error::inference(format!("{:#}", e)))?;
        if self.softmax {
            softmax(&mut scores);
        }
        debug!("Model produced {} class scores", scores.len());

        Ok(Classification {
            names: self.names(scores.len()),
            probs: Probabilities(scores),
        })
    }
}

/// Resizes to `size`x`size` RGB and lays out as NCHW, scaled to [0,1] and
/// then normalised per channel.
pub fn preprocess(
    image: &DynamicImage,
    size: u32,
    mean: [f32; 3],
    std: [f32; 3],
) -> tract_ndarray::Array4<f32> {
    let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let side = size as usize;

    tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let value = f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0;
        (value - mean[c]) / std[c]
    })
}

pub fn softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }
    if sum > 0.0 {
        for score in scores.iter_mut() {
            *score /= sum;
        }
    }
}

/// One class name per non-empty line; line order defines the class index.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::model(format!("Failed to read labels {}: {}", path.display(), e))
    })?;
    Ok(parse_labels(&contents))
}

fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
