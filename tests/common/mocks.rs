use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use grape_master::{
    Error, Result,
    classifier::{Classification, ImageClassifier, Probabilities},
    proxy::{ChatUpstream, UpstreamReply},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Grape leaf classes in the order the production model emits them.
pub const GRAPE_CLASSES: [&str; 4] = ["Black_rot", "Esca", "Healthy", "Leaf_blight"];

#[derive(Debug, Clone)]
enum StubBehaviour {
    Scores(Vec<f32>),
    Fail(String),
    Panic,
}

/// What the stub saw on one call.
#[derive(Debug, Clone)]
pub struct SeenImage {
    pub path: PathBuf,
    pub existed: bool,
    pub contents: Vec<u8>,
}

/// Stub classification model for testing
#[derive(Debug, Clone)]
pub struct StubClassifier {
    names: BTreeMap<usize, String>,
    behaviour: StubBehaviour,
    pub seen: Arc<Mutex<Vec<SeenImage>>>,
}

impl StubClassifier {
    pub fn with_scores(scores: Vec<f32>) -> Self {
        Self {
            names: GRAPE_CLASSES
                .iter()
                .enumerate()
                .map(|(idx, name)| (idx, name.to_string()))
                .collect(),
            behaviour: StubBehaviour::Scores(scores),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Top-1 is Black_rot at 0.91234.
    pub fn black_rot() -> Self {
        Self::with_scores(vec![0.912_34, 0.05, 0.03, 0.007_66])
    }

    pub fn failing(message: &str) -> Self {
        Self {
            behaviour: StubBehaviour::Fail(message.to_string()),
            ..Self::black_rot()
        }
    }

    pub fn panicking() -> Self {
        Self {
            behaviour: StubBehaviour::Panic,
            ..Self::black_rot()
        }
    }

    pub fn seen(&self) -> Vec<SeenImage> {
        self.seen.lock().unwrap().clone()
    }
}

impl ImageClassifier for StubClassifier {
    fn classify(&self, image: &Path) -> Result<Classification> {
        self.seen.lock().unwrap().push(SeenImage {
            path: image.to_path_buf(),
            existed: image.exists(),
            contents: std::fs::read(image).unwrap_or_default(),
        });

        match &self.behaviour {
            StubBehaviour::Scores(scores) => Ok(Classification {
                names: self.names.clone(),
                probs: Probabilities(scores.clone()),
            }),
            StubBehaviour::Fail(message) => Err(Error::inference(message.clone())),
            StubBehaviour::Panic => panic!("stub model panicked"),
        }
    }
}

/// Stub chat-completion provider for testing
#[derive(Debug, Clone)]
pub struct StubUpstream {
    reply: std::result::Result<(StatusCode, Option<String>, String), String>,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl StubUpstream {
    pub fn replying(status: StatusCode, content_type: Option<&str>, body: &str) -> Self {
        Self {
            reply: Ok((status, content_type.map(str::to_string), body.to_string())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatUpstream for StubUpstream {
    async fn forward(&self, body: Value) -> Result<UpstreamReply> {
        self.requests.lock().unwrap().push(body);

        match &self.reply {
            Ok((status, content_type, body)) => Ok(UpstreamReply {
                status: *status,
                content_type: content_type.clone(),
                body: Bytes::from(body.clone()),
            }),
            Err(message) => Err(Error::upstream(message.clone())),
        }
    }
}
