//! Client-side helpers behind the `grape-probe` diagnostic binary.

mod client;
pub mod network;

pub use client::{IMAGE_EXTENSIONS, PredictClient, ProbeOutcome, ProxyProbe, list_images};
