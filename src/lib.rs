pub mod classifier;
pub mod config;
pub mod error;
pub mod probe;
pub mod proxy;
pub mod server;

pub use error::{Error, Result};
