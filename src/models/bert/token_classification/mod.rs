/// BERT for Token Classification Config
pub mod config;

/// BERT for Token Classification
pub mod model;

/// Training and validation steps
pub mod train;

/// Saving and loading fine-tuned weights
pub mod persistence;

pub use config::Config;
pub use model::{Model, ModelRecord};
pub use persistence::{load_model, load_weights, save_model};
