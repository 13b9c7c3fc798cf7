/// Tag names and the begin to inside table
pub mod schema;

/// Word to sub-word label alignment
pub mod alignment;

/// Tokenization of pre-split examples
pub mod tokenization;

/// Batcher
pub mod batcher;

/// Token Classification Items
pub mod item;

/// Forward pass output
pub mod output;

/// Token Classification Metrics
pub mod metrics;

/// Training log history
pub mod history;

/// Token Classification Training
pub mod training;

/// Token Classification Inference
pub mod inference;

pub use alignment::align_targets;
pub use batcher::Batcher;
pub use history::{epoch_metrics, EpochMetrics, LogHistory, LogRecord};
pub use inference::{Entity, Pipeline};
pub use item::Item;
pub use metrics::{compute_metrics, NerMetrics};
pub use output::Output;
pub use schema::{LabelSchema, IGNORE_INDEX};
pub use tokenization::{tokenize_batch, TokenizedItem};
pub use training::{evaluate, fit, train};
