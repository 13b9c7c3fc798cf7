use std::{fmt::Display, str::FromStr};

use burn::{backend::libtorch::LibTorchDevice, LearningRate};
use serde::{Deserialize, Serialize};

/// Where tensor computation runs
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ComputeDevice {
    /// Use the first CUDA device when one is available, otherwise the CPU
    #[default]
    Auto,

    /// Always use the CPU
    Cpu,

    /// Use the CUDA device with the given index
    Cuda(usize),
}

impl ComputeDevice {
    /// Resolve to a concrete LibTorch device. Hardware is queried here and nowhere else.
    pub fn resolve(&self) -> LibTorchDevice {
        match self {
            ComputeDevice::Auto => {
                if tch::Cuda::is_available() {
                    LibTorchDevice::Cuda(0)
                } else {
                    LibTorchDevice::Cpu
                }
            }
            ComputeDevice::Cpu => LibTorchDevice::Cpu,
            ComputeDevice::Cuda(index) => LibTorchDevice::Cuda(*index),
        }
    }
}

impl FromStr for ComputeDevice {
    type Err = DeviceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "auto" => Ok(ComputeDevice::Auto),
            "cpu" => Ok(ComputeDevice::Cpu),
            "cuda" => Ok(ComputeDevice::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(ComputeDevice::Cuda)
                .ok_or_else(|| DeviceError::Unknown(value.to_string())),
        }
    }
}

impl Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Auto => write!(f, "auto"),
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Cuda(index) => write!(f, "cuda:{}", index),
        }
    }
}

/// Device Error
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    /// The string doesn't name a known device
    #[error("no device found for {0}")]
    Unknown(String),
}

/// Hyperparameters and paths for fine-tuning
#[derive(burn::config::Config)]
pub struct TrainingConfig {
    /// Path to the labelled dataset
    #[config(default = "\"labels.json\".to_string()")]
    pub dataset_path: String,

    /// Where the fine-tuned weights are written
    #[config(default = "\"finetuned_model_weights_ner_bert\".to_string()")]
    pub models_output_path: String,

    /// Hugging Face checkpoint used as the base model
    #[config(default = "crate::models::bert::BASE_CASED.to_string()")]
    pub model_checkpoint: String,

    /// Initial learning rate
    #[config(default = 2e-5)]
    pub learning_rate: LearningRate,

    /// Number of epochs
    #[config(default = 8)]
    pub num_epochs: usize,

    /// Batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// AdamW weight decay
    #[config(default = 0.01)]
    pub weight_decay: f32,

    /// Compute device
    #[config(default = "ComputeDevice::Auto")]
    pub device: ComputeDevice,

    /// Fraction of the dataset held out for evaluation
    #[config(default = 0.2)]
    pub test_size: f64,

    /// Seed for the split, shuffling and weight init
    #[config(default = 42)]
    pub seed: u64,

    /// Tokenizer truncation length
    #[config(default = 512)]
    pub max_seq_length: usize,

    /// Log the training loss every N steps; once per epoch when unset
    pub logging_steps: Option<usize>,

    /// Directory for the log history, config and plots
    #[config(default = "\"output\".to_string()")]
    pub output_dir: String,
}
