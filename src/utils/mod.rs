/// JSON record files
pub mod files;

/// Hugging Face utilities
pub mod hugging_face;

/// Tensor Utilities
pub mod tensors;

/// Loss and accuracy plots
pub mod plot;
