use burn::{
    data::dataloader,
    nn::attention::generate_padding_mask,
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;

use crate::utils::tensors;

use super::{schema::IGNORE_INDEX, tokenization::TokenizedItem};

/// An inference batch for token classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Tokenized text as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask for the tokenized text containing booleans for padding locations
    pub mask_pad: Tensor<B, 2, Bool>,
}

/// A training batch for token classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Bert Model input
    pub input: Infer<B>,

    /// Class ids for each token: [batch_size, max_seq_length], ignore index on padding and
    /// special tokens
    pub targets: Tensor<B, 2, Int>,
}

/// Struct for batching tokenized items
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// ID of the padding token
    pub pad_token_id: usize,

    /// Maximum sequence length for tokenized text
    pub max_seq_length: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Pad token id lists into an inference batch
    pub fn infer(&self, token_ids_list: Vec<Vec<usize>>) -> Infer<B> {
        let padding = generate_padding_mask(
            self.pad_token_id,
            token_ids_list,
            Some(self.max_seq_length),
            &self.device,
        );

        Infer {
            tokens: padding.tensor,
            mask_pad: padding.mask,
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<TokenizedItem, Train<B>> for Batcher<B> {
    /// Collects a vector of tokenized items into a training batch
    fn batch(&self, items: Vec<TokenizedItem>) -> Train<B> {
        let batch_size = items.len();

        let mut token_ids_list = Vec::with_capacity(batch_size);
        let mut labels_list = Vec::with_capacity(batch_size);

        for item in items {
            token_ids_list.push(item.input_ids.iter().map(|id| *id as usize).collect());
            labels_list.push(item.labels);
        }

        let input = self.infer(token_ids_list);
        let seq_length = input.tokens.dims()[1];

        // Padding positions are ignored just like special tokens
        let targets = tensors::pad_to::<B>(IGNORE_INDEX, labels_list, seq_length, &self.device);

        Train { input, targets }
    }
}
