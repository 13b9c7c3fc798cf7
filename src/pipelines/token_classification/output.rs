use burn::tensor::{backend::Backend, Int, Tensor};
use derive_new::new;

/// Token classification output: the loss, class scores and targets of a batch
#[derive(new)]
pub struct Output<B: Backend> {
    /// The loss, averaged over the non-ignored targets
    pub loss: Tensor<B, 1>,

    /// The logits: [batch_size, seq_length, n_classes]
    pub output: Tensor<B, 3>,

    /// The targets: [batch_size, seq_length]
    pub targets: Tensor<B, 2, Int>,
}
