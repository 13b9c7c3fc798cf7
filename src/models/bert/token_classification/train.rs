use burn::{
    tensor::backend::{AutodiffBackend, Backend},
    train::{TrainOutput, TrainStep, ValidStep},
};

use crate::pipelines::token_classification::{batcher::Train, Output};

use super::Model;

/// Define training step
impl<B: AutodiffBackend> TrainStep<Train<B>, Output<B>> for Model<B> {
    fn step(&self, item: Train<B>) -> TrainOutput<Output<B>> {
        // Run forward pass, calculate gradients and return them along with the output
        let output = self.forward(item);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<Train<B>, Output<B>> for Model<B> {
    fn step(&self, item: Train<B>) -> Output<B> {
        self.forward(item)
    }
}
