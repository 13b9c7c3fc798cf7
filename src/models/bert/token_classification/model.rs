use bert_burn::{
    data::BertInferenceBatch,
    model::{BertModel, BertModelOutput},
};
use burn::{
    module::Module,
    nn::{Dropout, Linear},
    tensor::{activation::softmax, backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{
    pipelines::token_classification::{
        batcher::{Infer, Train},
        Output, IGNORE_INDEX,
    },
    utils::tensors::masked_cross_entropy,
};

/// BERT for Token Classification
#[derive(Module, Debug, new)]
pub struct Model<B: Backend> {
    /// The base BERT model
    pub model: BertModel<B>,

    /// Dropout applied to the hidden states before classification
    pub dropout: Dropout,

    /// Linear layer for token classification
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

impl<B: Backend> Model<B> {
    /// Defines forward pass for training
    pub fn forward(&self, item: Train<B>) -> Output<B> {
        let targets = item.targets;
        let [batch_size, seq_length] = targets.dims();

        let output = self.logits(item.input);

        let loss = masked_cross_entropy(
            output
                .clone()
                .reshape([batch_size * seq_length, self.n_classes]),
            targets.clone().reshape([batch_size * seq_length]),
            IGNORE_INDEX,
        );

        Output {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference, returning class probabilities for every token
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 3> {
        softmax(self.logits(input), 2)
    }

    fn logits(&self, input: Infer<B>) -> Tensor<B, 3> {
        let [batch_size, seq_length] = input.tokens.dims();

        let BertModelOutput { hidden_states, .. } = self.model.forward(BertInferenceBatch {
            tokens: input.tokens,
            mask_pad: input.mask_pad,
        });

        let hidden_states = self.dropout.forward(hidden_states);

        self.output
            .forward(hidden_states)
            .reshape([batch_size, seq_length, self.n_classes])
    }

    /// Class ids with the highest score for every token: [batch_size, seq_length]
    pub fn predict(output: Tensor<B, 3>) -> Tensor<B, 2, Int> {
        let [batch_size, seq_length, _] = output.dims();

        output.argmax(2).reshape([batch_size, seq_length])
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, tensor::Data};
    use pretty_assertions::assert_eq;

    use crate::{
        models::bert::token_classification::Config,
        pipelines::token_classification::{batcher::Batcher, LabelSchema},
    };

    use super::*;

    type B = NdArray;

    fn model() -> Model<B> {
        let config = Config::new_with_schema(
            bert_burn::model::BertModelConfig::new(
                2,
                1,
                1e-12,
                8,
                16,
                16,
                16,
                2,
                0.0,
                "bert".to_string(),
                0,
            )
            .with_max_seq_len(Some(16))
            .with_with_pooling_layer(Some(false)),
            &LabelSchema::default(),
        );

        config.init(&Default::default())
    }

    #[test]
    fn infer_returns_a_distribution_per_token() {
        let model = model();
        let batcher = Batcher::<B>::new(0, 16, Default::default());

        let probabilities = model.infer(batcher.infer(vec![vec![2, 4, 5, 3], vec![2, 6, 3]]));

        assert_eq!(probabilities.dims(), [2, 4, 11]);

        let sums = probabilities.sum_dim(2).into_data().value;
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn forward_ignores_padding_and_special_tokens() {
        let model = model();
        let device = Default::default();
        let batcher = Batcher::<B>::new(0, 16, device);

        let input = batcher.infer(vec![vec![2, 4, 3]]);
        let ignored = Tensor::<B, 2, Int>::from_data(
            Data::<i64, 2>::from([[IGNORE_INDEX, IGNORE_INDEX, IGNORE_INDEX]]).convert(),
            &device,
        );

        let output = model.forward(Train::new(input, ignored));

        assert_eq!(output.output.dims(), [1, 3, 11]);
        assert_eq!(output.loss.into_scalar(), 0.0);
    }

    #[test]
    fn predict_takes_the_best_class() {
        let device = Default::default();
        let output = Tensor::<B, 3>::from_floats([[[0.1, 0.9], [0.8, 0.2]]], &device);

        let predicted = Model::<B>::predict(output);

        assert_eq!(predicted.into_data().convert::<i64>().value, vec![1, 0]);
    }
}
