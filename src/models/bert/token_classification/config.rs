use std::{collections::BTreeMap, path::PathBuf};

use bert_burn::model::{BertModel, BertModelConfig};
use burn::{
    config::Config as _,
    module::Module,
    nn::{DropoutConfig, LinearConfig},
    tensor::backend::Backend,
};

use crate::pipelines::token_classification::LabelSchema;

use super::Model;

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    /// The base BERT config
    pub model: BertModelConfig,

    /// A map from class ids to tag names
    pub id2label: BTreeMap<usize, String>,

    /// A reverse map from tag names to class ids
    pub label2id: BTreeMap<String, usize>,
}

impl Config {
    /// Attach the label maps of a schema to a base BERT config
    pub fn new_with_schema(model: BertModelConfig, schema: &LabelSchema) -> Self {
        Config::new(model, schema.id2label(), schema.label2id())
    }

    /// Load a Hugging Face `config.json` for a BERT checkpoint and attach a label schema
    pub fn load_pretrained(
        config_file: PathBuf,
        schema: &LabelSchema,
        max_seq_length: usize,
    ) -> anyhow::Result<Self> {
        let mut bert_config = BertModelConfig::load(&config_file).map_err(|e| {
            anyhow!(
                "Unable to load Hugging Face config file {}: {}",
                config_file.display(),
                e
            )
        })?;

        bert_config.max_seq_len = Some(max_seq_length);

        // Token classification reads the hidden states directly
        bert_config.with_pooling_layer = Some(false);

        Ok(Config::new_with_schema(bert_config, schema))
    }

    /// Number of classes in the output layer
    pub fn n_classes(&self) -> usize {
        self.id2label.len()
    }

    /// Initialize a model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let model = self.model.init(device);

        let dropout = DropoutConfig::new(self.model.hidden_dropout_prob).init();

        let n_classes = self.n_classes();

        let output = LinearConfig::new(self.model.hidden_size, n_classes).init(device);

        Model {
            model,
            dropout,
            output,
            n_classes,
        }
    }

    /// Initialize a model with pre-trained BERT weights and a fresh classification head
    pub fn init_pretrained<B: Backend>(
        &self,
        device: &B::Device,
        model_file: PathBuf,
    ) -> anyhow::Result<Model<B>> {
        if self.n_classes() == 0 {
            return Err(anyhow!("Classes are not defined in the model configuration"));
        }

        let model = self.init(device);

        let record = BertModel::from_safetensors(model_file, device, self.model.clone());

        Ok(Model {
            model: model.model.load_record(record),
            ..model
        })
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    fn tiny_bert() -> BertModelConfig {
        BertModelConfig::new(2, 1, 1e-12, 8, 16, 16, 16, 2, 0.0, "bert".to_string(), 0)
            .with_max_seq_len(Some(16))
            .with_with_pooling_layer(Some(false))
    }

    #[test]
    fn label_maps_follow_the_schema() {
        let schema = LabelSchema::default();

        let config = Config::new_with_schema(tiny_bert(), &schema);

        assert_eq!(config.n_classes(), 11);
        assert_eq!(config.id2label[&0], "O");
        assert_eq!(config.label2id["B-PER"], 1);
        assert_eq!(config.label2id["I-IND"], 10);
    }

    #[test]
    fn output_layer_matches_the_class_count() {
        let schema = LabelSchema::new(&["O", "B-X", "I-X"]).unwrap();
        let config = Config::new_with_schema(tiny_bert(), &schema);

        let model = config.init::<NdArray>(&Default::default());

        assert_eq!(model.n_classes, 3);
        assert_eq!(model.output.weight.val().dims(), [8, 3]);
    }
}
