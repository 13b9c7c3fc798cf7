use std::{collections::BTreeMap, path::Path};

use bert_burn::model::BertModelConfig;
use burn::{
    config::Config as _,
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::backend::Backend,
};
use tokenizers::Tokenizer;

use crate::{
    pipelines::token_classification::Pipeline, utils::hugging_face::download_hf_model_config,
};

use super::{Config, Model};

/// Records are stored at full precision so a reloaded model reproduces the saved one exactly
pub type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Save the fine-tuned weights. The recorder adds the `.mpk` extension.
pub fn save_model<B: Backend, P: AsRef<Path>>(model: Model<B>, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();

    model
        .save_file(path.to_path_buf(), &WeightsRecorder::new())
        .map_err(|e| anyhow!("Unable to save model weights to {}: {}", path.display(), e))?;

    info!("Model saved to {}", path.display());

    Ok(())
}

/// Build a model from `config` and load saved weights into it
pub fn load_weights<B: Backend, P: AsRef<Path>>(
    config: &Config,
    path: P,
    device: &B::Device,
) -> anyhow::Result<Model<B>> {
    let path = path.as_ref();

    let model = config
        .init::<B>(device)
        .load_file(path.to_path_buf(), &WeightsRecorder::new(), device)
        .map_err(|e| anyhow!("Unable to load model weights from {}: {}", path.display(), e))?;

    let expected = [config.model.hidden_size, config.n_classes()];
    let found = model.output.weight.val().dims();

    if found != expected {
        return Err(anyhow!(
            "Saved classification head in {} has shape {:?}, expected {:?}",
            path.display(),
            found,
            expected
        ));
    }

    Ok(model)
}

/// Load fine-tuned weights for a Hugging Face checkpoint's architecture and wrap them in an
/// inference pipeline with the checkpoint's tokenizer
pub async fn load_model<B: Backend, P: AsRef<Path>>(
    path: P,
    id2label: BTreeMap<usize, String>,
    label2id: BTreeMap<String, usize>,
    checkpoint: &str,
    device: B::Device,
) -> anyhow::Result<Pipeline<B>> {
    let config_file = download_hf_model_config(checkpoint).await?;

    let mut bert_config = BertModelConfig::load(&config_file).map_err(|e| {
        anyhow!(
            "Unable to load Hugging Face config file {}: {}",
            config_file.display(),
            e
        )
    })?;

    let max_seq_length = bert_config.max_position_embeddings;

    bert_config.max_seq_len = Some(max_seq_length);
    bert_config.with_pooling_layer = Some(false);
    bert_config.hidden_dropout_prob = 0.0;

    let pad_token_id = bert_config.pad_token_id;
    let config = Config::new(bert_config, id2label.clone(), label2id);

    let model = load_weights::<B, _>(&config, path, &device)?;

    let tokenizer = Tokenizer::from_pretrained(checkpoint, None)
        .map_err(|e| anyhow!("Unable to load the {} tokenizer: {}", checkpoint, e))?;

    let pipeline = Pipeline::new(
        model,
        tokenizer,
        id2label,
        pad_token_id,
        max_seq_length,
        device,
    )?;

    info!("Model loaded successfully, NER pipeline is ready");

    Ok(pipeline)
}
