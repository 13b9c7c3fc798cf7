//! Command line tool to fine-tune BERT for named entity recognition

use std::path::Path;

use anyhow::anyhow;
use burn::{
    backend::{Autodiff, LibTorch},
    config::Config as _,
};
use burn_ner::{
    config::{ComputeDevice, TrainingConfig},
    datasets::{ner, LoadableDataset},
    models::bert::token_classification::{save_model, Config},
    pipelines::token_classification::{epoch_metrics, train, LabelSchema},
    utils::{hugging_face::download_hf_model, plot::plot_loss_and_accuracy_curves},
};
use pico_args::Arguments;
use tokenizers::Tokenizer;

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help           Print help
  --config             A JSON training config file
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -d, --dataset        The labelled dataset (JSON array or JSON Lines)
  -o, --output         Where to write the fine-tuned weights
  -m, --model          The base checkpoint (e.g., 'bert-base-cased')
  --device             'auto', 'cpu' or 'cuda:N'
";

#[derive(Debug)]
struct Args {
    config: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    dataset: Option<String>,
    output: Option<String>,
    model: Option<String>,
    device: Option<ComputeDevice>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str("--config")?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            dataset: pargs.opt_value_from_str(["-d", "--dataset"])?,
            output: pargs.opt_value_from_str(["-o", "--output"])?,
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            device: pargs.opt_value_from_str("--device")?,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }

    fn into_config(self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)
                .map_err(|e| anyhow!("Unable to load training config {}: {}", path, e))?,
            None => TrainingConfig::new(),
        };

        if let Some(num_epochs) = self.num_epochs {
            config.num_epochs = num_epochs;
        }

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        if let Some(dataset) = self.dataset {
            config.dataset_path = dataset;
        }

        if let Some(output) = self.output {
            config.models_output_path = output;
        }

        if let Some(model) = self.model {
            config.model_checkpoint = model;
        }

        if let Some(device) = self.device {
            config.device = device;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let config = args.into_config()?;
    let device = config.device.resolve();

    log::info!("Training on {:?} with {}", device, config.model_checkpoint);

    let dataset = ner::Dataset::load(&config.dataset_path).await?;
    let (dataset_train, dataset_test) = dataset.train_test_split(config.test_size, config.seed)?;

    let schema = LabelSchema::default();

    let (config_file, model_file) = download_hf_model(&config.model_checkpoint).await?;
    let model_config = Config::load_pretrained(config_file, &schema, config.max_seq_length)?;

    let tokenizer = Tokenizer::from_pretrained(&config.model_checkpoint, None)
        .map_err(|e| anyhow!("Unable to load the {} tokenizer: {}", config.model_checkpoint, e))?;

    let (model, history) = train::<Autodiff<LibTorch>, _, _>(
        &config,
        &model_config,
        &schema,
        &tokenizer,
        model_file,
        &dataset_train,
        &dataset_test,
        device,
    )?;

    save_model(model, &config.models_output_path)?;

    let output_dir = Path::new(&config.output_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(|e| anyhow!("Unable to create {}: {}", output_dir.display(), e))?;

    history.save(output_dir.join("log_history.json"))?;

    config
        .save(output_dir.join("config.json"))
        .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

    let metrics = epoch_metrics(&history);

    log::info!("Training loss: {:?}", metrics.training_loss);
    log::info!("Test loss: {:?}", metrics.test_loss);
    log::info!("Accuracy: {:?}", metrics.accuracy);

    plot_loss_and_accuracy_curves(&metrics, output_dir.join("curves.svg"))?;

    Ok(())
}
