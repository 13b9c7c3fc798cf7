//! Command line tool to find named entities with fine-tuned weights

use anyhow::{anyhow, Result};
use burn::backend::LibTorch;
use burn_ner::{
    config::{ComputeDevice, TrainingConfig},
    models::bert::token_classification::load_model,
    pipelines::token_classification::LabelSchema,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer [OPTIONS] TEXT...

Arguments:
  TEXT                 One or more texts to tag

Options:
  -h, --help           Print help
  -w, --weights        The fine-tuned weights (defaults to 'finetuned_model_weights_ner_bert')
  -m, --model          The base checkpoint (defaults to 'bert-base-cased')
  --device             'auto', 'cpu' or 'cuda:N'
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The fine-tuned weights
    weights: Option<String>,

    /// The base checkpoint
    model: Option<String>,

    /// The compute device
    device: Option<ComputeDevice>,

    /// Texts to tag
    texts: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut pargs = Arguments::from_env();

    let mut args = Args {
        help: pargs.contains(["-h", "--help"]),
        weights: pargs.opt_value_from_str(["-w", "--weights"])?,
        model: pargs.opt_value_from_str(["-m", "--model"])?,
        device: pargs.opt_value_from_str("--device")?,
        texts: Vec::new(),
    };

    for text in pargs.finish() {
        args.texts.push(
            text.into_string()
                .map_err(|text| anyhow!("Text is not valid unicode: {:?}", text))?,
        );
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help || args.texts.is_empty() {
        println!("{}", HELP);
        return Ok(());
    }

    let defaults = TrainingConfig::new();
    let weights = args.weights.unwrap_or(defaults.models_output_path);
    let checkpoint = args.model.unwrap_or(defaults.model_checkpoint);
    let device = args.device.unwrap_or_default().resolve();

    let schema = LabelSchema::default();

    let pipeline = load_model::<LibTorch, _>(
        weights,
        schema.id2label(),
        schema.label2id(),
        &checkpoint,
        device,
    )
    .await?;

    let texts: Vec<&str> = args.texts.iter().map(String::as_str).collect();

    for (text, entities) in texts.iter().zip(pipeline.run_batch(&texts)?) {
        println!("{}", text);
        println!("{}", serde_json::to_string_pretty(&entities)?);
    }

    Ok(())
}
