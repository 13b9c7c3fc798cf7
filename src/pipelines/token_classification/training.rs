use std::{path::PathBuf, sync::Arc, time::Instant};

use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::{Dataset, InMemDataset},
    },
    module::AutodiffModule,
    optim::{AdamWConfig, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
    train::{TrainStep, ValidStep},
    LearningRate,
};
use tokenizers::Tokenizer;

use crate::{
    config::TrainingConfig,
    models::bert::token_classification::{Config, Model},
};

use super::{
    batcher::{Batcher, Train},
    history::{LogHistory, LogRecord, EVAL_ACCURACY, EVAL_LOSS, LOSS},
    metrics::{compute_metrics_from_predictions, NerMetrics},
    schema::LabelSchema,
    tokenization::{configure_truncation, tokenize_batch},
    Item,
};

/// Fine-tune a pre-trained BERT checkpoint for token classification.
///
/// The encoder weights come from `model_file` and the classification head starts from random
/// weights. Returns the trained model and the log of the run.
#[allow(clippy::too_many_arguments)]
pub fn train<B, I, D>(
    config: &TrainingConfig,
    model_config: &Config,
    schema: &LabelSchema,
    tokenizer: &Tokenizer,
    model_file: PathBuf,
    dataset_train: &D,
    dataset_test: &D,
    device: B::Device,
) -> anyhow::Result<(Model<B>, LogHistory)>
where
    B: AutodiffBackend,
    I: Item,
    D: Dataset<I>,
{
    B::seed(config.seed);

    let model = model_config.init_pretrained::<B>(&device, model_file)?;

    fit(
        config,
        model,
        model_config.model.pad_token_id,
        schema,
        tokenizer,
        dataset_train,
        dataset_test,
        device,
    )
}

/// Train an initialized model, evaluating on the test split after each epoch
#[allow(clippy::too_many_arguments)]
pub fn fit<B, I, D>(
    config: &TrainingConfig,
    mut model: Model<B>,
    pad_token_id: usize,
    schema: &LabelSchema,
    tokenizer: &Tokenizer,
    dataset_train: &D,
    dataset_test: &D,
    device: B::Device,
) -> anyhow::Result<(Model<B>, LogHistory)>
where
    B: AutodiffBackend,
    I: Item,
    D: Dataset<I>,
{
    if config.batch_size == 0 {
        return Err(anyhow!("The batch size must be greater than 0"));
    }

    let mut tokenizer = tokenizer.clone();
    configure_truncation(&mut tokenizer, config.max_seq_length)?;

    let train_items: Vec<I> = dataset_train.iter().collect();
    let test_items: Vec<I> = dataset_test.iter().collect();

    let train_items = tokenize_batch(&tokenizer, schema, &train_items)?;
    let test_items = tokenize_batch(&tokenizer, schema, &test_items)?;

    if train_items.is_empty() {
        return Err(anyhow!("The training split is empty"));
    }

    let n_train = train_items.len();

    info!(
        "Training on {} examples, evaluating on {}",
        n_train,
        test_items.len()
    );

    let batcher_train = Batcher::<B>::new(pad_token_id, config.max_seq_length, device.clone());
    let batcher_test =
        Batcher::<B::InnerBackend>::new(pad_token_id, config.max_seq_length, device);

    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .build(InMemDataset::new(train_items));

    let dataloader_test = DataLoaderBuilder::new(batcher_test)
        .batch_size(config.batch_size)
        .build(InMemDataset::new(test_items));

    let mut optimizer = AdamWConfig::new()
        .with_weight_decay(config.weight_decay)
        .init::<B, Model<B>>();

    let steps_per_epoch = n_train.div_ceil(config.batch_size);
    let total_steps = steps_per_epoch * config.num_epochs;

    let mut history = LogHistory::default();
    let mut step = 0;
    let mut total_loss = 0.0;
    let mut running_loss = 0.0;
    let mut running_steps = 0;
    let mut learning_rate = config.learning_rate;

    let started = Instant::now();

    for epoch in 1..=config.num_epochs {
        for batch in dataloader_train.iter() {
            learning_rate = linear_decay(config.learning_rate, step, total_steps);

            let output = TrainStep::step(&model, batch);
            let loss = output.item.loss.into_scalar().elem::<f64>();

            model = optimizer.step(learning_rate, model, output.grads);

            step += 1;
            total_loss += loss;
            running_loss += loss;
            running_steps += 1;

            if config.logging_steps.is_some_and(|n| n > 0 && step % n == 0) {
                let record = loss_record(
                    running_loss,
                    running_steps,
                    learning_rate,
                    step,
                    steps_per_epoch,
                );
                debug!("{:?}", record);
                history.push(record);

                running_loss = 0.0;
                running_steps = 0;
            }
        }

        if config.logging_steps.is_none() && running_steps > 0 {
            history.push(loss_record(
                running_loss,
                running_steps,
                learning_rate,
                step,
                steps_per_epoch,
            ));

            running_loss = 0.0;
            running_steps = 0;
        }

        let eval_started = Instant::now();
        let (eval_loss, metrics) = evaluate(&model.valid(), &dataloader_test, schema)?;

        info!(
            "Epoch {}/{}: eval_loss {:.4}, precision {:.4}, recall {:.4}, f1 {:.4}, accuracy {:.4}",
            epoch,
            config.num_epochs,
            eval_loss,
            metrics.precision,
            metrics.recall,
            metrics.f1,
            metrics.accuracy
        );

        history.push(
            LogRecord::new()
                .with(EVAL_LOSS, eval_loss)
                .with("eval_precision", metrics.precision)
                .with("eval_recall", metrics.recall)
                .with("eval_f1", metrics.f1)
                .with(EVAL_ACCURACY, metrics.accuracy)
                .with("eval_runtime", eval_started.elapsed().as_secs_f64())
                .with("epoch", epoch as f64)
                .with("step", step as f64),
        );
    }

    let train_loss = if step == 0 { 0.0 } else { total_loss / step as f64 };

    history.push(
        LogRecord::new()
            .with("train_loss", train_loss)
            .with("train_runtime", started.elapsed().as_secs_f64())
            .with("epoch", config.num_epochs as f64)
            .with("step", step as f64),
    );

    info!("Training finished after {} steps, train_loss {:.4}", step, train_loss);

    Ok((model, history))
}

/// Mean loss and entity scores over a dataset, predicting each token's best class
pub fn evaluate<B: Backend>(
    model: &Model<B>,
    dataloader: &Arc<dyn DataLoader<Train<B>>>,
    schema: &LabelSchema,
) -> anyhow::Result<(f64, NerMetrics)> {
    let mut losses = Vec::new();
    let mut predictions = Vec::new();
    let mut labels = Vec::new();

    for batch in dataloader.iter() {
        let output = ValidStep::step(model, batch);
        let [_, seq_length] = output.targets.dims();

        losses.push(output.loss.into_scalar().elem::<f64>());

        let predicted = Model::predict(output.output)
            .into_data()
            .convert::<i64>()
            .value;
        let targets = output.targets.into_data().convert::<i64>().value;

        for (predicted, targets) in predicted.chunks(seq_length).zip(targets.chunks(seq_length)) {
            predictions.push(predicted.iter().map(|id| *id as usize).collect());
            labels.push(targets.to_vec());
        }
    }

    let metrics = compute_metrics_from_predictions(schema, &predictions, &labels)?;

    let loss = losses.iter().sum::<f64>() / losses.len().max(1) as f64;

    Ok((loss, metrics))
}

/// Decays linearly from `initial` at step 0 to zero at `total_steps`
fn linear_decay(initial: LearningRate, step: usize, total_steps: usize) -> LearningRate {
    if total_steps == 0 {
        return initial;
    }

    initial * (1.0 - step as f64 / total_steps as f64).max(0.0)
}

fn loss_record(
    running_loss: f64,
    running_steps: usize,
    learning_rate: LearningRate,
    step: usize,
    steps_per_epoch: usize,
) -> LogRecord {
    LogRecord::new()
        .with(LOSS, running_loss / running_steps as f64)
        .with("learning_rate", learning_rate)
        .with("epoch", step as f64 / steps_per_epoch as f64)
        .with("step", step as f64)
}
