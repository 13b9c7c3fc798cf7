use bert_burn::model::BertModelConfig;
use burn::backend::{Autodiff, NdArray};
use burn_ner::{
    config::TrainingConfig,
    datasets::ner::{Dataset, Item},
    models::bert::token_classification::Config,
    pipelines::token_classification::{epoch_metrics, fit, LabelSchema},
};
use pretty_assertions::assert_eq;
use tokenizers::Tokenizer;

type B = Autodiff<NdArray>;

fn tiny_bert() -> BertModelConfig {
    BertModelConfig::new(2, 1, 1e-12, 8, 16, 16, 16, 2, 0.0, "bert".to_string(), 0)
        .with_max_seq_len(Some(16))
        .with_with_pooling_layer(Some(false))
}

fn tokenizer() -> Tokenizer {
    Tokenizer::from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/tokenizer.json"
    ))
    .unwrap()
}

fn dataset(items: &[(&[&str], &[usize])]) -> Dataset {
    items
        .iter()
        .map(|(words, tags)| {
            Item::new(
                words.iter().map(|word| word.to_string()).collect(),
                tags.to_vec(),
            )
        })
        .collect::<Vec<_>>()
        .into()
}

fn training_config() -> TrainingConfig {
    TrainingConfig::new()
        .with_num_epochs(2)
        .with_batch_size(2)
        .with_max_seq_length(16)
        .with_learning_rate(1e-3)
}

#[test]
fn logs_a_loss_and_an_evaluation_per_epoch() {
    let device = Default::default();
    let schema = LabelSchema::default();
    let model = Config::new_with_schema(tiny_bert(), &schema).init::<B>(&device);

    let train = dataset(&[
        (&["Johnson", "works", "at", "Acme"], &[1, 0, 0, 3]),
        (&["Mary", "lives", "in", "Oslo"], &[1, 0, 0, 5]),
        (&["John", "works"], &[1, 0]),
    ]);
    let test = dataset(&[(&["Mary", "works", "at", "Acme"], &[1, 0, 0, 3])]);

    let (_model, history) = fit(
        &training_config(),
        model,
        0,
        &schema,
        &tokenizer(),
        &train,
        &test,
        device,
    )
    .unwrap();

    // Two epochs of a loss record and an evaluation record, then the summary
    assert_eq!(history.records.len(), 5);

    let metrics = epoch_metrics(&history);
    assert_eq!(metrics.training_loss.len(), 2);
    assert_eq!(metrics.test_loss.len(), 2);
    assert_eq!(metrics.accuracy.len(), 2);

    for accuracy in metrics.accuracy {
        assert!((0.0..=1.0).contains(&accuracy));
    }

    let summary = history.records.last().unwrap();
    assert!(summary.get("train_loss").unwrap() > 0.0);
    assert_eq!(summary.get("step"), Some(4.0));

    let evaluation = &history.records[1];
    for name in ["eval_precision", "eval_recall", "eval_f1", "eval_runtime"] {
        assert!(evaluation.get(name).is_some(), "missing {}", name);
    }
    assert_eq!(evaluation.get("epoch"), Some(1.0));
}

#[test]
fn logging_steps_control_the_loss_records() {
    let device = Default::default();
    let schema = LabelSchema::default();
    let model = Config::new_with_schema(tiny_bert(), &schema).init::<B>(&device);

    let train = dataset(&[
        (&["Johnson", "works"], &[1, 0]),
        (&["Mary", "lives"], &[1, 0]),
        (&["John", "works"], &[1, 0]),
        (&["Acme", "works"], &[3, 0]),
    ]);
    let test = dataset(&[(&["Mary"], &[1])]);

    let config = training_config().with_logging_steps(Some(1));

    let (_model, history) = fit(
        &config,
        model,
        0,
        &schema,
        &tokenizer(),
        &train,
        &test,
        device,
    )
    .unwrap();

    // Two steps per epoch, each logged
    assert_eq!(epoch_metrics(&history).training_loss.len(), 4);
    assert_eq!(epoch_metrics(&history).test_loss.len(), 2);
}

#[test]
fn a_zero_batch_size_is_an_error() {
    let device = Default::default();
    let schema = LabelSchema::default();
    let model = Config::new_with_schema(tiny_bert(), &schema).init::<B>(&device);

    let train = dataset(&[(&["Johnson", "works"], &[1, 0])]);
    let test = dataset(&[(&["Mary"], &[1])]);

    let result = fit(
        &training_config().with_batch_size(0),
        model,
        0,
        &schema,
        &tokenizer(),
        &train,
        &test,
        device,
    );

    let error = result.err().unwrap().to_string();
    assert!(error.contains("batch size"), "{}", error);
}
