use bert_burn::model::BertModelConfig;
use burn::backend::NdArray;
use burn_ner::{
    models::bert::token_classification::{load_weights, save_model, Config},
    pipelines::token_classification::{batcher::Batcher, LabelSchema, Pipeline},
};
use pretty_assertions::assert_eq;
use tokenizers::Tokenizer;

type B = NdArray;

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

#[test]
fn reloaded_weights_reproduce_the_saved_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights");
    let device = Default::default();

    let schema = LabelSchema::default();
    let config = Config::new_with_schema(tiny_bert(), &schema);
    let model = config.init::<B>(&device);

    save_model(model.clone(), &path).unwrap();
    let reloaded = load_weights::<B, _>(&config, &path, &device).unwrap();

    // Saving the reloaded model again writes the same record, every encoder parameter included
    save_model(reloaded.clone(), dir.path().join("resaved")).unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("weights.mpk")).unwrap(),
        std::fs::read(dir.path().join("resaved.mpk")).unwrap()
    );

    let batcher = Batcher::<B>::new(0, 16, device);
    let tokens = vec![vec![2, 4, 5, 6, 7, 8, 9, 3], vec![2, 13, 10, 11, 12, 3]];

    let before = model.infer(batcher.infer(tokens.clone())).into_data().value;
    let after = reloaded.infer(batcher.infer(tokens)).into_data().value;

    assert_eq!(before, after);
}

#[test]
fn reloaded_pipelines_find_the_same_entities() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights");
    let device = Default::default();

    let schema = LabelSchema::default();
    let config = Config::new_with_schema(tiny_bert(), &schema);
    let model = config.init::<B>(&device);

    save_model(model.clone(), &path).unwrap();
    let reloaded = load_weights::<B, _>(&config, &path, &device).unwrap();

    let original = Pipeline::new(model, tokenizer(), schema.id2label(), 0, 16, device).unwrap();
    let reloaded =
        Pipeline::new(reloaded, tokenizer(), schema.id2label(), 0, 16, device).unwrap();

    let texts = ["Johnson works at Acme", "Mary lives in Oslo"];

    assert_eq!(
        original.run_batch(&texts).unwrap(),
        reloaded.run_batch(&texts).unwrap()
    );
    assert_eq!(
        original.run(texts[0]).unwrap(),
        reloaded.run(texts[0]).unwrap()
    );
}

#[test]
fn entity_spans_point_into_the_text() {
    let device = Default::default();
    let schema = LabelSchema::default();
    let config = Config::new_with_schema(tiny_bert(), &schema);

    let pipeline = Pipeline::new(
        config.init::<B>(&device),
        tokenizer(),
        schema.id2label(),
        0,
        16,
        device,
    )
    .unwrap();

    let text = "Jóhnson works at Acme";

    for entity in pipeline.run(text).unwrap() {
        let span: String = text
            .chars()
            .skip(entity.start)
            .take(entity.end - entity.start)
            .collect();

        assert_eq!(span, entity.word);
        assert!(entity.entity_group != "O");
        assert!(entity.score > 0.0 && entity.score <= 1.0);
    }
}

#[test]
fn loading_fails_for_missing_or_incompatible_weights() {
    let dir = tempfile::tempdir().unwrap();
    let device = Default::default();

    let schema = LabelSchema::default();
    let config = Config::new_with_schema(tiny_bert(), &schema);

    assert!(load_weights::<B, _>(&config, dir.path().join("missing"), &device).is_err());

    let path = dir.path().join("weights");
    save_model(config.init::<B>(&device), &path).unwrap();

    let smaller = Config::new_with_schema(
        tiny_bert(),
        &LabelSchema::new(&["O", "B-PER", "I-PER"]).unwrap(),
    );

    assert!(load_weights::<B, _>(&smaller, &path, &device).is_err());
}
