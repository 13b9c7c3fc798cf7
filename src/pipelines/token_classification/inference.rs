use std::collections::BTreeMap;

use burn::tensor::backend::Backend;
use serde::Serialize;
use tokenizers::Tokenizer;

use crate::models::bert::token_classification::Model;

use super::{batcher::Batcher, metrics::argmax, tokenization::configure_truncation};

/// A named entity found in a text
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entity {
    /// The entity type, such as `PER`
    pub entity_group: String,

    /// The mean probability of the tokens making up the entity
    pub score: f32,

    /// The text of the entity
    pub word: String,

    /// Character offset of the start of the entity in the text
    pub start: usize,

    /// Character offset of the end of the entity in the text
    pub end: usize,
}

/// The predicted tag of one sub-word token
#[derive(Clone, Debug, PartialEq)]
pub struct TokenPrediction {
    /// The predicted tag name, such as `B-PER`
    pub label: String,

    /// The probability of the predicted tag
    pub score: f32,

    /// Character offset of the start of the token in the text
    pub start: usize,

    /// Character offset of the end of the token in the text
    pub end: usize,
}

/// Group consecutive token predictions into entities.
///
/// A token joins the previous group when it has the same entity type and isn't tagged `B-`. A
/// group's score is the mean of its token scores, and it spans from the start of its first token
/// to the end of its last. Offsets count characters, not bytes. Groups outside any entity (`O`)
/// are dropped.
pub fn aggregate_simple(predictions: &[TokenPrediction], text: &str) -> Vec<Entity> {
    let mut groups: Vec<(&str, Vec<&TokenPrediction>)> = Vec::new();

    for prediction in predictions {
        let (tag, entity) = split_tag(&prediction.label);

        match groups.last_mut() {
            Some((last, tokens)) if *last == entity && tag != Tag::Begin => tokens.push(prediction),
            _ => groups.push((entity, vec![prediction])),
        }
    }

    groups
        .into_iter()
        .filter(|(entity, _)| *entity != "O")
        .filter_map(|(entity, tokens)| {
            let first = tokens.first()?;
            let last = tokens.last()?;

            let score = tokens.iter().map(|t| t.score).sum::<f32>() / tokens.len() as f32;

            Some(Entity {
                entity_group: entity.to_string(),
                score,
                word: text
                    .chars()
                    .skip(first.start)
                    .take(last.end.saturating_sub(first.start))
                    .collect(),
                start: first.start,
                end: last.end,
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Begin,
    Inside,
}

/// Split `B-PER` into `(Begin, "PER")`. Anything not prefixed with `B-` or `I-` is an inside tag
/// named after the whole label, so `O` stays `O`.
fn split_tag(label: &str) -> (Tag, &str) {
    if let Some(entity) = label.strip_prefix("B-") {
        (Tag::Begin, entity)
    } else if let Some(entity) = label.strip_prefix("I-") {
        (Tag::Inside, entity)
    } else {
        (Tag::Inside, label)
    }
}

/// Named entity recognition on raw text with a fine-tuned model
pub struct Pipeline<B: Backend> {
    model: Model<B>,
    tokenizer: Tokenizer,
    id2label: BTreeMap<usize, String>,
    batcher: Batcher<B>,
}

impl<B: Backend> Pipeline<B> {
    /// Create a pipeline, truncating encodings to `max_seq_length` tokens
    pub fn new(
        model: Model<B>,
        mut tokenizer: Tokenizer,
        id2label: BTreeMap<usize, String>,
        pad_token_id: usize,
        max_seq_length: usize,
        device: B::Device,
    ) -> anyhow::Result<Self> {
        configure_truncation(&mut tokenizer, max_seq_length)?;

        Ok(Self {
            model,
            tokenizer,
            id2label,
            batcher: Batcher::new(pad_token_id, max_seq_length, device),
        })
    }

    /// Find the entities in a text
    pub fn run(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        Ok(self.run_batch(&[text])?.into_iter().next().unwrap_or_default())
    }

    /// Find the entities in each of several texts
    pub fn run_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<Entity>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch_char_offsets(texts.to_vec(), true)
            .map_err(|e| anyhow!("Unable to encode text: {}", e))?;

        let token_ids_list = encodings
            .iter()
            .map(|encoding| encoding.get_ids().iter().map(|id| *id as usize).collect())
            .collect();

        let probabilities = self.model.infer(self.batcher.infer(token_ids_list));
        let [_, seq_length, n_classes] = probabilities.dims();

        let values = probabilities.into_data().convert::<f32>().value;

        texts
            .iter()
            .zip(&encodings)
            .zip(values.chunks(seq_length * n_classes))
            .map(|((text, encoding), scores)| -> anyhow::Result<Vec<Entity>> {
                let predictions = encoding
                    .get_special_tokens_mask()
                    .iter()
                    .zip(encoding.get_offsets())
                    .zip(scores.chunks(n_classes))
                    .filter(|((special, _), _)| **special == 0)
                    .map(|((_, (start, end)), scores)| self.prediction(scores, *start, *end))
                    .collect::<anyhow::Result<Vec<_>>>()?;

                Ok(aggregate_simple(&predictions, text))
            })
            .collect()
    }

    fn prediction(
        &self,
        scores: &[f32],
        start: usize,
        end: usize,
    ) -> anyhow::Result<TokenPrediction> {
        let id = argmax(scores);

        let label = self
            .id2label
            .get(&id)
            .ok_or_else(|| anyhow!("Class {} has no label", id))?;

        Ok(TokenPrediction {
            label: label.clone(),
            score: scores[id],
            start,
            end,
        })
    }
}
