use tokenizers::{Tokenizer, TruncationParams};

use super::{alignment::align_targets, schema::LabelSchema, Item};

/// A tokenized example with its labels aligned to the sub-word tokens
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizedItem {
    /// Token ids, special tokens included
    pub input_ids: Vec<u32>,

    /// 1 for real tokens
    pub attention_mask: Vec<u32>,

    /// Segment ids
    pub token_type_ids: Vec<u32>,

    /// 1 for special tokens like `[CLS]` and `[SEP]`
    pub special_tokens_mask: Vec<u32>,

    /// The source word of each token, `None` for special tokens
    pub word_ids: Vec<Option<u32>>,

    /// Aligned class ids, with the ignore index on special tokens
    pub labels: Vec<i64>,
}

/// Truncate encodings to `max_length` tokens, special tokens included
pub fn configure_truncation(tokenizer: &mut Tokenizer, max_length: usize) -> anyhow::Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Unable to configure truncation: {}", e))?;

    Ok(())
}

/// Tokenize a batch of pre-split examples and attach aligned labels to each
pub fn tokenize_batch<I: Item>(
    tokenizer: &Tokenizer,
    schema: &LabelSchema,
    items: &[I],
) -> anyhow::Result<Vec<TokenizedItem>> {
    items
        .iter()
        .map(|item| tokenize(tokenizer, schema, item))
        .collect()
}

fn tokenize<I: Item>(
    tokenizer: &Tokenizer,
    schema: &LabelSchema,
    item: &I,
) -> anyhow::Result<TokenizedItem> {
    let words: Vec<&str> = item.words().iter().map(String::as_str).collect();

    let encoding = tokenizer
        .encode(words, true)
        .map_err(|e| anyhow!("Unable to encode {:?}: {}", item.words(), e))?;

    let word_ids = encoding.get_word_ids().to_vec();
    let labels = align_targets(schema, item.tags(), &word_ids)?;

    Ok(TokenizedItem {
        input_ids: encoding.get_ids().to_vec(),
        attention_mask: encoding.get_attention_mask().to_vec(),
        token_type_ids: encoding.get_type_ids().to_vec(),
        special_tokens_mask: encoding.get_special_tokens_mask().to_vec(),
        word_ids,
        labels,
    })
}
