use super::schema::{LabelSchema, IGNORE_INDEX};

/// Align word-level tags with the sub-word tokens produced by the tokenizer.
///
/// `word_ids` holds one entry per token: the index of the word the token came from, or `None`
/// for special tokens like `[CLS]` and `[SEP]`, which get [`IGNORE_INDEX`]. The first token of a
/// word takes the word's tag. The remaining tokens of the same word take it too, except that a
/// `B-` tag becomes the matching `I-` tag.
///
/// Whether a token continues a word is decided only by comparing its word index with the token
/// right before it.
pub fn align_targets(
    schema: &LabelSchema,
    labels: &[usize],
    word_ids: &[Option<u32>],
) -> Result<Vec<i64>, AlignmentError> {
    let mut aligned = Vec::with_capacity(word_ids.len());
    let mut last_word: Option<u32> = None;

    for word_id in word_ids.iter().copied() {
        let label = match word_id {
            None => IGNORE_INDEX,
            Some(word) => {
                let tag = *labels
                    .get(word as usize)
                    .ok_or(AlignmentError::MissingTag {
                        word: word as usize,
                        len: labels.len(),
                    })?;

                if tag >= schema.len() {
                    return Err(AlignmentError::UnknownTag {
                        tag,
                        len: schema.len(),
                    });
                }

                if last_word == Some(word) {
                    schema.inside_of(tag).unwrap_or(tag) as i64
                } else {
                    tag as i64
                }
            }
        };

        aligned.push(label);
        last_word = word_id;
    }

    Ok(aligned)
}

/// Alignment Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AlignmentError {
    /// The tokenizer referenced a word that has no tag
    #[error("no tag for word {word}, the example only has {len} tags")]
    MissingTag {
        /// The word index from the tokenizer
        word: usize,

        /// The number of tags in the example
        len: usize,
    },

    /// A tag id outside the label schema
    #[error("tag {tag} is out of range for a schema of {len} labels")]
    UnknownTag {
        /// The offending tag id
        tag: usize,

        /// The number of labels in the schema
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn align(labels: &[usize], word_ids: &[Option<u32>]) -> Vec<i64> {
        align_targets(&LabelSchema::default(), labels, word_ids).unwrap()
    }

    #[test]
    fn special_tokens_are_ignored() {
        let aligned = align(&[0, 1], &[None, Some(0), Some(1), None]);

        assert_eq!(aligned, vec![IGNORE_INDEX, 0, 1, IGNORE_INDEX]);
    }

    #[test]
    fn begin_tags_continue_as_inside_tags() {
        // "Johnson" -> John ##son, tagged B-PER
        let aligned = align(&[1, 0], &[None, Some(0), Some(0), Some(1), None]);

        assert_eq!(aligned, vec![IGNORE_INDEX, 1, 2, 0, IGNORE_INDEX]);
    }

    #[test]
    fn other_tags_repeat_unchanged() {
        let aligned = align(&[2, 0, 8], &[Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]);

        assert_eq!(aligned, vec![2, 2, 0, 0, 8, 8]);
    }

    #[test]
    fn every_begin_tag_maps_to_its_inside_tag() {
        for (begin, inside) in [(1, 2), (3, 4), (5, 6), (7, 8), (9, 10)] {
            let aligned = align(&[begin], &[Some(0), Some(0), Some(0)]);

            assert_eq!(aligned, vec![begin as i64, inside, inside]);
        }
    }

    #[test]
    fn first_token_is_never_a_continuation() {
        let aligned = align(&[3], &[Some(0)]);

        assert_eq!(aligned, vec![3]);
    }

    #[test]
    fn special_tokens_reset_the_previous_word() {
        let aligned = align(&[5], &[Some(0), None, Some(0)]);

        assert_eq!(aligned, vec![5, IGNORE_INDEX, 5]);
    }

    #[test]
    fn non_contiguous_words_restart_with_the_raw_tag() {
        let aligned = align(&[1, 0], &[Some(0), Some(1), Some(0), Some(0)]);

        assert_eq!(aligned, vec![1, 0, 1, 2]);
    }

    #[test]
    fn output_has_one_label_per_token() {
        let word_ids = [None, Some(0), Some(0), Some(1), Some(2), Some(2), Some(2), None];
        let aligned = align(&[7, 8, 0], &word_ids);

        assert_eq!(aligned.len(), word_ids.len());
        assert_eq!(aligned, vec![IGNORE_INDEX, 7, 8, 8, 0, 0, 0, IGNORE_INDEX]);
    }

    #[test]
    fn unknown_words_are_an_error() {
        let result = align_targets(&LabelSchema::default(), &[0], &[Some(0), Some(1)]);

        assert_eq!(result, Err(AlignmentError::MissingTag { word: 1, len: 1 }));
    }

    #[test]
    fn tags_outside_the_schema_are_an_error() {
        let result = align_targets(
            &LabelSchema::default(),
            &[42],
            &[None, Some(0), Some(0), None],
        );

        assert_eq!(result, Err(AlignmentError::UnknownTag { tag: 42, len: 11 }));

        let result = align_targets(&LabelSchema::default(), &[0, 11], &[Some(0), Some(1)]);

        assert_eq!(result, Err(AlignmentError::UnknownTag { tag: 11, len: 11 }));
    }
}
