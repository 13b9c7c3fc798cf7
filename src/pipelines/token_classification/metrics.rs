use rusev::{classification_report, DivByZeroStrat, SchemeType};

use super::schema::{LabelSchema, IGNORE_INDEX};

/// Entity-level precision, recall and F1 plus token accuracy
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NerMetrics {
    /// Micro-averaged entity precision
    pub precision: f64,

    /// Micro-averaged entity recall
    pub recall: f64,

    /// Micro-averaged entity F1
    pub f1: f64,

    /// Token accuracy
    pub accuracy: f64,
}

/// Compute metrics from per-token class scores.
///
/// `logits` is `[example][token][class]` and `labels` is `[example][token]`. Each token is
/// predicted as its highest scoring class, and positions whose label is [`IGNORE_INDEX`] are
/// dropped from both sides before scoring.
pub fn compute_metrics(
    schema: &LabelSchema,
    logits: &[Vec<Vec<f32>>],
    labels: &[Vec<i64>],
) -> Result<NerMetrics, MetricsError> {
    let predictions: Vec<Vec<usize>> = logits
        .iter()
        .map(|example| example.iter().map(|scores| argmax(scores)).collect())
        .collect();

    compute_metrics_from_predictions(schema, &predictions, labels)
}

/// Compute metrics from predicted class ids, for when the arg-max was already taken.
///
/// Predictions are paired with labels position by position. A prediction sequence shorter than
/// its labels leaves the extra labels unpaired, which is reported as a length mismatch.
pub fn compute_metrics_from_predictions(
    schema: &LabelSchema,
    predictions: &[Vec<usize>],
    labels: &[Vec<i64>],
) -> Result<NerMetrics, MetricsError> {
    let references = labels
        .iter()
        .map(|targets| {
            targets
                .iter()
                .filter(|target| **target != IGNORE_INDEX)
                .map(|target| tag_name(schema, *target))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let predicted = predictions
        .iter()
        .zip(labels)
        .map(|(predicted, targets)| {
            predicted
                .iter()
                .zip(targets)
                .filter(|(_, target)| **target != IGNORE_INDEX)
                .map(|(prediction, _)| tag_name(schema, *prediction as i64))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    check_consistent_length(&references, &predicted)?;

    let (correct, total) = references
        .iter()
        .zip(&predicted)
        .flat_map(|(reference, prediction)| reference.iter().zip(prediction))
        .fold((0usize, 0usize), |(correct, total), (r, p)| {
            (correct + usize::from(r == p), total + 1)
        });

    if total == 0 {
        return Err(MetricsError::Empty);
    }

    let (precision, recall, f1) = entity_scores(references, predicted)?;

    Ok(NerMetrics {
        precision,
        recall,
        f1,
        accuracy: correct as f64 / total as f64,
    })
}

/// Micro-averaged entity precision, recall and F1 in the default (non-strict) IOB2 mode, with
/// zero divisions scored as zero
fn entity_scores(
    references: Vec<Vec<&str>>,
    predictions: Vec<Vec<&str>>,
) -> Result<(f64, f64, f64), MetricsError> {
    // Nothing to chunk on either side
    if !has_entities(&references) && !has_entities(&predictions) {
        return Ok((0.0, 0.0, 0.0));
    }

    let report = classification_report(
        references,
        predictions,
        None,
        DivByZeroStrat::ReplaceBy0,
        SchemeType::IOB2,
        false,
        false,
        false,
    )
    .map_err(|e| MetricsError::Evaluator(format!("{:?}", e)))?;

    micro_average(&report.to_string())
        .ok_or_else(|| MetricsError::Evaluator("the report has no micro average".to_string()))
}

fn has_entities(sentences: &[Vec<&str>]) -> bool {
    sentences.iter().flatten().any(|tag| *tag != "O")
}

/// Read the micro average row (`class, precision, recall, fscore, support`) of a report
fn micro_average(report: &str) -> Option<(f64, f64, f64)> {
    report.lines().find_map(|line| {
        let mut fields = line.split(',').map(str::trim);

        if !fields.next()?.to_lowercase().contains("micro") {
            return None;
        }

        let precision = fields.next()?.parse().ok()?;
        let recall = fields.next()?.parse().ok()?;
        let f1 = fields.next()?.parse().ok()?;

        Some((precision, recall, f1))
    })
}

fn check_consistent_length(
    references: &[Vec<&str>],
    predictions: &[Vec<&str>],
) -> Result<(), MetricsError> {
    if references.len() != predictions.len() {
        return Err(MetricsError::InconsistentSentences {
            references: references.len(),
            predictions: predictions.len(),
        });
    }

    for (sentence, (reference, prediction)) in references.iter().zip(predictions).enumerate() {
        if reference.len() != prediction.len() {
            return Err(MetricsError::InconsistentLength {
                sentence,
                references: reference.len(),
                predictions: prediction.len(),
            });
        }
    }

    Ok(())
}

/// Index of the highest score, the first one on ties
pub fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_score), (i, score)| {
            if *score > best_score {
                (i, *score)
            } else {
                (best, best_score)
            }
        })
        .0
}

fn tag_name(schema: &LabelSchema, id: i64) -> Result<&str, MetricsError> {
    usize::try_from(id)
        .ok()
        .and_then(|id| schema.name(id))
        .ok_or(MetricsError::UnknownLabel(id))
}

/// Metrics Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MetricsError {
    /// A class id outside the label schema
    #[error("label {0} is not in the label schema")]
    UnknownLabel(i64),

    /// References and predictions don't have the same number of sentences
    #[error("found {references} reference sentences but {predictions} predicted sentences")]
    InconsistentSentences {
        /// Number of reference sentences
        references: usize,

        /// Number of predicted sentences
        predictions: usize,
    },

    /// A sentence has a different number of tags in the references and predictions
    #[error("sentence {sentence} has {references} reference tags but {predictions} predicted tags")]
    InconsistentLength {
        /// Index of the sentence
        sentence: usize,

        /// Number of reference tags
        references: usize,

        /// Number of predicted tags
        predictions: usize,
    },

    /// There are no tags to score
    #[error("no tags to evaluate")]
    Empty,

    /// The sequence labeling evaluator failed
    #[error("unable to score entities: {0}")]
    Evaluator(String),
}
