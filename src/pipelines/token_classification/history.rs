use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

/// Training loss, logged every few steps
pub static LOSS: &str = "loss";

/// Evaluation loss, logged after each epoch
pub static EVAL_LOSS: &str = "eval_loss";

/// Evaluation accuracy, logged after each epoch
pub static EVAL_ACCURACY: &str = "eval_accuracy";

/// One entry of the training log: metric names mapped to values. Any metric may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(BTreeMap<String, f64>);

impl LogRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, replacing any previous value
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    /// Look up a metric
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// The metric names in this record
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for LogRecord {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

/// The ordered log of a training run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogHistory {
    /// Records in the order they were logged
    pub records: Vec<LogRecord>,
}

impl LogHistory {
    /// Append a record
    pub fn push(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    /// Write the history as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        fs::write(path.as_ref(), json)
            .map_err(|e| anyhow!("Unable to write {}: {}", path.as_ref().display(), e))
    }

    /// Read a history written by [`LogHistory::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Unable to read {}: {}", path.as_ref().display(), e))?;

        Ok(serde_json::from_str(&json)?)
    }
}

/// Per-epoch series pulled out of a [`LogHistory`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpochMetrics {
    /// Training loss values
    pub training_loss: Vec<f64>,

    /// Evaluation loss values
    pub test_loss: Vec<f64>,

    /// Evaluation accuracy values
    pub accuracy: Vec<f64>,
}

/// Extract the training loss, evaluation loss and evaluation accuracy series from a log.
///
/// Each series keeps only the records carrying that metric, in log order, so the three series
/// may differ in length. Values are rounded to three decimals.
pub fn epoch_metrics(history: &LogHistory) -> EpochMetrics {
    let series = |name: &str| -> Vec<f64> {
        history
            .records
            .iter()
            .filter_map(|record| record.get(name))
            .map(round3)
            .collect()
    };

    EpochMetrics {
        training_loss: series(LOSS),
        test_loss: series(EVAL_LOSS),
        accuracy: series(EVAL_ACCURACY),
    }
}

/// Round through a three decimal string, the way the values are displayed
fn round3(value: f64) -> f64 {
    format!("{:.3}", value).parse().unwrap_or(value)
}
