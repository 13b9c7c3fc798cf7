use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{pipelines::token_classification, utils::files::read_json_records};

use super::LoadableDataset;

/// A pre-split sentence with one tag id per word
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Item {
    /// The words of the sentence
    pub tokens: Vec<String>,

    /// The tag id of each word
    pub ner_tags: Vec<usize>,
}

impl token_classification::Item for Item {
    fn words(&self) -> &[String] {
        &self.tokens
    }

    fn tags(&self) -> &[usize] {
        &self.ner_tags
    }
}

/// An in-memory NER dataset
pub struct Dataset {
    dataset: InMemDataset<Item>,
}

impl dataset::Dataset<Item> for Dataset {
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl From<Vec<Item>> for Dataset {
    fn from(items: Vec<Item>) -> Self {
        Self {
            dataset: InMemDataset::new(items),
        }
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    /// Read a JSON array of records, or one JSON record per line
    async fn load(path: &str) -> anyhow::Result<Self> {
        let items: Vec<Item> = read_json_records(path).await?;

        debug!("Loaded {} examples from {}", items.len(), path);

        Ok(items.into())
    }
}

impl Dataset {
    /// Shuffle with a seed and split off `ceil(len * test_size)` examples for testing.
    /// Returns `(train, test)`.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> anyhow::Result<(Self, Self)> {
        if test_size <= 0.0 || test_size >= 1.0 {
            return Err(anyhow!("test_size must be between 0 and 1, got {}", test_size));
        }

        let len = self.len();
        let n_test = (len as f64 * test_size).ceil() as usize;

        if n_test == 0 || n_test >= len {
            return Err(anyhow!(
                "Splitting {} examples with test_size {} leaves an empty split",
                len,
                test_size
            ));
        }

        let mut items: Vec<Item> = self.iter().collect();
        items.shuffle(&mut StdRng::seed_from_u64(seed));

        let train = items.split_off(n_test);

        Ok((train.into(), items.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use burn::data::dataset::Dataset as _;
    use pretty_assertions::assert_eq;

    use super::*;

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(vec![format!("word{}", i)], vec![i % 3]))
            .collect()
    }

    #[tokio::test]
    async fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"tokens": ["Acme"], "ner_tags": [3]}}"#).unwrap();

        let dataset = Dataset::load(file.path().to_str().unwrap()).await.unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.get(0), Some(Item::new(vec!["Acme".into()], vec![3])));
    }

    #[test]
    fn split_sizes_round_the_test_part_up() {
        let dataset: Dataset = items(11).into();

        let (train, test) = dataset.train_test_split(0.2, 42).unwrap();

        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn split_is_a_seeded_partition() {
        let dataset: Dataset = items(20).into();

        let (train, test) = dataset.train_test_split(0.25, 7).unwrap();
        let (train_again, test_again) = dataset.train_test_split(0.25, 7).unwrap();

        assert_eq!(train.iter().collect::<Vec<_>>(), train_again.iter().collect::<Vec<_>>());
        assert_eq!(test.iter().collect::<Vec<_>>(), test_again.iter().collect::<Vec<_>>());

        let mut all: Vec<Item> = train.iter().chain(test.iter()).collect();
        all.sort_by(|a, b| a.tokens.cmp(&b.tokens));
        let mut expected = items(20);
        expected.sort_by(|a, b| a.tokens.cmp(&b.tokens));

        assert_eq!(all, expected);
    }

    #[test]
    fn rejects_degenerate_splits() {
        let dataset: Dataset = items(1).into();

        assert!(dataset.train_test_split(0.2, 42).is_err());
        assert!(items_dataset(5).train_test_split(0.0, 42).is_err());
        assert!(items_dataset(5).train_test_split(1.5, 42).is_err());
    }

    fn items_dataset(n: usize) -> Dataset {
        items(n).into()
    }
}
