use async_trait::async_trait;

/// Token-level NER datasets
pub mod ner;

/// A dataset which can be loaded from a file
#[async_trait]
pub trait LoadableDataset<I>: burn::data::dataset::Dataset<I> {
    /// Load the dataset
    async fn load(path: &str) -> anyhow::Result<Self>
    where
        Self: std::marker::Sized;
}
