use std::fmt::Debug;

/// A trait for items that can be used for token classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the words of the example, already split
    fn words(&self) -> &[String];

    /// Returns the class id of each word
    fn tags(&self) -> &[usize];
}
