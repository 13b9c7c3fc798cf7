/// BERT for Token Classification (such as named entity recognition)
pub mod token_classification;

/// bert-base-cased, the default for named entity recognition since casing is a strong signal
pub static BASE_CASED: &str = "bert-base-cased";
