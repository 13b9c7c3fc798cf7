use std::collections::BTreeMap;

/// Label value for positions excluded from the loss and from metrics, such as `[CLS]` and `[SEP]`
pub const IGNORE_INDEX: i64 = -100;

/// The tags used for fine-tuning, in class id order
pub static DEFAULT_LABELS: &[&str; 11] = &[
    "O",
    "B-PER",
    "I-PER",
    "B-ORG",
    "I-ORG",
    "B-LOC",
    "I-LOC",
    "B-JOBTITLE",
    "I-JOBTITLE",
    "B-IND",
    "I-IND",
];

/// An ordered set of BIO tags and the table mapping each begin tag to its inside tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSchema {
    names: Vec<String>,
    begin_to_inside: BTreeMap<usize, usize>,
}

impl LabelSchema {
    /// Build a schema from tag names, where a tag's position is its class id
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }

        let names: Vec<String> = names.iter().map(|name| name.as_ref().to_string()).collect();

        let label2id: BTreeMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id))
            .collect();
        if label2id.len() != names.len() {
            let duplicate = names
                .iter()
                .enumerate()
                .find(|(id, name)| label2id.get(name.as_str()) != Some(id))
                .map(|(_, name)| name.clone())
                .unwrap_or_default();

            return Err(SchemaError::Duplicate(duplicate));
        }

        let mut begin_to_inside = BTreeMap::new();
        for (id, name) in names.iter().enumerate() {
            if let Some(entity) = name.strip_prefix("B-") {
                let inside = label2id
                    .get(format!("I-{}", entity).as_str())
                    .ok_or_else(|| SchemaError::MissingInside(name.clone()))?;

                begin_to_inside.insert(id, *inside);
            }
        }

        Ok(Self {
            names,
            begin_to_inside,
        })
    }

    /// Build a schema from a class id to tag name map
    pub fn from_id2label(id2label: &BTreeMap<usize, String>) -> Result<Self, SchemaError> {
        let names: Vec<&String> = id2label.values().collect();

        Self::new(&names)
    }

    /// The number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false, an empty schema can't be constructed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Tag names in class id order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The tag name for a class id
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// The class id for a tag name
    pub fn id(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The inside tag for a begin tag, or `None` when `id` isn't a begin tag
    pub fn inside_of(&self, id: usize) -> Option<usize> {
        self.begin_to_inside.get(&id).copied()
    }

    /// The begin to inside lookup table
    pub fn begin_to_inside(&self) -> &BTreeMap<usize, usize> {
        &self.begin_to_inside
    }

    /// A map from class ids to tag names
    pub fn id2label(&self) -> BTreeMap<usize, String> {
        self.names.iter().cloned().enumerate().collect()
    }

    /// A map from tag names to class ids
    pub fn label2id(&self) -> BTreeMap<String, usize> {
        self.names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect()
    }
}

impl Default for LabelSchema {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS).expect("the default labels form a valid schema")
    }
}

/// Schema Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// No tags were given
    #[error("a label schema needs at least one tag")]
    Empty,

    /// A tag name appears more than once
    #[error("duplicate tag {0}")]
    Duplicate(String),

    /// A begin tag has no matching inside tag
    #[error("no inside tag for {0}")]
    MissingInside(String),
}
