//! Class index to species name mapping

/// Label returned for any class index without a table entry.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Dense mapping from classifier output index to species name.
///
/// The table is handed to the inference engine at construction rather
/// than living as process-wide state, so alternate label sets can be
/// used in tests.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Build a table from an ordered list of names; index i maps to
    /// `labels[i]`.
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// The 16 flower species the pretrained model was fine-tuned on.
    pub fn flowers() -> Self {
        Self::new([
            "calendula",
            "coreopsis",
            "rose",
            "black_eyed_susan",
            "water_lily",
            "california_poppy",
            "dandelion",
            "magnolia",
            "astilbe",
            "sunflower",
            "tulip",
            "bellflower",
            "iris",
            "common_daisy",
            "daffodil",
            "carnation",
        ])
    }

    /// Look up a class index, falling back to [`UNKNOWN_LABEL`] for
    /// indices outside the table.
    pub fn get(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::flowers()
    }
}
