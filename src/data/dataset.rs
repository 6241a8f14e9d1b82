use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised transformer input.
/// Sequence format: [CLS] tokens [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

/// One word-id sequence for the recurrent model; unpadded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

/// In-memory dataset over already-encoded samples.
pub struct ClassificationDataset<T> {
    samples: Vec<T>,
}

impl<T> ClassificationDataset<T> {
    pub fn new(samples: Vec<T>) -> Self { Self { samples } }
}

impl<T: Clone + Send + Sync> Dataset<T> for ClassificationDataset<T> {
    fn get(&self, index: usize) -> Option<T> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
