//! The seam between model architectures and the shared training loop.

use burn::prelude::*;

/// Output of one forward pass over a batch.
pub struct ClassificationStep<B: Backend> {
    /// Unnormalised class scores — shape: [batch_size, num_classes]
    pub logits:  Tensor<B, 2>,
    /// True class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// A Burn module that maps a batch of encoded text to class logits.
///
/// Implemented by `TransformerClassifier` over `TransformerBatch` and by
/// `BiLstmClassifier` over `SequenceBatch`.
pub trait SequenceClassifier<B: Backend, I> {
    fn classify(&self, batch: I) -> ClassificationStep<B>;
}
