// ============================================================
// Layer 5 — BiLSTM Classifier
// ============================================================
// The recurrent baseline:
//
//   token_ids    [b, s] ──Embedding──▶ forward LSTM  ─┐
//   reversed_ids [b, s] ──Embedding──▶ backward LSTM ─┴─▶ [b, s, 2 * hidden]
//     ──mean pool──▶ [b, 2 * hidden]      over real tokens only
//     ──Dropout────▶
//     ──Linear─────▶ [b, num_classes]
//
// The backward direction reads each row reversed within its own
// length, so both recurrences see a row's real tokens first and
// the trailing padding last. Outputs at real positions therefore
// never depend on how much padding the batch added. Pooling then
// drops the padded positions and divides by the row length.
//
// Reference: Hochreiter & Schmidhuber (1997) LSTM
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

use crate::data::batcher::SequenceBatch;
use crate::ml::classifier::{ClassificationStep, SequenceClassifier};

#[derive(Config, Debug)]
pub struct BiLstmClassifierConfig {
    pub vocab_size:  usize,
    pub num_classes: usize,
    #[config(default = 128)]
    pub embed_dim:   usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    #[config(default = 0.3)]
    pub dropout:     f64,
}

impl BiLstmClassifierConfig {
    /// Smaller network used for quick runs and sweeps.
    pub fn fast(vocab_size: usize, num_classes: usize) -> Self {
        Self::new(vocab_size, num_classes)
            .with_embed_dim(64)
            .with_hidden_size(64)
            .with_dropout(0.1)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BiLstmClassifier<B> {
        BiLstmClassifier {
            embedding:     EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device),
            forward_lstm:  LstmConfig::new(self.embed_dim, self.hidden_size, true).init(device),
            backward_lstm: LstmConfig::new(self.embed_dim, self.hidden_size, true).init(device),
            dropout:       DropoutConfig::new(self.dropout).init(),
            classifier:    LinearConfig::new(2 * self.hidden_size, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct BiLstmClassifier<B: Backend> {
    pub embedding:     Embedding<B>,
    pub forward_lstm:  Lstm<B>,
    pub backward_lstm: Lstm<B>,
    pub dropout:       Dropout,
    pub classifier:    Linear<B>,
}

impl<B: Backend> BiLstmClassifier<B> {
    /// token_ids / reversed_ids / mask: [batch, seq_len], lengths: [batch]
    /// → logits: [batch, num_classes]
    pub fn forward(
        &self,
        token_ids:    Tensor<B, 2, Int>,
        reversed_ids: Tensor<B, 2, Int>,
        mask:         Tensor<B, 2>,
        lengths:      Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, _] = token_ids.dims();

        let (ahead, _)  = self.forward_lstm.forward(self.embedding.forward(token_ids), None);
        let (behind, _) = self.backward_lstm.forward(self.embedding.forward(reversed_ids), None);
        let hidden = Tensor::cat(vec![ahead, behind], 2); // [b, s, 2h]
        let [_, _, width] = hidden.dims();

        // ── Masked mean over each row's own length ────────────────────────────
        let counts = lengths.float().reshape([batch_size, 1]).clamp_min(1.0);
        let summed = (hidden * mask.unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch_size, width]);
        let pooled = summed / counts;

        self.classifier.forward(self.dropout.forward(pooled))
    }
}

impl<B: Backend> SequenceClassifier<B, SequenceBatch<B>> for BiLstmClassifier<B> {
    fn classify(&self, batch: SequenceBatch<B>) -> ClassificationStep<B> {
        let logits = self.forward(batch.token_ids, batch.reversed_ids, batch.mask, batch.lengths);
        ClassificationStep { logits, targets: batch.labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::SequenceBatcher, dataset::SequenceSample};
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher};

    type TestBackend = NdArray;

    fn logits_of(model: &BiLstmClassifier<TestBackend>, rows: Vec<Vec<u32>>) -> Vec<f32> {
        let batcher = SequenceBatcher::<TestBackend>::new(Default::default());
        let samples = rows
            .into_iter()
            .map(|token_ids| SequenceSample { token_ids, label: 0 })
            .collect();
        let batch = batcher.batch(samples);
        model
            .forward(batch.token_ids, batch.reversed_ids, batch.mask, batch.lengths)
            .into_data()
            .iter::<f32>()
            .collect()
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: BiLstmClassifier<TestBackend> = BiLstmClassifierConfig::fast(10, 3).init(&device);
        let logits = logits_of(&model, vec![vec![2, 3, 4], vec![5]]);
        assert_eq!(logits.len(), 2 * 3);
    }

    #[test]
    fn test_logits_ignore_batch_padding() {
        let device = Default::default();
        let model: BiLstmClassifier<TestBackend> = BiLstmClassifierConfig::fast(10, 2).init(&device);

        let alone = logits_of(&model, vec![vec![2, 3]]);
        // the second row widens the batch to 6, so [2, 3] gets four <pad> columns
        let padded = logits_of(&model, vec![vec![2, 3], vec![4, 5, 6, 7, 8, 9]]);

        assert_eq!(alone.len(), 2);
        for (a, p) in alone.iter().zip(&padded[..2]) {
            assert!((a - p).abs() < 1e-5, "alone={alone:?} padded={:?}", &padded[..2]);
        }
    }

    #[test]
    fn test_all_padding_row_stays_finite() {
        let device = Default::default();
        let model: BiLstmClassifier<TestBackend> = BiLstmClassifierConfig::fast(10, 2).init(&device);

        let values = logits_of(&model, vec![vec![]]);
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
