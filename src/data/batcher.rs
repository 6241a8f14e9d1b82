// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implement Burn's Batcher trait to stack encoded samples into
// device tensors.
//
//   TransformerBatcher
//     Input:  N TransformerSamples, each already padded to S
//     Output: input_ids / attention_mask [N, S], labels [N]
//
//   SequenceBatcher
//     Input:  N SequenceSamples of varying length
//     Output: token_ids [N, L] padded with <pad> to the longest
//             sequence L of THIS batch, the same ids reversed
//             within each row's own length (padding stays at
//             the tail), a float mask [N, L] (1.0 = real token),
//             lengths [N], labels [N]
//
// Both flatten row-major into one Vec and reshape:
//   [s1_t1, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{SequenceSample, TransformerSample};
use crate::data::vocab::PAD_ID;

// ─── TransformerBatch ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TransformerBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding — shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class index per row — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct TransformerBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TransformerBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TransformerSample, TransformerBatch<B>> for TransformerBatcher<B> {
    fn batch(&self, items: Vec<TransformerSample>) -> TransformerBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        TransformerBatch { input_ids, attention_mask, labels }
    }
}

// ─── SequenceBatch ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Padded word ids — shape: [batch_size, longest]
    pub token_ids: Tensor<B, 2, Int>,

    /// Each row's real tokens in reverse order, then the same padding — shape: [batch_size, longest]
    pub reversed_ids: Tensor<B, 2, Int>,

    /// 1.0 for real tokens, 0.0 for padding — shape: [batch_size, longest]
    pub mask: Tensor<B, 2>,

    /// Unpadded length of each row — shape: [batch_size]
    pub lengths: Tensor<B, 1, Int>,

    /// Class index per row — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SequenceSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceSample>) -> SequenceBatch<B> {
        let batch_size = items.len();
        // an all-empty batch still gets one (padding) column
        let longest = items.iter().map(|s| s.token_ids.len()).max().unwrap_or(0).max(1);

        let mut ids_flat  = Vec::with_capacity(batch_size * longest);
        let mut rev_flat  = Vec::with_capacity(batch_size * longest);
        let mut mask_flat = Vec::with_capacity(batch_size * longest);
        for sample in &items {
            let len = sample.token_ids.len();
            ids_flat.extend(sample.token_ids.iter().map(|&x| x as i32));
            ids_flat.extend(std::iter::repeat(PAD_ID as i32).take(longest - len));
            rev_flat.extend(sample.token_ids.iter().rev().map(|&x| x as i32));
            rev_flat.extend(std::iter::repeat(PAD_ID as i32).take(longest - len));
            mask_flat.extend(std::iter::repeat(1.0f32).take(len));
            mask_flat.extend(std::iter::repeat(0.0f32).take(longest - len));
        }

        let lengths: Vec<i32> = items.iter().map(|s| s.token_ids.len() as i32).collect();
        let labels:  Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let token_ids = Tensor::<B, 1, Int>::from_ints(
            ids_flat.as_slice(), &self.device
        ).reshape([batch_size, longest]);

        let reversed_ids = Tensor::<B, 1, Int>::from_ints(
            rev_flat.as_slice(), &self.device
        ).reshape([batch_size, longest]);

        let mask = Tensor::<B, 1>::from_floats(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, longest]);

        let lengths = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device);
        let labels  = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        SequenceBatch { token_ids, reversed_ids, mask, lengths, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ints<const D: usize>(t: Tensor<TestBackend, D, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    #[test]
    fn test_sequence_batch_pads_to_longest_in_batch() {
        let batcher = SequenceBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            SequenceSample { token_ids: vec![5, 6, 7], label: 1 },
            SequenceSample { token_ids: vec![8], label: 0 },
        ]);

        assert_eq!(batch.token_ids.dims(), [2, 3]);
        assert_eq!(ints(batch.token_ids), vec![5, 6, 7, 8, 0, 0]);
        assert_eq!(ints(batch.reversed_ids), vec![7, 6, 5, 8, 0, 0]);
        assert_eq!(ints(batch.lengths), vec![3, 1]);
        assert_eq!(ints(batch.labels), vec![1, 0]);
        let mask: Vec<f32> = batch.mask.into_data().iter::<f32>().collect();
        assert_eq!(mask, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sequence_batch_width_depends_on_batch() {
        let batcher = SequenceBatcher::<TestBackend>::new(Default::default());
        let short = batcher.batch(vec![SequenceSample { token_ids: vec![2, 3], label: 0 }]);
        assert_eq!(short.token_ids.dims(), [1, 2]);
        let empty = batcher.batch(vec![SequenceSample { token_ids: vec![], label: 0 }]);
        assert_eq!(empty.token_ids.dims(), [1, 1]);
    }

    #[test]
    fn test_transformer_batch_shapes() {
        let batcher = TransformerBatcher::<TestBackend>::new(Default::default());
        let sample = |label| TransformerSample {
            input_ids:      vec![101, 9, 102, 0],
            attention_mask: vec![1, 1, 1, 0],
            label,
        };
        let batch = batcher.batch(vec![sample(0), sample(1), sample(1)]);
        assert_eq!(batch.input_ids.dims(), [3, 4]);
        assert_eq!(batch.attention_mask.dims(), [3, 4]);
        assert_eq!(ints(batch.labels), vec![0, 1, 1]);
    }
}
