// ============================================================
// Layer 4 — Sequence Encoders
// ============================================================
// Turns normalised text into the integer sequences each model
// consumes. There are two schemes:
//
//   SubwordEncoder (transformer)
//     text ──tokenizer──▶ ids
//          ──wrap───────▶ [CLS] ids [SEP]
//          ──fit────────▶ truncate / pad to max_len
//     plus an attention mask (1 = real token, 0 = padding)
//
//   WordEncoder (BiLSTM)
//     text ──vocabulary──▶ ids (unknown → <oov>)
//     variable length; padding happens at batch time
//
// Both encoders need the label map to turn the label string
// into a class index, so only rows with a known label can be
// encoded.
//
// Reference: HuggingFace tokenizers crate documentation
//            BERT paper (Devlin et al., 2018) — [CLS]/[SEP]

use anyhow::{anyhow, Context, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::{SequenceSample, TransformerSample};
use crate::data::vocab::Vocabulary;
use crate::domain::{example::LabeledExample, label_map::LabelMap};

/// BERT-convention ids used when the tokenizer has no such token.
const FALLBACK_PAD_ID: u32 = 0;
const FALLBACK_CLS_ID: u32 = 101;
const FALLBACK_SEP_ID: u32 = 102;

// ─── SubwordEncoder ───────────────────────────────────────────────────────────
pub struct SubwordEncoder {
    tokenizer: Tokenizer,
    max_len:   usize,
    pad_id:    u32,
    cls_id:    u32,
    sep_id:    u32,
}

impl SubwordEncoder {
    /// `max_len` counts the [CLS] and [SEP] tokens; values below 2 are raised to 2.
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Self {
        let special = |names: &[&str], fallback: u32| {
            names
                .iter()
                .find_map(|n| tokenizer.token_to_id(n))
                .unwrap_or(fallback)
        };
        let pad_id = special(&["[PAD]", "<pad>"], FALLBACK_PAD_ID);
        let cls_id = special(&["[CLS]", "<s>"], FALLBACK_CLS_ID);
        let sep_id = special(&["[SEP]", "</s>"], FALLBACK_SEP_ID);

        Self { tokenizer, max_len: max_len.max(2), pad_id, cls_id, sep_id }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Embedding rows needed to cover every id the encoder can emit.
    pub fn vocab_size(&self) -> usize {
        let max_vocab = self
            .tokenizer
            .get_vocab(true)
            .values()
            .copied()
            .max()
            .unwrap_or(0);
        let max_special = self.pad_id.max(self.cls_id).max(self.sep_id);
        max_vocab.max(max_special) as usize + 1
    }

    /// Wrap, truncate and pad raw tokenizer ids into (input_ids, attention_mask).
    pub fn frame(&self, ids: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let body = ids.len().min(self.max_len - 2);

        let mut input_ids = Vec::with_capacity(self.max_len);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(&ids[..body]);
        input_ids.push(self.sep_id);

        let real = input_ids.len();
        let mut attention_mask = vec![1u32; real];

        input_ids.resize(self.max_len, self.pad_id);
        attention_mask.resize(self.max_len, 0);
        (input_ids, attention_mask)
    }

    /// Encode texts without labels (prediction). Label index is set to 0.
    pub fn encode_texts(&self, texts: &[String]) -> Result<Vec<TransformerSample>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, false)
            .map_err(|e| anyhow!("Tokenizer failed: {e}"))?;

        Ok(encodings
            .iter()
            .map(|enc| {
                let (input_ids, attention_mask) = self.frame(enc.get_ids());
                TransformerSample { input_ids, attention_mask, label: 0 }
            })
            .collect())
    }

    /// Encode labelled rows; every label must be in `labels`.
    pub fn encode(&self, examples: &[LabeledExample], labels: &LabelMap) -> Result<Vec<TransformerSample>> {
        let texts: Vec<String> = examples.iter().map(|e| e.clean_text.clone()).collect();
        let mut samples = self.encode_texts(&texts)?;
        for (sample, example) in samples.iter_mut().zip(examples) {
            sample.label = label_index(labels, &example.label)?;
        }
        Ok(samples)
    }
}

// ─── WordEncoder ──────────────────────────────────────────────────────────────
pub struct WordEncoder {
    vocab:   Vocabulary,
    max_len: Option<usize>,
}

impl WordEncoder {
    pub fn new(vocab: Vocabulary, max_len: Option<usize>) -> Self {
        Self { vocab, max_len }
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn encode_texts(&self, texts: &[String]) -> Vec<SequenceSample> {
        texts
            .iter()
            .map(|t| SequenceSample { token_ids: self.vocab.encode(t, self.max_len), label: 0 })
            .collect()
    }

    pub fn encode(&self, examples: &[LabeledExample], labels: &LabelMap) -> Result<Vec<SequenceSample>> {
        examples
            .iter()
            .map(|e| {
                Ok(SequenceSample {
                    token_ids: self.vocab.encode(&e.clean_text, self.max_len),
                    label:     label_index(labels, &e.label)?,
                })
            })
            .collect()
    }
}

fn label_index(labels: &LabelMap, label: &str) -> Result<usize> {
    labels
        .index_of(label)
        .with_context(|| format!("Label '{label}' is not in the training label map"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::train_wordpiece;

    fn word_tokenizer() -> Tokenizer {
        let texts = vec!["cat dog".to_string(), "dog bird".to_string()];
        train_wordpiece(&texts, 100).unwrap()
    }

    #[test]
    fn test_frame_wraps_and_pads() {
        let tok = word_tokenizer();
        let enc = SubwordEncoder::new(tok, 6);
        let (ids, mask) = enc.frame(&[7, 8]);
        // [PAD] 0, [CLS] 2, [SEP] 3
        assert_eq!(ids, vec![2, 7, 8, 3, 0, 0]);
        assert_eq!(mask, vec![1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_frame_truncates_keeping_sep() {
        let tok = word_tokenizer();
        let enc = SubwordEncoder::new(tok, 4);
        let (ids, mask) = enc.frame(&[7, 8, 9, 10]);
        assert_eq!(ids, vec![2, 7, 8, 3]);
        assert_eq!(mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_encode_assigns_label_indices() {
        let tok = word_tokenizer();
        let enc = SubwordEncoder::new(tok, 8);
        let labels = LabelMap::from_labels(["0", "1"]);
        let rows = vec![
            LabeledExample::new("", "1").with_clean_text("dog cat"),
            LabeledExample::new("", "0").with_clean_text("unknownword"),
        ];
        let samples = enc.encode(&rows, &labels).unwrap();
        assert_eq!(samples[0].label, 1);
        assert_eq!(samples[1].label, 0);
        assert_eq!(samples[0].input_ids.len(), 8);
        // [CLS] + at least one piece per word + [SEP]
        assert!(samples[0].attention_mask.iter().sum::<u32>() >= 4);
        // 'u' and 'k' never occur in training, so the word is [UNK]
        assert_eq!(&samples[1].input_ids[..4], &[2, 1, 3, 0]);
        assert_eq!(enc.vocab_size(), enc.tokenizer().get_vocab_size(true));
    }

    #[test]
    fn test_unknown_label_is_error() {
        let vocab = Vocabulary::build(["a a"], 1);
        let enc = WordEncoder::new(vocab, None);
        let labels = LabelMap::from_labels(["0"]);
        let rows = vec![LabeledExample::new("", "irony").with_clean_text("a")];
        assert!(enc.encode(&rows, &labels).is_err());
    }

    #[test]
    fn test_word_encoder_truncates() {
        let vocab = Vocabulary::build(["a b c a b c"], 2);
        let enc = WordEncoder::new(vocab, Some(2));
        let labels = LabelMap::from_labels(["x"]);
        let rows = vec![LabeledExample::new("", "x").with_clean_text("c b a")];
        let samples = enc.encode(&rows, &labels).unwrap();
        assert_eq!(samples[0].token_ids, vec![4, 3]);
        assert_eq!(samples[0].label, 0);
    }
}
