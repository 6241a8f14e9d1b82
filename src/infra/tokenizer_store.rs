// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Supplies the transformer's subword tokenizer, from one of
// two places:
//
//   1. A pretrained HuggingFace tokenizer.json (e.g. the one
//      shipped with bert-base-uncased), loaded as-is.
//   2. A WordPiece tokenizer trained in memory on the training
//      split (BERT normaliser + pre-tokeniser, "##" prefix for
//      word-internal pieces).
//
// Either way the tokenizer is written next to the saved model
// as tokenizer.json, so prediction uses the same vocabulary.
//
// Reference: HuggingFace tokenizers crate documentation
//            Schuster & Nakajima (2012) WordPiece

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tokenizers::{
    decoders::wordpiece::WordPiece as WordPieceDecoder,
    models::wordpiece::{WordPiece, WordPieceTrainer},
    normalizers::BertNormalizer,
    pre_tokenizers::bert::BertPreTokenizer,
    AddedToken, DecoderWrapper, NormalizerWrapper, PostProcessorWrapper, PreTokenizerWrapper,
    Tokenizer, TokenizerBuilder, TokenizerImpl,
};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Special tokens in id order; a trained vocabulary starts with them.
pub const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

/// A pair must occur this often to be merged into a longer piece.
const MIN_PAIR_FREQUENCY: u64 = 2;

type WordPieceTokenizer =
    TokenizerImpl<WordPiece, NormalizerWrapper, PreTokenizerWrapper, PostProcessorWrapper, DecoderWrapper>;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load the tokenizer stored in this directory.
    pub fn load(&self) -> Result<Tokenizer> {
        load_tokenizer(&self.path())
    }

    /// Write `tokenizer` into this directory.
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot save tokenizer to '{}': {e}", path.display()))?;
        Ok(path)
    }
}

/// Use `pretrained` when given, otherwise train a WordPiece tokenizer on `texts`.
pub fn load_or_build(
    pretrained: Option<&Path>,
    texts:      &[String],
    vocab_size: usize,
) -> Result<Tokenizer> {
    match pretrained {
        Some(path) => {
            tracing::info!("Loading pretrained tokenizer from '{}'", path.display());
            load_tokenizer(path)
        }
        None => {
            tracing::info!("Training WordPiece tokenizer (vocab_size={})", vocab_size);
            train_wordpiece(texts, vocab_size)
        }
    }
}

/// Train a WordPiece vocabulary of at most `vocab_size` pieces on `texts`.
///
/// Every character seen in training gets a piece, so only words with
/// unseen characters map to [UNK].
pub fn train_wordpiece(texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
    let mut trainer = WordPieceTrainer::builder()
        .vocab_size(vocab_size)
        .min_frequency(MIN_PAIR_FREQUENCY)
        .show_progress(false)
        .special_tokens(SPECIAL_TOKENS.iter().map(|t| AddedToken::from(*t, true)).collect())
        .build();

    let mut tokenizer: WordPieceTokenizer = TokenizerBuilder::new()
        .with_model(WordPiece::default())
        .with_normalizer(Some(BertNormalizer::default().into()))
        .with_pre_tokenizer(Some(BertPreTokenizer.into()))
        .with_decoder(Some(WordPieceDecoder::default().into()))
        .build()
        .map_err(|e| anyhow!("Cannot assemble tokenizer: {e}"))?;

    tokenizer
        .train(&mut trainer, texts.iter())
        .map_err(|e| anyhow!("Cannot train tokenizer: {e}"))?;

    let tokenizer = Tokenizer::from(tokenizer);
    tracing::info!("Tokenizer trained with {} pieces", tokenizer.get_vocab_size(true));
    Ok(tokenizer)
}

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {e}", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec!["playing played player plays".to_string(), "played plays".to_string()]
    }

    #[test]
    fn test_special_tokens_come_first() {
        let tok = train_wordpiece(&corpus(), 200).unwrap();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            assert_eq!(tok.token_to_id(token), Some(id as u32));
        }
    }

    #[test]
    fn test_unseen_word_splits_into_pieces() {
        let tok = train_wordpiece(&corpus(), 200).unwrap();
        let unk = tok.token_to_id("[UNK]").unwrap();

        // "payed" never occurs, but all of its characters do
        let enc = tok.encode("payed", false).unwrap();
        assert!(enc.get_ids().len() > 1);
        assert!(!enc.get_ids().contains(&unk));
        assert!(enc.get_tokens()[1..].iter().all(|t| t.starts_with("##")));

        // 'z' was never seen, so the whole word is unknown
        let enc = tok.encode("zebra", false).unwrap();
        assert_eq!(enc.get_ids(), &[unk]);
    }

    #[test]
    fn test_vocab_size_limits_merges() {
        let texts = vec!["ab ab ab ba".to_string()];
        // specials + a, b, ##a, ##b leave no room for merges
        let small = train_wordpiece(&texts, 5).unwrap();
        assert!(small.token_to_id("ab").is_none());
        let large = train_wordpiece(&texts, 50).unwrap();
        assert!(large.token_to_id("ab").is_some());
        // "ba" occurs once, below the merge frequency
        assert!(large.token_to_id("ba").is_none());
    }

    #[test]
    fn test_build_save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("run"));
        let built = train_wordpiece(&corpus(), 200).unwrap();

        store.save(&built).unwrap();
        let reloaded = store.load().unwrap();
        let before = built.encode("player payed covid-19", false).unwrap();
        let after = reloaded.encode("player payed covid-19", false).unwrap();
        assert_eq!(before.get_ids(), after.get_ids());
    }

    #[test]
    fn test_missing_pretrained_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load_or_build(Some(&missing), &[], 10).is_err());
    }
}
