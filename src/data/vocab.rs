//! Frequency-thresholded word vocabulary for the recurrent model.
//!
//! Two ids are reserved: `<pad>` = 0 and `<oov>` = 1. Every other
//! token gets the next free id in order of first appearance in the
//! training texts, provided its total count across all of them is at
//! least `min_freq`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const PAD_TOKEN: &str = "<pad>";
pub const OOV_TOKEN: &str = "<oov>";
pub const PAD_ID: u32 = 0;
pub const OOV_ID: u32 = 1;
pub const DEFAULT_MIN_FREQ: usize = 2;

/// Serialised as the plain token list in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    /// Tokens in id order; index == id.
    tokens: Vec<String>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from whitespace-tokenised training texts.
    pub fn build<'a>(texts: impl IntoIterator<Item = &'a str>, min_freq: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for text in texts {
            for token in text.split_whitespace() {
                let count = counts.entry(token).or_insert(0);
                if *count == 0 {
                    first_seen.push(token);
                }
                *count += 1;
            }
        }

        let mut tokens = vec![PAD_TOKEN.to_string(), OOV_TOKEN.to_string()];
        tokens.extend(
            first_seen
                .into_iter()
                .filter(|t| counts[t] >= min_freq && *t != PAD_TOKEN && *t != OOV_TOKEN)
                .map(str::to_string),
        );
        Self::from_tokens(tokens)
    }

    fn from_tokens(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self { tokens, index }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Map each token to its id, unknown tokens to `<oov>`; optionally truncate.
    pub fn encode(&self, text: &str, max_len: Option<usize>) -> Vec<u32> {
        let ids = text
            .split_whitespace()
            .map(|t| self.id_of(t).unwrap_or(OOV_ID));
        match max_len {
            Some(n) => ids.take(n).collect(),
            None => ids.collect(),
        }
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_counts_first_appearance_order() {
        let v = Vocabulary::build(["a b b", "a c c c"], 2);
        let tokens: Vec<String> = v.clone().into();
        assert_eq!(tokens, vec!["<pad>", "<oov>", "a", "b", "c"]);
        assert_eq!(v.id_of("a"), Some(2));
        assert_eq!(v.id_of("c"), Some(4));
    }

    #[test]
    fn test_rare_tokens_excluded() {
        let texts = ["red red blue", "green red", "blue yellow"];
        let v = Vocabulary::build(texts, 2);
        assert!(v.id_of("green").is_none());
        assert!(v.id_of("yellow").is_none());
        assert!(v.id_of("red").is_some());
        assert!(v.id_of("blue").is_some());
    }

    #[test]
    fn test_reserved_entries_always_present() {
        let empty: [&str; 0] = [];
        let v = Vocabulary::build(empty, 2);
        assert_eq!(v.len(), 2);
        assert_eq!(v.id_of(PAD_TOKEN), Some(PAD_ID));
        assert_eq!(v.id_of(OOV_TOKEN), Some(OOV_ID));

        // reserved spellings in the data do not get a second id
        let v = Vocabulary::build(["<pad> <pad> x x"], 2);
        assert_eq!(v.len(), 3);
        assert_eq!(v.id_of("x"), Some(2));
    }

    #[test]
    fn test_encode_maps_unknown_to_oov_and_truncates() {
        let v = Vocabulary::build(["a b b", "a c c c"], 2);
        assert_eq!(v.encode("a z c b", None), vec![2, OOV_ID, 4, 3]);
        assert_eq!(v.encode("a z c b", Some(2)), vec![2, OOV_ID]);
        assert!(v.encode("", None).is_empty());
    }

    #[test]
    fn test_serde_keeps_ids() {
        let v = Vocabulary::build(["a b b", "a c c c"], 2);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"["<pad>","<oov>","a","b","c"]"#);
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.id_of("b"), Some(3));
    }
}
