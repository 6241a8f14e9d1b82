// ============================================================
// Layer 3 — LabeledExample Domain Type
// ============================================================
// One row of a sarcasm dataset:
//   - the raw text as it appeared in the file
//   - its categorical label (always a string, e.g. "0", "sarcasm")
//   - the normalised text produced by the TextNormalizer
//
// Created once at load time. Only the derived `clean_text`
// field is filled in after construction.

use serde::{Deserialize, Serialize};

/// Label assigned to the positive class when a dataset is binarised.
pub const POSITIVE_LABEL: &str = "1";
/// Label assigned to every other class when a dataset is binarised.
pub const NEGATIVE_LABEL: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text:       String,
    pub label:      String,
    pub clean_text: String,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text:       text.into(),
            label:      label.into(),
            clean_text: String::new(),
        }
    }

    /// Attach the normalised form of `text`.
    pub fn with_clean_text(mut self, clean_text: impl Into<String>) -> Self {
        self.clean_text = clean_text.into();
        self
    }

    /// Rows whose normalised text is empty carry no signal and are dropped by callers.
    pub fn is_empty(&self) -> bool {
        self.clean_text.is_empty()
    }

    /// Collapse a multi-class label onto {"1", "0"} against `positive`.
    pub fn binarize(mut self, positive: &str) -> Self {
        self.label = if self.label == positive {
            POSITIVE_LABEL.to_string()
        } else {
            NEGATIVE_LABEL.to_string()
        };
        self
    }
}

/// Drop examples whose normalised text is empty, keeping order.
pub fn drop_empty(examples: Vec<LabeledExample>) -> Vec<LabeledExample> {
    let before = examples.len();
    let kept: Vec<LabeledExample> = examples.into_iter().filter(|e| !e.is_empty()).collect();
    tracing::debug!("Dropped {} rows with empty normalised text", before - kept.len());
    kept
}
