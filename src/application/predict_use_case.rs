// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Restore a saved model and label raw texts:
//
//   Step 1: Find + load the model      (Layer 6 → Layer 5)
//   Step 2: Normalise each text        (Layer 4 - data)
//   Step 3: Predict one label per text (Layer 5 - ml)
//
// Texts that normalise to nothing are still predicted; the
// model then only sees the [CLS]/[SEP] frame or padding.

use std::path::Path;

use anyhow::Result;

use crate::data::normalizer::TextNormalizer;
use crate::domain::traits::TextClassifier;
use crate::infra::device::ComputeDevice;

use super::pipeline::load_model;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub text:       String,
    pub clean_text: String,
    pub label:      String,
}

pub struct PredictUseCase {
    model:      Box<dyn TextClassifier>,
    normalizer: TextNormalizer,
}

impl PredictUseCase {
    pub fn new(model_path: &Path, device: &ComputeDevice) -> Result<Self> {
        let model = load_model(model_path, device)?;
        tracing::info!("Loaded {} model with labels {:?}", model.kind(), model.labels().names());
        Ok(Self { model, normalizer: TextNormalizer::new() })
    }

    pub fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let clean: Vec<String> = texts.iter().map(|t| self.normalizer.normalize(t)).collect();
        let labels = self.model.predict(&clean)?;

        Ok(texts
            .iter()
            .zip(clean)
            .zip(labels)
            .map(|((text, clean_text), label)| Prediction { text: text.clone(), clean_text, label })
            .collect())
    }
}
