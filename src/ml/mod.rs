// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network architectures and the loops that train them.
//
// What's in this layer:
//
//   classifier.rs  — SequenceClassifier trait: batch → logits
//                    + targets, shared by both models
//
//   model.rs       — Transformer encoder classifier:
//                    • Token + positional embeddings
//                    • Multi-head self-attention with padding mask
//                    • Feed-forward networks (GELU activation)
//                    • Pre-norm residual blocks
//                    • [CLS] pooling → linear head
//
//   lstm.rs        — Embedding → BiLSTM → masked mean pool
//                    → linear head
//
//   schedule.rs    — Constant or linear-warmup learning rate
//
//   trainer.rs     — Generic epoch loop, evaluation and
//                    prediction over any SequenceClassifier
//
//   transformer_pipeline.rs / lstm_pipeline.rs
//                  — Fit, save and reload each model kind
//                    behind the domain TextClassifier trait
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

/// Shared batch → logits contract
pub mod classifier;

/// Transformer encoder classifier
pub mod model;

/// Bidirectional LSTM classifier
pub mod lstm;

/// Learning-rate schedules
pub mod schedule;

/// Training loop, evaluation and prediction
pub mod trainer;

/// Transformer fit / save / load
pub mod transformer_pipeline;

/// BiLSTM fit / save / load
pub mod lstm_pipeline;
