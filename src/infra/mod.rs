// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs      — Saving and loading trained models
//                        (CompactRecorder weights + a JSON
//                        manifest to rebuild the architecture)
//
//   tokenizer_store.rs — The transformer tokenizer: load a
//                        pretrained tokenizer.json or train a
//                        WordPiece one, and persist it
//
//   metrics.rs         — Per-epoch metrics CSV
//
//   device.rs          — CPU / GPU selection from the
//                        environment and CLI
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model weights + manifest persistence
pub mod checkpoint;

/// Tokenizer loading, building and saving
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Compute device resolution
pub mod device;
