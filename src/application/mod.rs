// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one workflow: train, cross-evaluate, sweep or predict.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Steps shared by every workflow + backend dispatch
pub mod pipeline;

// Train one model on one dataset
pub mod train_use_case;

// Train on one dataset, evaluate on another
pub mod cross_eval_use_case;

// Grid search over training hyperparameters
pub mod sweep_use_case;

// Label raw texts with a saved model
pub mod predict_use_case;
