// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of the system: labelled examples, label maps, metrics.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Everything here can be unit tested without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A single labelled text row (raw + normalised)
pub mod example;

// Label string <-> class index mapping and the cross-eval filter
pub mod label_map;

// Loss / accuracy / precision / recall / F1 for one split
pub mod metrics;

// Core abstractions (traits) that other layers implement
pub mod traits;
