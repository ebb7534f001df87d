// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits shared by every other layer:
// what a labelled sentence is, what can go wrong, and the
// narrow interfaces the training core talks through.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits

/// A tokenised, labelled sentence with optional guidance annotations
pub mod example;

/// Typed errors for configuration, shape and data contracts
pub mod error;

/// Batch source and embedding provider abstractions
pub mod traits;
