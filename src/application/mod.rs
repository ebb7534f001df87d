// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per run mode. Each coordinates the data, ml and
// infra layers; none of them does tensor work or printing
// itself.

/// `train`: dataset → embeddings → training loop → records
pub mod train_use_case;

/// `test`: data pipeline smoke test
pub mod data_check_use_case;

/// `purge`: delete a run's checkpoints
pub mod purge_use_case;
