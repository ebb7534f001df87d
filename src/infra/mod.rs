// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the application and the
// training loop:
//
//   checkpoint.rs — model snapshots per iteration (burn named
//                   MessagePack recorder), the run config as
//                   JSON, and purge
//
//   metrics.rs    — per-evaluation CSV rows and the end-of-run
//                   metric records

/// Model checkpoint saving, loading and purging
pub mod checkpoint;

/// Metric CSV logger and JSON records
pub mod metrics;
