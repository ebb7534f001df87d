// ============================================================
// Layer 2 — PurgeUseCase
// ============================================================
// Deletes every checkpoint of a run. The run config and the
// metric records are left in place.

use anyhow::Result;

use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::CheckpointManager;

pub struct PurgeUseCase {
    config: TrainConfig,
}

impl PurgeUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Returns the number of checkpoints removed.
    pub fn execute(&self) -> Result<usize> {
        let working_dir = self.config.working_dir();
        if !working_dir.exists() {
            tracing::warn!("Nothing to purge: '{}' does not exist", working_dir.display());
            return Ok(0);
        }
        CheckpointManager::new(working_dir)?.purge()
    }
}
