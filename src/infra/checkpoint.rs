// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves the rationalizer's parameters inside a run's working
// directory (`<output_dir>/<data_name>`). Training only writes;
// reading back is kept to the round-trip checks below.
//
//   i_<iteration>.mpk.gz   — named MessagePack + gzip record of
//                            every parameter, full precision
//   latest_iteration.json  — the iteration saved last
//   train_config.json      — the run configuration, needed to
//                            rebuild the model before loading
//
// `purge` removes every snapshot and the latest pointer; the
// config and metric records stay.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::RationalizerModel;

const SNAPSHOT_PREFIX: &str = "i_";
const SNAPSHOT_SUFFIX: &str = ".mpk.gz";
const LATEST_FILE: &str = "latest_iteration.json";
const CONFIG_FILE: &str = "train_config.json";

type SnapshotRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of a snapshot without extension; the recorder appends it.
    fn snapshot_stem(&self, iteration: usize) -> PathBuf {
        self.dir.join(format!("{SNAPSHOT_PREFIX}{iteration}"))
    }

    pub fn save_model<B: Backend>(&self, model: &RationalizerModel<B>, iteration: usize) -> Result<()> {
        let path = self.snapshot_stem(iteration);
        SnapshotRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&iteration)?)
            .with_context(|| format!("Failed to write {LATEST_FILE}"))?;

        tracing::debug!("Saved checkpoint: iteration {}", iteration);
        Ok(())
    }

    /// Restore the latest snapshot into a model of the same architecture.
    #[cfg(test)]
    pub fn load_model<B: Backend>(&self, model: RationalizerModel<B>, device: &B::Device) -> Result<RationalizerModel<B>> {
        let iteration = self.latest_iteration()?;
        let path = self.snapshot_stem(iteration);
        tracing::info!("Loading checkpoint from iteration {}", iteration);

        let record = SnapshotRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    #[cfg(test)]
    pub fn latest_iteration(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Has the model been trained?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    #[cfg(test)]
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Delete every snapshot and the latest pointer. Returns the number
    /// of snapshots removed.
    pub fn purge(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
        {
            let path = entry?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SNAPSHOT_PREFIX) && n.ends_with(SNAPSHOT_SUFFIX));
            if is_snapshot {
                fs::remove_file(&path).with_context(|| format!("Cannot delete '{}'", path.display()))?;
                removed += 1;
            }
        }

        let latest = self.dir.join(LATEST_FILE);
        if latest.exists() {
            fs::remove_file(&latest).with_context(|| format!("Cannot delete '{}'", latest.display()))?;
        }
        tracing::info!("Purged {} checkpoints from '{}'", removed, self.dir.display());
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::EmbeddingMatrix;
    use crate::ml::config::RationalizerConfig;
    use crate::ml::tagger::Phase;

    type TestBackend = burn::backend::NdArray;

    fn embeddings() -> EmbeddingMatrix {
        EmbeddingMatrix::new((0..16).map(|i| i as f32 * 0.05 - 0.4).collect(), 4, 4)
    }

    fn config() -> RationalizerConfig {
        RationalizerConfig::new(2, 4, 6).with_anti_predictor(true)
    }

    #[test]
    fn test_round_trip_reproduces_forward_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let model = config().init::<TestBackend>(&embeddings(), &device).unwrap();
        manager.save_model(&model, 7).unwrap();
        assert_eq!(manager.latest_iteration().unwrap(), 7);

        let fresh = config().init::<TestBackend>(&EmbeddingMatrix::zeros(4, 4), &device).unwrap();
        let restored = manager.load_model(fresh, &device).unwrap();

        let x = Tensor::<TestBackend, 2, Int>::from_ints([[1, 3, 3, 2, 2], [2, 1, 3, 0, 0]], &device);
        let m = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 0.0, 0.0]], &device);
        let a = model.forward(x.clone(), m.clone(), Phase::Eval);
        let b = restored.forward(x, m, Phase::Eval);

        let diff: f32 = (a.predict - b.predict).abs().max().into_scalar().elem();
        assert_eq!(diff, 0.0);
        let diff: f32 = (a.z - b.z).abs().max().into_scalar().elem();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn test_purge_removes_snapshots_only() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let model = config().init::<TestBackend>(&embeddings(), &device).unwrap();

        manager.save_model(&model, 0).unwrap();
        manager.save_model(&model, 100).unwrap();
        manager.save_config(&TrainConfig::default()).unwrap();

        assert_eq!(manager.purge().unwrap(), 2);
        assert!(manager.latest_iteration().is_err());
        assert!(manager.load_config().is_ok());
        assert_eq!(manager.purge().unwrap(), 0);
    }

    #[test]
    fn test_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path()).unwrap();
        let cfg = TrainConfig { batch_size: 3, data_name: "hotel".into(), ..TrainConfig::default() };
        manager.save_config(&cfg).unwrap();
        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.batch_size, 3);
        assert_eq!(loaded.data_name, "hotel");
    }
}
