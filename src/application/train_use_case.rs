// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load and encode the dataset   (Layer 4 - data)
//   Step 2: Build the embedding matrix    (Layer 4 - data)
//   Step 3: Derive + validate model config (Layer 5 - ml)
//   Step 4: Save the run config           (Layer 6 - infra)
//   Step 5: Run the training loop         (Layer 5 - ml)
//   Step 6: Save the metric records       (Layer 6 - infra)
//
// Every file of a run lives in `<output_dir>/<data_name>/`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{dataset::SentenceClassification, embeddings::GloveEmbeddings};
use crate::domain::traits::EmbeddingProvider;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::config::{CellType, ModelType, RationaleMode, RationalizerConfig};
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved next to the checkpoints so the
// exact model can be rebuilt later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // environment
    pub data_dir:       String,
    pub output_dir:     String,
    pub random_seed:    u64,

    // data
    pub data_name:      String,
    pub embedding_name: String,
    pub freq_threshold: usize,
    pub truncate_num:   usize,

    // model
    pub model_type:       ModelType,
    pub cell_type:        CellType,
    pub hidden_dim:       usize,
    pub embedding_dim:    usize,
    pub fine_tuning:      bool,
    pub layer_num:        usize,
    pub kernel_size:      usize,
    pub head_num:         usize,
    pub dropout:          f64,
    pub rationale_mode:   RationaleMode,
    pub rationale_tagger: bool,
    pub exploration_rate: f64,

    // losses
    pub anti_predictor:       bool,
    pub lambda_anti:          f64,
    pub importance_score:     bool,
    pub lambda_s:             f64,
    pub threshold_s:          Option<f64>,
    pub domain_knowledge:     bool,
    pub lambda_d:             f64,
    pub rationale_regulation: bool,
    pub lambda_sparsity:      f64,
    pub lambda_continuity:    f64,
    pub rationale_len:        usize,
    pub rationale_num:        usize,

    // training
    pub batch_size:        usize,
    pub lr:                f64,
    pub num_iteration:     usize,
    pub display_iteration: usize,
    pub eval_iteration:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data".to_string(),
            output_dir:     "output".to_string(),
            random_seed:    0,

            data_name:      "beer_reviews".to_string(),
            embedding_name: "glove".to_string(),
            freq_threshold: 1,
            truncate_num:   300,

            model_type:       ModelType::Recurrent,
            cell_type:        CellType::Gru,
            hidden_dim:       400,
            embedding_dim:    100,
            fine_tuning:      false,
            layer_num:        1,
            kernel_size:      5,
            head_num:         4,
            dropout:          0.0,
            rationale_mode:   RationaleMode::Hard,
            rationale_tagger: true,
            exploration_rate: 0.05,

            anti_predictor:       true,
            lambda_anti:          1.0,
            importance_score:     false,
            lambda_s:             1.0,
            threshold_s:          None,
            domain_knowledge:     false,
            lambda_d:             1.0,
            rationale_regulation: true,
            lambda_sparsity:      1.0,
            lambda_continuity:    1.0,
            rationale_len:        8,
            rationale_num:        4,

            batch_size:        64,
            lr:                0.001,
            num_iteration:     2000,
            display_iteration: 100,
            eval_iteration:    100,
        }
    }
}

impl TrainConfig {
    /// `<output_dir>/<data_name>`: checkpoints, config and records
    pub fn working_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir).join(&self.data_name)
    }

    /// `<data_dir>/<data_name>`: the split files
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.data_name)
    }

    /// `<data_dir>/<name>/<name>.6B.<dim>d.txt`
    pub fn embedding_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join(&self.embedding_name)
            .join(format!("{}.6B.{}d.txt", self.embedding_name, self.embedding_dim))
    }

    pub fn model_config(&self, num_labels: usize) -> RationalizerConfig {
        RationalizerConfig::new(num_labels, self.embedding_dim, self.hidden_dim)
            .with_model_type(self.model_type)
            .with_cell_type(self.cell_type)
            .with_layer_num(self.layer_num)
            .with_kernel_size(self.kernel_size)
            .with_head_num(self.head_num)
            .with_dropout(self.dropout)
            .with_rationale_mode(self.rationale_mode)
            .with_rationale_tagger(self.rationale_tagger)
            .with_fine_tuning(self.fine_tuning)
            .with_exploration_rate(self.exploration_rate)
            .with_learning_rate(self.lr)
            .with_anti_predictor(self.anti_predictor)
            .with_lambda_anti(self.lambda_anti)
            .with_importance_score(self.importance_score)
            .with_lambda_s(self.lambda_s)
            .with_threshold_s(self.threshold_s)
            .with_domain_knowledge(self.domain_knowledge)
            .with_lambda_d(self.lambda_d)
            .with_rationale_regulation(self.rationale_regulation)
            .with_lambda_sparsity(self.lambda_sparsity)
            .with_lambda_continuity(self.lambda_continuity)
            .with_rationale_len(self.rationale_len)
            .with_rationale_num(self.rationale_num)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Dataset ───────────────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.data_path().display());
        let mut data = SentenceClassification::load(
            &cfg.data_path(),
            cfg.freq_threshold,
            cfg.truncate_num,
            cfg.random_seed,
        )?;

        // ── Step 2: Embeddings ────────────────────────────────────────────────
        let embeddings = GloveEmbeddings::new(cfg.embedding_path(), &data.vocab, cfg.random_seed)
            .embedding_matrix(cfg.embedding_dim)?;
        tracing::info!("Embeddings: {} × {}", embeddings.vocab_size, embeddings.dim);

        // ── Step 3: Model configuration ───────────────────────────────────────
        let model_cfg = cfg.model_config(data.num_labels());
        model_cfg.validate().context("Invalid model configuration")?;

        // ── Step 4: Run directory + config ────────────────────────────────────
        let working_dir = cfg.working_dir();
        let checkpoint = CheckpointManager::new(&working_dir)?;
        checkpoint.save_config(cfg)?;
        let logger = MetricsLogger::new(&working_dir)?;

        // ── Step 5: Training loop ─────────────────────────────────────────────
        let records = run_training(cfg, model_cfg, &embeddings, &mut data, &checkpoint, &logger)?;

        // ── Step 6: Records ───────────────────────────────────────────────────
        logger.save_records(&records)?;
        Ok(())
    }
}
