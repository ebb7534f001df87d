// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// `train`, `test` and `purge` share the run arguments (where the
// data and outputs live); `train` adds the model and training
// flags.

use clap::{ArgAction, Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::config::{CellType, ModelType, RationaleMode};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the rationalizer on a dataset
    Train(TrainArgs),

    /// Load a dataset and decode a sample batch
    Test(RunArgs),

    /// Delete every checkpoint of a run
    Purge(RunArgs),
}

/// Where a run reads its data and writes its outputs.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Data folder; datasets live in <data_dir>/<data_name>
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Output folder; a run writes to <output_dir>/<data_name>
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Dataset name
    #[arg(long, default_value = "beer_reviews")]
    pub data_name: String,

    /// Random seed for batch sampling, embedding init and the tagger
    #[arg(long, default_value_t = 0)]
    pub random_seed: u64,

    /// Minimum frequency for a word to enter the vocabulary
    #[arg(long, default_value_t = 1)]
    pub freq_threshold: usize,

    /// Maximum number of tokens kept per sentence
    #[arg(long, default_value_t = 300)]
    pub truncate_num: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Embedding name; vectors are read from
    /// <data_dir>/<name>/<name>.6B.<embedding_dim>d.txt
    #[arg(long, default_value = "glove")]
    pub embedding_name: String,

    // ── Model ────────────────────────────────────────────────────────────────
    /// Encoder type: RNN, CNN or TRM
    #[arg(long, default_value = "RNN")]
    pub model_type: ModelType,

    /// Recurrent cell: GRU or LSTM
    #[arg(long, default_value = "GRU")]
    pub cell_type: CellType,

    #[arg(long, default_value_t = 400)]
    pub hidden_dim: usize,

    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Also train the embedding table
    #[arg(long, default_value_t = false)]
    pub fine_tuning: bool,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 1)]
    pub layer_num: usize,

    /// Convolution width for CNN, must be odd
    #[arg(long, default_value_t = 5)]
    pub kernel_size: usize,

    /// Attention heads for TRM, must divide hidden_dim
    #[arg(long, default_value_t = 4)]
    pub head_num: usize,

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Binary (sampled) rationales; false selects soft attention
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub binary: bool,

    /// Use a rationale tagger; without one the classifier sees every token
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub rationale_tagger: bool,

    /// Probability mass spread uniformly over both choices when sampling
    #[arg(long, default_value_t = 0.05)]
    pub exploration_rate: f64,

    // ── Losses ───────────────────────────────────────────────────────────────
    /// Train an anti-classifier on the unselected tokens
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub anti_predictor: bool,

    #[arg(long, default_value_t = 1.0)]
    pub lambda_anti: f64,

    /// Reward selecting tokens whose importance score reaches threshold_s
    #[arg(long, default_value_t = false)]
    pub importance_score: bool,

    #[arg(long, default_value_t = 1.0)]
    pub lambda_s: f64,

    #[arg(long)]
    pub threshold_s: Option<f64>,

    /// Reward selecting tokens marked by domain knowledge
    #[arg(long, default_value_t = false)]
    pub domain_knowledge: bool,

    #[arg(long, default_value_t = 1.0)]
    pub lambda_d: f64,

    /// Penalise rationales away from the target length and span count
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub rationale_regulation: bool,

    #[arg(long, default_value_t = 1.0)]
    pub lambda_sparsity: f64,

    #[arg(long, default_value_t = 1.0)]
    pub lambda_continuity: f64,

    /// Suggested number of selected tokens
    #[arg(long, default_value_t = 8)]
    pub rationale_len: usize,

    /// Suggested number of selected spans
    #[arg(long, default_value_t = 4)]
    pub rationale_num: usize,

    // ── Training ─────────────────────────────────────────────────────────────
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    #[arg(long, default_value_t = 2000)]
    pub num_iteration: usize,

    /// Log losses and a sample rationale every N iterations, 0 disables
    #[arg(long, default_value_t = 100)]
    pub display_iteration: usize,

    /// Evaluate and checkpoint every N iterations, 0 disables
    #[arg(long, default_value_t = 100)]
    pub eval_iteration: usize,
}

impl From<RunArgs> for TrainConfig {
    fn from(a: RunArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            output_dir:     a.output_dir,
            data_name:      a.data_name,
            random_seed:    a.random_seed,
            freq_threshold: a.freq_threshold,
            truncate_num:   a.truncate_num,
            ..TrainConfig::default()
        }
    }
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            embedding_name:       a.embedding_name,
            model_type:           a.model_type,
            cell_type:            a.cell_type,
            hidden_dim:           a.hidden_dim,
            embedding_dim:        a.embedding_dim,
            fine_tuning:          a.fine_tuning,
            layer_num:            a.layer_num,
            kernel_size:          a.kernel_size,
            head_num:             a.head_num,
            dropout:              a.dropout,
            rationale_mode:       RationaleMode::from_binary(a.binary),
            rationale_tagger:     a.rationale_tagger,
            exploration_rate:     a.exploration_rate,
            anti_predictor:       a.anti_predictor,
            lambda_anti:          a.lambda_anti,
            importance_score:     a.importance_score,
            lambda_s:             a.lambda_s,
            threshold_s:          a.threshold_s,
            domain_knowledge:     a.domain_knowledge,
            lambda_d:             a.lambda_d,
            rationale_regulation: a.rationale_regulation,
            lambda_sparsity:      a.lambda_sparsity,
            lambda_continuity:    a.lambda_continuity,
            rationale_len:        a.rationale_len,
            rationale_num:        a.rationale_num,
            batch_size:           a.batch_size,
            lr:                   a.lr,
            num_iteration:        a.num_iteration,
            display_iteration:    a.display_iteration,
            eval_iteration:       a.eval_iteration,
            ..TrainConfig::from(a.run)
        }
    }
}
