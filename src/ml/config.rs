// ============================================================
// Layer 5 — Model Configuration
// ============================================================
// Every hyperparameter the three players need, in one burn
// `Config` so it serialises next to the checkpoints.
//
// Feature toggles follow one rule: a disabled feature has all
// of its weights collapsed to zero (see `loss_weights`), so the
// reward arithmetic never branches on the toggles themselves.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::error::RationaleError;

/// Learning rate of the tagger relative to the classifier.
pub const TAGGER_LR_SCALE: f64 = 0.1;

// ─── Encoder selection ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    Recurrent,
    Convolutional,
    Attention,
}

impl FromStr for ModelType {
    type Err = RationaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RNN" => Ok(Self::Recurrent),
            "CNN" => Ok(Self::Convolutional),
            "TRM" => Ok(Self::Attention),
            _     => Err(RationaleError::UnknownModelType(s.to_string())),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recurrent     => "RNN",
            Self::Convolutional => "CNN",
            Self::Attention     => "TRM",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    Gru,
    Lstm,
}

impl FromStr for CellType {
    type Err = RationaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GRU"  => Ok(Self::Gru),
            "LSTM" => Ok(Self::Lstm),
            _      => Err(RationaleError::UnknownCellType(s.to_string())),
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gru  => "GRU",
            Self::Lstm => "LSTM",
        })
    }
}

/// Hard rationales are sampled binary masks trained with REINFORCE,
/// soft rationales are attention weights trained by backprop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RationaleMode {
    Hard,
    Soft,
}

impl RationaleMode {
    pub fn from_binary(binary: bool) -> Self {
        if binary { Self::Hard } else { Self::Soft }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Hard)
    }
}

// ─── RationalizerConfig ───────────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct RationalizerConfig {
    pub num_labels:    usize,
    pub embedding_dim: usize,
    pub hidden_dim:    usize,

    #[config(default = "ModelType::Recurrent")]
    pub model_type: ModelType,
    #[config(default = "CellType::Gru")]
    pub cell_type:  CellType,
    #[config(default = 1)]
    pub layer_num:   usize,
    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub head_num:    usize,
    #[config(default = 0.0)]
    pub dropout:     f64,

    #[config(default = "RationaleMode::Hard")]
    pub rationale_mode:   RationaleMode,
    #[config(default = true)]
    pub rationale_tagger: bool,
    #[config(default = false)]
    pub fine_tuning:      bool,
    #[config(default = 0.05)]
    pub exploration_rate: f64,
    #[config(default = 0.001)]
    pub learning_rate:    f64,

    #[config(default = false)]
    pub anti_predictor: bool,
    #[config(default = 1.0)]
    pub lambda_anti:    f64,

    #[config(default = false)]
    pub importance_score: bool,
    #[config(default = 1.0)]
    pub lambda_s:         f64,
    pub threshold_s:      Option<f64>,

    #[config(default = false)]
    pub domain_knowledge: bool,
    #[config(default = 1.0)]
    pub lambda_d:         f64,

    #[config(default = false)]
    pub rationale_regulation: bool,
    #[config(default = 1.0)]
    pub lambda_sparsity:      f64,
    #[config(default = 1.0)]
    pub lambda_continuity:    f64,
    #[config(default = 8)]
    pub rationale_len:        usize,
    #[config(default = 4)]
    pub rationale_num:        usize,
}

/// Effective reward/penalty weights after feature toggles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossWeights {
    pub anti:          f64,
    pub importance:    f64,
    pub threshold_s:   f64,
    pub knowledge:     f64,
    pub sparsity:      f64,
    pub continuity:    f64,
    pub rationale_len: f64,
    pub rationale_num: f64,
}

impl RationalizerConfig {
    /// Reject inconsistent combinations before any parameter is allocated.
    pub fn validate(&self) -> Result<(), RationaleError> {
        let invalid = |msg: String| Err(RationaleError::InvalidConfig(msg));

        if self.num_labels == 0 || self.embedding_dim == 0 || self.hidden_dim == 0 {
            return invalid(format!(
                "num_labels ({}), embedding_dim ({}) and hidden_dim ({}) must be positive",
                self.num_labels, self.embedding_dim, self.hidden_dim
            ));
        }
        if self.layer_num == 0 {
            return invalid("layer_num must be at least 1".into());
        }
        if self.model_type == ModelType::Convolutional && self.kernel_size % 2 == 0 {
            return invalid(format!("kernel_size must be odd, got {}", self.kernel_size));
        }
        if self.model_type == ModelType::Attention
            && (self.head_num == 0 || self.hidden_dim % self.head_num != 0)
        {
            return invalid(format!(
                "hidden_dim ({}) must be divisible by head_num ({})",
                self.hidden_dim, self.head_num
            ));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return invalid(format!("exploration_rate must lie in [0, 1], got {}", self.exploration_rate));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout must lie in [0, 1), got {}", self.dropout));
        }
        if self.learning_rate <= 0.0 {
            return invalid(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if self.importance_score && self.threshold_s.is_none() {
            return invalid("importance_score guidance needs threshold_s".into());
        }
        Ok(())
    }

    pub fn loss_weights(&self) -> LossWeights {
        let on = |flag: bool, value: f64| if flag { value } else { 0.0 };
        LossWeights {
            anti:          on(self.anti_predictor, self.lambda_anti),
            importance:    on(self.importance_score, self.lambda_s),
            threshold_s:   on(self.importance_score, self.threshold_s.unwrap_or(0.0)),
            knowledge:     on(self.domain_knowledge, self.lambda_d),
            sparsity:      on(self.rationale_regulation, self.lambda_sparsity),
            continuity:    on(self.rationale_regulation, self.lambda_continuity),
            rationale_len: on(self.rationale_regulation, self.rationale_len as f64),
            rationale_num: on(self.rationale_regulation, self.rationale_num as f64),
        }
    }

    pub fn tagger_learning_rate(&self) -> f64 {
        match self.rationale_mode {
            RationaleMode::Hard => self.learning_rate * TAGGER_LR_SCALE,
            RationaleMode::Soft => self.learning_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RationalizerConfig {
        RationalizerConfig::new(2, 4, 6)
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!("rnn".parse::<ModelType>().unwrap(), ModelType::Recurrent);
        assert_eq!("CNN".parse::<ModelType>().unwrap(), ModelType::Convolutional);
        assert_eq!("TRM".parse::<ModelType>().unwrap(), ModelType::Attention);
        let err = "MLP".parse::<ModelType>().unwrap_err();
        assert!(matches!(err, RationaleError::UnknownModelType(s) if s == "MLP"));
    }

    #[test]
    fn test_cell_type_parsing() {
        assert_eq!("lstm".parse::<CellType>().unwrap(), CellType::Lstm);
        assert!("RNN".parse::<CellType>().is_err());
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_importance_without_threshold_rejected() {
        let cfg = base().with_importance_score(true);
        assert!(matches!(cfg.validate(), Err(RationaleError::InvalidConfig(_))));
        let cfg = cfg.with_threshold_s(Some(0.1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_attention_head_divisibility() {
        let cfg = base().with_model_type(ModelType::Attention).with_head_num(4);
        assert!(cfg.validate().is_err());
        let cfg = base().with_model_type(ModelType::Attention).with_head_num(3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_even_kernel_rejected() {
        let cfg = base().with_model_type(ModelType::Convolutional).with_kernel_size(4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_disabled_features_zero_their_weights() {
        let w = base().with_lambda_anti(3.0).loss_weights();
        assert_eq!(w.anti, 0.0);
        assert_eq!(w.sparsity, 0.0);
        assert_eq!(w.rationale_num, 0.0);

        let w = base()
            .with_anti_predictor(true)
            .with_lambda_anti(3.0)
            .with_rationale_regulation(true)
            .loss_weights();
        assert_eq!(w.anti, 3.0);
        assert_eq!(w.rationale_len, 8.0);
        assert_eq!(w.rationale_num, 4.0);
    }

    #[test]
    fn test_tagger_learning_rate_scale() {
        let cfg = base().with_learning_rate(0.01);
        assert!((cfg.tagger_learning_rate() - 0.001).abs() < 1e-12);
        let cfg = cfg.with_rationale_mode(RationaleMode::Soft);
        assert!((cfg.tagger_learning_rate() - 0.01).abs() < 1e-12);
    }
}
