// ============================================================
// Layer 5 — Tagger (rationale selection policy)
// ============================================================
// embeddings + mask → encoder → per-token scores → z
//
//   Hard: two logits per token. The policy actually sampled from is
//
//           p' = (1 − ε) · softmax(logits) + ε / 2
//
//         with ε the exploration rate. Training draws every token
//         independently from p'; evaluation takes the argmax.
//         neg_log_probs = −log p'(z_t) of the realised sample.
//
//   Soft: one logit per token, padded positions pushed to NEG_INF,
//         z = softmax over the sequence. No log-probabilities.
//
// Hidden states are handed back so the classifiers can reuse them.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation, Distribution},
};

use crate::ml::classifier::NEG_INF;
use crate::ml::config::RationalizerConfig;
use crate::ml::encoder::Encoder;

/// Whether the hard policy samples or takes its argmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Train,
    Eval,
}

#[derive(Module, Debug)]
pub struct Tagger<B: Backend> {
    pub encoder:          Encoder<B>,
    pub scorer:           Linear<B>,
    pub binary:           bool,
    pub exploration_rate: f64,
}

pub struct TaggerOutput<B: Backend> {
    /// [batch, seq_len], {0,1} (hard) or [0,1] (soft)
    pub z:             Tensor<B, 2>,
    /// [batch, seq_len], hard mode only
    pub neg_log_probs: Option<Tensor<B, 2>>,
    /// [batch, seq_len, 2] (hard) or [batch, seq_len, 1] (soft)
    pub z_scores:      Tensor<B, 3>,
    /// [batch, seq_len, hidden_dim]
    pub hiddens:       Tensor<B, 3>,
}

impl RationalizerConfig {
    pub fn init_tagger<B: Backend>(&self, device: &B::Device) -> Tagger<B> {
        let binary = self.rationale_mode.is_binary();
        let z_dim = if binary { 2 } else { 1 };
        Tagger {
            encoder:          self.encoder_config().init(device),
            scorer:           LinearConfig::new(self.hidden_dim, z_dim).init(device),
            binary,
            exploration_rate: self.exploration_rate,
        }
    }
}

impl<B: Backend> Tagger<B> {
    pub fn forward(&self, e: Tensor<B, 3>, m: Tensor<B, 2>, phase: Phase) -> TaggerOutput<B> {
        let hiddens = self.encoder.forward(e, m.clone());
        let z_scores = self.scorer.forward(hiddens.clone());
        if self.binary {
            self.select_hard(z_scores, hiddens, m, phase)
        } else {
            self.select_soft(z_scores, hiddens, m)
        }
    }

    fn select_hard(
        &self,
        z_scores: Tensor<B, 3>,
        hiddens:  Tensor<B, 3>,
        m:        Tensor<B, 2>,
        phase:    Phase,
    ) -> TaggerOutput<B> {
        let [batch, seq_len, _] = z_scores.dims();
        let eps = self.exploration_rate;

        let probs = activation::softmax(z_scores.clone(), 2)
            .mul_scalar(1.0 - eps)
            .add_scalar(eps / 2.0);
        let p_select = probs.clone().slice([0..batch, 0..seq_len, 1..2]).reshape([batch, seq_len]);

        let z = match phase {
            Phase::Train => {
                let u = Tensor::<B, 2>::random(
                    [batch, seq_len],
                    Distribution::Uniform(0.0, 1.0),
                    &p_select.device(),
                );
                u.lower(p_select.detach()).float()
            }
            Phase::Eval => p_select.detach().greater_elem(0.5).float(),
        };
        let z = z * m;

        let log_probs = probs.clamp_min(f32::MIN_POSITIVE).log();
        let log_p1 = log_probs.clone().slice([0..batch, 0..seq_len, 1..2]).reshape([batch, seq_len]);
        let log_p0 = log_probs.slice([0..batch, 0..seq_len, 0..1]).reshape([batch, seq_len]);
        let neg_log_probs = (z.clone() * log_p1 + z.clone().neg().add_scalar(1.0) * log_p0).neg();

        TaggerOutput { z, neg_log_probs: Some(neg_log_probs), z_scores, hiddens }
    }

    fn select_soft(&self, z_scores: Tensor<B, 3>, hiddens: Tensor<B, 3>, m: Tensor<B, 2>) -> TaggerOutput<B> {
        let [batch, seq_len, _] = z_scores.dims();
        let logits = z_scores
            .clone()
            .reshape([batch, seq_len])
            .mask_fill(m.clone().lower_elem(0.5), NEG_INF);
        let z = activation::softmax(logits, 1) * m;
        TaggerOutput { z, neg_log_probs: None, z_scores, hiddens }
    }
}
