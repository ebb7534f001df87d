// ============================================================
// Layer 5 — Losses, Rewards and the Reward Baseline
// ============================================================
// Pure tensor functions used by the orchestrator, plus the
// bounded reward history that provides the REINFORCE baseline.
//
//   classifier_loss     — mean CE + per-example 0/1 correctness
//   regularization_loss — continuity and sparsity penalties
//   guidance_reward     — mean_t(z · reference)
//   tagger_loss         — Σ neg_log_probs · advantage · m
//
// Shapes: z, m, s, d are [batch, seq_len]; per-example values
// are [batch].

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};
use std::collections::VecDeque;

/// Number of batch-mean rewards kept for the moving baseline.
pub const REWARD_HISTORY_CAPACITY: usize = 200;

// ─── RewardHistory ────────────────────────────────────────────────────────────
/// FIFO of the most recent batch-mean rewards. Starts with a single
/// `0.0` and never shrinks below one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardHistory {
    rewards:  VecDeque<f64>,
    capacity: usize,
}

impl Default for RewardHistory {
    fn default() -> Self {
        Self::new(REWARD_HISTORY_CAPACITY)
    }
}

impl RewardHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut rewards = VecDeque::with_capacity(capacity);
        rewards.push_back(0.0);
        Self { rewards, capacity }
    }

    /// Return the mean of the rewards seen so far, then append this
    /// batch's reward, evicting the oldest entry at capacity.
    pub fn mean_then_push(&mut self, reward: f64) -> f64 {
        let baseline = self.mean();
        if self.rewards.len() == self.capacity {
            self.rewards.pop_front();
        }
        self.rewards.push_back(reward);
        baseline
    }

    pub fn mean(&self) -> f64 {
        self.rewards.iter().sum::<f64>() / self.rewards.len() as f64
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[cfg(test)]
    pub fn oldest(&self) -> Option<f64> {
        self.rewards.front().copied()
    }
}

// ─── Classification ───────────────────────────────────────────────────────────
/// predict: [batch, num_labels], y: [batch]
/// → (mean cross-entropy [1], correctness [batch] of 0/1, no gradient)
pub fn classifier_loss<B: Backend>(predict: Tensor<B, 2>, y: Tensor<B, 1, Int>) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let [batch, _] = predict.dims();
    let loss = CrossEntropyLossConfig::new()
        .init(&predict.device())
        .forward(predict.clone(), y.clone());
    let reward = predict.argmax(1).reshape([batch]).equal(y).float();
    (loss, reward)
}

// ─── Regularization ───────────────────────────────────────────────────────────
/// Number of value changes along each row, comparing every position
/// with its right neighbour and the last position with itself.
/// → [batch]
pub fn transition_count<B: Backend>(mask_z: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, seq_len] = mask_z.dims();
    if seq_len < 2 {
        return Tensor::zeros([batch], &mask_z.device());
    }
    let shifted = Tensor::cat(
        vec![
            mask_z.clone().slice([0..batch, 1..seq_len]),
            mask_z.clone().slice([0..batch, seq_len - 1..seq_len]),
        ],
        1,
    );
    (mask_z - shifted).abs().sum_dim(1).reshape([batch])
}

/// Real sequence lengths, clamped to at least one token. → [batch]
pub fn sequence_lengths<B: Backend>(m: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = m.dims();
    m.sum_dim(1).clamp_min(1.0).reshape([batch])
}

/// → (continuity loss [batch], sparsity loss [batch])
///
/// continuity = |transitions / len − 2 · rationale_num / len|
/// sparsity   = |Σ z·m / len − rationale_len / len|
pub fn regularization_loss<B: Backend>(
    z:             Tensor<B, 2>,
    m:             Tensor<B, 2>,
    rationale_len: f64,
    rationale_num: f64,
) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let [batch, _] = z.dims();
    let device = z.device();
    let mask_z = z * m.clone();
    let seq_lens = sequence_lengths(m);

    let ratio_continuity = transition_count(mask_z.clone()) / seq_lens.clone();
    let recommend_continuity = Tensor::<B, 1>::full([batch], 2.0 * rationale_num, &device) / seq_lens.clone();
    let loss_continuity = (ratio_continuity - recommend_continuity).abs();

    let ratio_sparsity = mask_z.sum_dim(1).reshape([batch]) / seq_lens.clone();
    let recommend_sparsity = Tensor::<B, 1>::full([batch], rationale_len, &device) / seq_lens;
    let loss_sparsity = (ratio_sparsity - recommend_sparsity).abs();

    (loss_continuity, loss_sparsity)
}

// ─── Guidance ─────────────────────────────────────────────────────────────────
/// 1 where the importance score reaches the threshold, else 0.
pub fn binarize_scores<B: Backend>(s: Tensor<B, 2>, threshold: f64) -> Tensor<B, 2> {
    s.greater_equal_elem(threshold).float()
}

/// Both positive and negative domain knowledge count as relevant.
pub fn knowledge_relevance<B: Backend>(d: Tensor<B, 2>) -> Tensor<B, 2> {
    d.abs()
}

/// mean_t(z · reference) → [batch]
pub fn guidance_reward<B: Backend>(z: Tensor<B, 2>, reference: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = z.dims();
    (z * reference).mean_dim(1).reshape([batch])
}

// ─── REINFORCE ────────────────────────────────────────────────────────────────
/// Σ_{b,t} neg_log_probs · advantage_b · m, unnormalised. → [1]
pub fn tagger_loss<B: Backend>(
    neg_log_probs: Tensor<B, 2>,
    advantages:    Tensor<B, 1>,
    m:             Tensor<B, 2>,
) -> Tensor<B, 1> {
    (neg_log_probs * advantages.detach().unsqueeze_dim::<2>(1) * m).sum()
}
