// ============================================================
// Layer 4 — Rationale Batcher
// ============================================================
// Stacks a slice of SentenceExamples into tensors on one device.
//
//   Input:  N examples of varying length
//   Output: RationaleBatch with [N, S] matrices, S = longest
//           example in the batch (at least 1)
//
// Padding is on the right: token id 0, mask 0, annotation 0.
// An annotation matrix is built when at least one example in the
// batch carries that annotation; examples without it contribute
// a zero row.

use burn::prelude::*;

use crate::data::vocabulary::PAD_ID;
use crate::domain::example::SentenceExample;

// ─── RationaleBatch ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct RationaleBatch<B: Backend> {
    /// [batch, seq_len] token ids
    pub tokens:    Tensor<B, 2, Int>,
    /// [batch] label ids
    pub labels:    Tensor<B, 1, Int>,
    /// [batch, seq_len] 1 = real token, 0 = padding
    pub mask:      Tensor<B, 2>,
    /// [batch, seq_len] human rationale, 0/1
    pub rationale: Option<Tensor<B, 2>>,
    /// [batch, seq_len] importance scores
    pub scores:    Option<Tensor<B, 2>>,
    /// [batch, seq_len] domain knowledge, −1/0/1
    pub knowledge: Option<Tensor<B, 2>>,
}

// ─── RationaleBatcher ─────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct RationaleBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> RationaleBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn batch(&self, items: &[SentenceExample]) -> RationaleBatch<B> {
        let batch_size = items.len();
        let seq_len = items.iter().map(SentenceExample::len).max().unwrap_or(0).max(1);

        let tokens: Vec<i32> = items
            .iter()
            .flat_map(|ex| {
                let pad = seq_len - ex.len();
                ex.token_ids
                    .iter()
                    .map(|&id| id as i32)
                    .chain(std::iter::repeat(PAD_ID as i32).take(pad))
            })
            .collect();
        let mask: Vec<f32> = items
            .iter()
            .flat_map(|ex| (0..seq_len).map(move |t| if t < ex.len() { 1.0 } else { 0.0 }))
            .collect();
        let labels: Vec<i32> = items.iter().map(|ex| ex.label as i32).collect();

        RationaleBatch {
            tokens:    Tensor::<B, 1, Int>::from_ints(tokens.as_slice(), &self.device)
                .reshape([batch_size, seq_len]),
            labels:    Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device),
            mask:      self.matrix(mask, batch_size, seq_len),
            rationale: self.annotation(items, seq_len, |ex| ex.rationale.as_deref()),
            scores:    self.annotation(items, seq_len, |ex| ex.scores.as_deref()),
            knowledge: self.annotation(items, seq_len, |ex| ex.knowledge.as_deref()),
        }
    }

    fn matrix(&self, values: Vec<f32>, batch_size: usize, seq_len: usize) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(values.as_slice(), &self.device).reshape([batch_size, seq_len])
    }

    fn annotation<F>(&self, items: &[SentenceExample], seq_len: usize, field: F) -> Option<Tensor<B, 2>>
    where
        F: Fn(&SentenceExample) -> Option<&[f32]>,
    {
        if !items.iter().any(|ex| field(ex).is_some()) {
            return None;
        }
        let mut values = vec![0.0f32; items.len() * seq_len];
        for (row, ex) in items.iter().enumerate() {
            if let Some(annotation) = field(ex) {
                let n = annotation.len().min(seq_len);
                values[row * seq_len..row * seq_len + n].copy_from_slice(&annotation[..n]);
            }
        }
        Some(self.matrix(values, items.len(), seq_len))
    }
}
