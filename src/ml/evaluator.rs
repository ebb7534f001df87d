// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Batch-level rationale metrics and the full-pass evaluation of
// a split.
//
//   accuracy      — fraction of correct classifier predictions
//   anti_accuracy — same for the anti-classifier, 0 without one
//   sparsity      — Σ z·m / Σ m   (share of tokens selected)
//   continuity    — transitions(z·m) / Σ m
//
// Evaluation runs on the inner (non-autodiff) backend with the
// tagger in argmax mode, and averages the batch metrics.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::data::batcher::RationaleBatcher;
use crate::domain::example::Split;
use crate::domain::traits::BatchSource;
use crate::ml::model::RationalizerModel;
use crate::ml::reward::transition_count;
use crate::ml::tagger::Phase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub accuracy:      f64,
    pub anti_accuracy: f64,
    pub sparsity:      f64,
    pub continuity:    f64,
}

impl BatchMetrics {
    pub fn compute<B: Backend>(
        predict:      Tensor<B, 2>,
        anti_predict: Option<Tensor<B, 2>>,
        z:            Tensor<B, 2>,
        y:            Tensor<B, 1, Int>,
        m:            Tensor<B, 2>,
    ) -> Self {
        Self {
            accuracy:      batch_accuracy(predict, y.clone()),
            anti_accuracy: anti_predict.map_or(0.0, |p| batch_accuracy(p, y)),
            sparsity:      batch_sparsity(z.clone(), m.clone()),
            continuity:    batch_continuity(z, m),
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            accuracy:      self.accuracy * factor,
            anti_accuracy: self.anti_accuracy * factor,
            sparsity:      self.sparsity * factor,
            continuity:    self.continuity * factor,
        }
    }
}

impl AddAssign for BatchMetrics {
    fn add_assign(&mut self, other: Self) {
        self.accuracy      += other.accuracy;
        self.anti_accuracy += other.anti_accuracy;
        self.sparsity      += other.sparsity;
        self.continuity    += other.continuity;
    }
}

pub fn batch_accuracy<B: Backend>(predict: Tensor<B, 2>, y: Tensor<B, 1, Int>) -> f64 {
    let [batch, _] = predict.dims();
    if batch == 0 {
        return 0.0;
    }
    let correct: f64 = predict.argmax(1).reshape([batch]).equal(y).float().sum().into_scalar().elem();
    correct / batch as f64
}

pub fn batch_sparsity<B: Backend>(z: Tensor<B, 2>, m: Tensor<B, 2>) -> f64 {
    let selected: f64 = (z * m.clone()).sum().into_scalar().elem();
    let tokens: f64 = m.sum().into_scalar().elem();
    if tokens > 0.0 { selected / tokens } else { 0.0 }
}

pub fn batch_continuity<B: Backend>(z: Tensor<B, 2>, m: Tensor<B, 2>) -> f64 {
    let transitions: f64 = transition_count(z * m.clone()).sum().into_scalar().elem();
    let tokens: f64 = m.sum().into_scalar().elem();
    if tokens > 0.0 { transitions / tokens } else { 0.0 }
}

/// Full ordered pass over a split with deterministic rationales.
pub fn evaluate<B: Backend, S: BatchSource + ?Sized>(
    model:      &RationalizerModel<B>,
    source:     &S,
    split:      Split,
    batch_size: usize,
    device:     &B::Device,
) -> BatchMetrics {
    let batcher = RationaleBatcher::<B>::new(device.clone());
    let batches = source.eval_batches(split, batch_size);
    if batches.is_empty() {
        tracing::warn!("No {split} examples to evaluate");
        return BatchMetrics::default();
    }

    let mut total = BatchMetrics::default();
    for examples in &batches {
        let batch = batcher.batch(examples);
        let out = model.forward(batch.tokens, batch.mask.clone(), Phase::Eval);
        total += BatchMetrics::compute(out.predict, out.anti_predict, out.z, batch.labels, batch.mask);
    }
    total.scale(1.0 / batches.len() as f64)
}
