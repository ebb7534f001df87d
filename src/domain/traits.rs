// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training core only ever sees these two seams:
//
//   BatchSource       — hands out fully materialised batches
//   EmbeddingProvider — hands out the vocab × dim matrix that
//                       seeds the embedding table
//
// SentenceClassification (data layer) implements both for the
// JSON-lines datasets; tests implement them in memory.

use anyhow::Result;
use crate::domain::example::{SentenceExample, Split};

// ─── EmbeddingMatrix ──────────────────────────────────────────────────────────
/// Row-major `vocab_size × dim` matrix of pretrained vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub data:       Vec<f32>,
    pub vocab_size: usize,
    pub dim:        usize,
}

impl EmbeddingMatrix {
    pub fn new(data: Vec<f32>, vocab_size: usize, dim: usize) -> Self {
        debug_assert_eq!(data.len(), vocab_size * dim);
        Self { data, vocab_size, dim }
    }

    /// All-zero matrix, used to build a model that is about to
    /// receive weights from a checkpoint.
    #[cfg(test)]
    pub fn zeros(vocab_size: usize, dim: usize) -> Self {
        Self { data: vec![0.0; vocab_size * dim], vocab_size, dim }
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }
}

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// Anything that can feed the training loop and the evaluator.
pub trait BatchSource {
    /// Sample a random training batch. `sort` orders the batch by
    /// length (longest first); it never changes which examples are drawn.
    fn get_train_batch(&mut self, batch_size: usize, sort: bool) -> Vec<SentenceExample>;

    /// Full ordered pass over a split, chunked into batches.
    fn eval_batches(&self, split: Split, batch_size: usize) -> Vec<Vec<SentenceExample>>;

    /// Human readable label name for a label index
    fn label_name(&self, label: usize) -> &str;

    /// Render a token sequence with the selected rationale highlighted
    fn render_rationale(&self, token_ids: &[u32], z: &[f32]) -> String;
}

// ─── EmbeddingProvider ────────────────────────────────────────────────────────
pub trait EmbeddingProvider {
    fn embedding_matrix(&self, dim: usize) -> Result<EmbeddingMatrix>;
}
