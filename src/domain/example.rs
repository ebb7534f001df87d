// ============================================================
// Layer 3 — SentenceExample Domain Type
// ============================================================
// One sentence after vocabulary lookup. Token ids index the
// embedding table; the optional per-token annotations line up
// one-to-one with `token_ids`:
//
//   rationale — 0/1 human rationale annotation
//   scores    — importance score of each token
//   knowledge — domain knowledge, -1 / 0 / 1 per token
//
// Annotations are stored as f32 so the batcher can copy them
// straight into float tensors.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceExample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
    pub rationale: Option<Vec<f32>>,
    pub scores:    Option<Vec<f32>>,
    pub knowledge: Option<Vec<f32>>,
}

impl SentenceExample {
    #[cfg(test)]
    pub fn new(token_ids: Vec<u32>, label: usize) -> Self {
        Self { token_ids, label, rationale: None, scores: None, knowledge: None }
    }

    pub fn len(&self) -> usize {
        self.token_ids.len()
    }
}

/// The three dataset splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Dev, Split::Test];

    /// File stem of the split inside a dataset directory
    pub fn file_stem(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev   => "dev",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}
