// ============================================================
// Layer 4 — Pretrained Word Embeddings
// ============================================================
// Builds the vocab × dim matrix that seeds the embedding table
// from a GloVe-style text file, one word per line:
//
//   the 0.418 0.24968 -0.41242 ...
//
//   <pad>          → zeros
//   word in file   → its vector
//   anything else  → uniform in [−0.1, 0.1], seeded
//
// A missing file is not fatal: every row falls back to random
// initialisation and a warning is logged.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::data::vocabulary::{Vocabulary, PAD_ID};
use crate::domain::traits::{EmbeddingMatrix, EmbeddingProvider};

/// Half-width of the uniform initialisation for unseen words.
pub const INIT_RANGE: f32 = 0.1;

pub struct GloveEmbeddings<'a> {
    path:  PathBuf,
    vocab: &'a Vocabulary,
    seed:  u64,
}

impl<'a> GloveEmbeddings<'a> {
    pub fn new(path: impl Into<PathBuf>, vocab: &'a Vocabulary, seed: u64) -> Self {
        Self { path: path.into(), vocab, seed }
    }

    fn random_matrix(&self, dim: usize) -> EmbeddingMatrix {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut data: Vec<f32> = (0..self.vocab.len() * dim)
            .map(|_| rng.gen_range(-INIT_RANGE..=INIT_RANGE))
            .collect();
        let pad = PAD_ID as usize * dim;
        data[pad..pad + dim].fill(0.0);
        EmbeddingMatrix::new(data, self.vocab.len(), dim)
    }
}

impl EmbeddingProvider for GloveEmbeddings<'_> {
    fn embedding_matrix(&self, dim: usize) -> Result<EmbeddingMatrix> {
        let mut matrix = self.random_matrix(dim);

        if !self.path.exists() {
            tracing::warn!(
                "Embedding file '{}' not found, using random initialisation",
                self.path.display()
            );
            return Ok(matrix);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open embedding file '{}'", self.path.display()))?;

        let mut found = 0usize;
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Cannot read '{}'", self.path.display()))?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };

            let id = self.vocab.id(word);
            if self.vocab.word(id) != word || id == PAD_ID {
                continue;
            }

            let values = parts
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("{}:{}: malformed vector", self.path.display(), i + 1))?;
            if values.len() != dim {
                bail!(
                    "{}:{}: expected {dim} values for '{word}', found {}",
                    self.path.display(),
                    i + 1,
                    values.len()
                );
            }

            let start = id as usize * dim;
            matrix.data[start..start + dim].copy_from_slice(&values);
            found += 1;
        }

        tracing::info!(
            "Pretrained vectors found for {found} of {} words ({}d)",
            self.vocab.len(),
            dim
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vocab() -> Vocabulary {
        let sentences = vec![vec!["hops".to_string(), "malt".to_string(), "malt".to_string()]];
        Vocabulary::build(sentences.iter().map(Vec::as_slice), 1)
    }

    #[test]
    fn test_known_words_copied_and_pad_zeroed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("glove.6B.3d.txt");
        fs::write(&path, "malt 0.5 -0.5 1.0\nyeast 9 9 9\n<pad> 7 7 7\n").unwrap();

        let vocab = vocab();
        let matrix = GloveEmbeddings::new(&path, &vocab, 0).embedding_matrix(3).unwrap();
        assert_eq!(matrix.vocab_size, vocab.len());
        assert_eq!(matrix.row(vocab.id("malt") as usize), &[0.5, -0.5, 1.0]);
        assert_eq!(matrix.row(PAD_ID as usize), &[0.0, 0.0, 0.0]);

        let hops = matrix.row(vocab.id("hops") as usize);
        assert!(hops.iter().all(|v| v.abs() <= INIT_RANGE));
    }

    #[test]
    fn test_missing_file_falls_back_to_random() {
        let tmp = tempfile::tempdir().unwrap();
        let vocab = vocab();
        let provider = GloveEmbeddings::new(tmp.path().join("absent.txt"), &vocab, 7);

        let a = provider.embedding_matrix(4).unwrap();
        let b = provider.embedding_matrix(4).unwrap();
        assert_eq!(a, b);
        assert!(a.data.iter().all(|v| v.abs() <= INIT_RANGE));
        assert_eq!(a.row(PAD_ID as usize), &[0.0; 4]);
    }

    #[test]
    fn test_wrong_dimension_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("glove.txt");
        fs::write(&path, "hops 0.1 0.2\n").unwrap();

        let vocab = vocab();
        let err = GloveEmbeddings::new(&path, &vocab, 0).embedding_matrix(3).unwrap_err();
        assert!(err.to_string().contains("expected 3 values"));
    }
}
