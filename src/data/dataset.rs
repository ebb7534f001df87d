// ============================================================
// Layer 4 — Sentence Classification Dataset
// ============================================================
// The three splits after vocabulary lookup, plus the seeded
// random source that draws training batches.
//
//   ExampleSet             — one split, exposed through burn's
//                            Dataset trait
//   SentenceClassification — vocabularies + splits, implements
//                            BatchSource for the training loop

use anyhow::{ensure, Context, Result};
use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;

use crate::data::loader::{JsonlLoader, TokenizedRecord};
use crate::data::vocabulary::{LabelVocabulary, Vocabulary};
use crate::domain::example::{SentenceExample, Split};
use crate::domain::traits::BatchSource;

// ─── ExampleSet ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct ExampleSet {
    examples: Vec<SentenceExample>,
}

impl ExampleSet {
    pub fn new(examples: Vec<SentenceExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[SentenceExample] {
        &self.examples
    }

    /// Number of examples that carry each annotation kind.
    pub fn annotation_counts(&self) -> (usize, usize, usize) {
        self.examples.iter().fold((0, 0, 0), |(r, s, k), ex| {
            (
                r + ex.rationale.is_some() as usize,
                s + ex.scores.is_some() as usize,
                k + ex.knowledge.is_some() as usize,
            )
        })
    }
}

impl Dataset<SentenceExample> for ExampleSet {
    fn get(&self, index: usize) -> Option<SentenceExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

// ─── SentenceClassification ───────────────────────────────────────────────────
pub struct SentenceClassification {
    pub vocab:  Vocabulary,
    pub labels: LabelVocabulary,
    train:      ExampleSet,
    dev:        ExampleSet,
    test:       ExampleSet,
    rng:        StdRng,
}

impl SentenceClassification {
    /// Read `<dir>/{train,dev,test}.jsonl`, build the vocabularies from
    /// the training split and encode every split.
    pub fn load(dir: &Path, freq_threshold: usize, truncate_num: usize, seed: u64) -> Result<Self> {
        let loader = JsonlLoader::new(dir, truncate_num);
        let train = loader.load_split(Split::Train)?;
        let dev = loader.load_split(Split::Dev)?;
        let test = loader.load_split(Split::Test)?;
        ensure!(!train.is_empty(), "training split in '{}' is empty", dir.display());

        Self::from_records(train, dev, test, freq_threshold, seed)
    }

    pub fn from_records(
        train:          Vec<TokenizedRecord>,
        dev:            Vec<TokenizedRecord>,
        test:           Vec<TokenizedRecord>,
        freq_threshold: usize,
        seed:           u64,
    ) -> Result<Self> {
        let vocab = Vocabulary::build(train.iter().map(|r| r.tokens.as_slice()), freq_threshold);
        let labels = LabelVocabulary::build(train.iter().map(|r| r.label.as_str()));

        let encode = |records: Vec<TokenizedRecord>, split: Split| -> Result<ExampleSet> {
            records
                .into_iter()
                .map(|r| {
                    let label = labels.id(&r.label).with_context(|| format!("in {split} split"))?;
                    Ok(SentenceExample {
                        token_ids: vocab.encode(&r.tokens),
                        label,
                        rationale: r.rationale,
                        scores:    r.scores,
                        knowledge: r.knowledge,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(ExampleSet::new)
        };

        let train = encode(train, Split::Train)?;
        let dev = encode(dev, Split::Dev)?;
        let test = encode(test, Split::Test)?;

        let data = Self { vocab, labels, train, dev, test, rng: StdRng::seed_from_u64(seed) };
        tracing::info!(
            "Dataset: train={} dev={} test={} vocab={} labels={}",
            data.train.len(),
            data.dev.len(),
            data.test.len(),
            data.vocab.len(),
            data.labels.len()
        );
        Ok(data)
    }

    pub fn split(&self, split: Split) -> &ExampleSet {
        match split {
            Split::Train => &self.train,
            Split::Dev   => &self.dev,
            Split::Test  => &self.test,
        }
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
}

impl BatchSource for SentenceClassification {
    fn get_train_batch(&mut self, batch_size: usize, sort: bool) -> Vec<SentenceExample> {
        let n = self.train.len();
        if n == 0 {
            return Vec::new();
        }
        let mut batch: Vec<SentenceExample> = (0..batch_size)
            .map(|_| self.train.examples[self.rng.gen_range(0..n)].clone())
            .collect();
        if sort {
            batch.sort_by(|a, b| b.len().cmp(&a.len()));
        }
        batch
    }

    fn eval_batches(&self, split: Split, batch_size: usize) -> Vec<Vec<SentenceExample>> {
        self.split(split)
            .examples()
            .chunks(batch_size.max(1))
            .map(<[SentenceExample]>::to_vec)
            .collect()
    }

    fn label_name(&self, label: usize) -> &str {
        self.labels.name(label)
    }

    fn render_rationale(&self, token_ids: &[u32], z: &[f32]) -> String {
        token_ids
            .iter()
            .zip(z.iter().chain(std::iter::repeat(&0.0)))
            .map(|(&id, &zi)| {
                let word = self.vocab.word(id);
                if zi >= 0.5 { format!("[{word}]") } else { word.to_string() }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, text: &str) -> TokenizedRecord {
        TokenizedRecord {
            label:     label.to_string(),
            tokens:    text.split(' ').map(String::from).collect(),
            rationale: None,
            scores:    None,
            knowledge: None,
        }
    }

    fn data(seed: u64) -> SentenceClassification {
        SentenceClassification::from_records(
            vec![
                record("pos", "great beer"),
                record("neg", "flat stale beer"),
                record("pos", "lovely hoppy aroma and great head"),
            ],
            vec![record("pos", "great aroma"), record("neg", "stale")],
            vec![record("neg", "unknown words here")],
            1,
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_splits_are_encoded() {
        let data = data(0);
        assert_eq!(data.num_labels(), 2);
        assert_eq!(data.split(Split::Dev).len(), 2);
        let test = data.split(Split::Test).get(0).unwrap();
        assert_eq!(test.token_ids, vec![1, 1, 1]);
        assert_eq!(test.label, 0);
    }

    #[test]
    fn test_unknown_label_in_dev_rejected() {
        let err = SentenceClassification::from_records(
            vec![record("pos", "good")],
            vec![record("meh", "okay")],
            vec![],
            1,
            0,
        )
        .err()
        .unwrap();
        assert!(format!("{err:#}").contains("dev split"));
    }

    #[test]
    fn test_train_batches_are_seeded_and_sorted() {
        let mut a = data(42);
        let mut b = data(42);
        let batch_a = a.get_train_batch(8, true);
        let batch_b = b.get_train_batch(8, true);
        assert_eq!(batch_a, batch_b);
        assert_eq!(batch_a.len(), 8);
        assert!(batch_a.windows(2).all(|w| w[0].len() >= w[1].len()));
    }

    #[test]
    fn test_eval_batches_cover_split_in_order() {
        let data = data(0);
        let batches = data.eval_batches(Split::Train, 2);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(batches[1][0].len(), 6);
    }

    #[test]
    fn test_render_rationale_marks_selected_tokens() {
        let data = data(0);
        let ids = data.vocab.encode(&["great", "beer"]);
        assert_eq!(data.render_rationale(&ids, &[0.0, 1.0]), "great [beer]");
        assert_eq!(data.label_name(1), "pos");
    }
}
