// ============================================================
// Layer 2 — DataCheckUseCase
// ============================================================
// Smoke test of the data pipeline without building a model:
// load every split, report the sizes, and decode one training
// batch back to text (with the human rationale marked when the
// dataset has one).

use anyhow::Result;
use burn::data::dataset::Dataset;

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::SentenceClassification;
use crate::domain::example::Split;
use crate::domain::traits::BatchSource;

/// What the check found, returned for the caller to print or test.
#[derive(Debug, Clone, PartialEq)]
pub struct DataReport {
    pub split_sizes: Vec<(Split, usize)>,
    pub vocab_size:  usize,
    pub num_labels:  usize,
    /// `label: rendered text` for each example of the sample batch
    pub sample:      Vec<String>,
}

pub struct DataCheckUseCase {
    config: TrainConfig,
}

impl DataCheckUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, sample_size: usize) -> Result<DataReport> {
        let cfg = &self.config;
        let mut data = SentenceClassification::load(
            &cfg.data_path(),
            cfg.freq_threshold,
            cfg.truncate_num,
            cfg.random_seed,
        )?;
        Ok(report(&mut data, sample_size))
    }
}

fn report(data: &mut SentenceClassification, sample_size: usize) -> DataReport {
    let split_sizes = Split::ALL.iter().map(|&s| (s, data.split(s).len())).collect();

    for split in Split::ALL {
        let (r, s, k) = data.split(split).annotation_counts();
        tracing::info!("{split}: {} examples ({r} rationales, {s} scores, {k} knowledge)", data.split(split).len());
    }

    let sample = data
        .get_train_batch(sample_size, true)
        .iter()
        .map(|ex| {
            let z = ex.rationale.clone().unwrap_or_default();
            format!("{}: {}", data.label_name(ex.label), data.render_rationale(&ex.token_ids, &z))
        })
        .collect();

    DataReport { split_sizes, vocab_size: data.vocab.len(), num_labels: data.num_labels(), sample }
}
