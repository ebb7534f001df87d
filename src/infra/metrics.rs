// ============================================================
// Layer 6 — Metrics Sink
// ============================================================
// Two outputs per run, both in the run's working directory:
//
//   metrics.csv        — one row per split per evaluation,
//                        appended as training goes
//   <metric>.json      — at the end of the run, one record per
//                        metric with the full train/dev/test series
//
// Example CSV output:
//   iteration,split,accuracy,anti_accuracy,sparsity,continuity
//   100,train,0.712500,0.503125,0.182000,0.061000
//   100,dev,0.698000,0.511000,0.176500,0.058200

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::example::Split;
use crate::ml::evaluator::BatchMetrics;

const CSV_HEADER: &str = "iteration,split,accuracy,anti_accuracy,sparsity,continuity";

/// Series of one metric across every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name:  String,
    pub train: Vec<f64>,
    pub dev:   Vec<f64>,
    pub test:  Vec<f64>,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), train: Vec::new(), dev: Vec::new(), test: Vec::new() }
    }

    pub fn push(&mut self, split: Split, value: f64) {
        match split {
            Split::Train => self.train.push(value),
            Split::Dev   => self.dev.push(value),
            Split::Test  => self.test.push(value),
        }
    }

    pub fn best(&self, split: Split) -> f64 {
        let series = match split {
            Split::Train => &self.train,
            Split::Dev   => &self.dev,
            Split::Test  => &self.test,
        };
        series.iter().copied().fold(0.0, f64::max)
    }
}

/// The four records a training run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecords {
    pub accuracy:      MetricRecord,
    pub anti_accuracy: MetricRecord,
    pub sparsity:      MetricRecord,
    pub continuity:    MetricRecord,
}

impl Default for TrainingRecords {
    fn default() -> Self {
        Self {
            accuracy:      MetricRecord::new("accuracy"),
            anti_accuracy: MetricRecord::new("anti-accuracy"),
            sparsity:      MetricRecord::new("sparsity"),
            continuity:    MetricRecord::new("continuity"),
        }
    }
}

impl TrainingRecords {
    pub fn push(&mut self, split: Split, metrics: &BatchMetrics) {
        self.accuracy.push(split, metrics.accuracy);
        self.anti_accuracy.push(split, metrics.anti_accuracy);
        self.sparsity.push(split, metrics.sparsity);
        self.continuity.push(split, metrics.continuity);
    }

    pub fn all(&self) -> [&MetricRecord; 4] {
        [&self.accuracy, &self.anti_accuracy, &self.sparsity, &self.continuity]
    }
}

pub struct MetricsLogger {
    dir:      PathBuf,
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { dir, csv_path })
    }

    pub fn log(&self, iteration: usize, split: Split, m: &BatchMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            iteration, split, m.accuracy, m.anti_accuracy, m.sparsity, m.continuity,
        )?;
        Ok(())
    }

    /// Write every record as `<name>.json`.
    pub fn save_records(&self, records: &TrainingRecords) -> Result<()> {
        for record in records.all() {
            let path = self.dir.join(format!("{}.json", record.name));
            fs::write(&path, serde_json::to_string(record)?)
                .with_context(|| format!("Cannot write record '{}'", path.display()))?;
            tracing::info!("Training record saved for: {}", record.name);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &std::path::Path {
        &self.csv_path
    }
}
