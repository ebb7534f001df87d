// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Iteration-based loop around `Rationalizer::train_one_step`.
//
//   for i in 0..=num_iteration:
//     sample a length-sorted batch → one step → running metrics
//     every display_iteration: log losses and one rationale
//     every eval_iteration:    dev + test evaluation on the inner
//                              backend, train running averages,
//                              CSV rows, checkpoint i_<i>
//
// Iteration 0 is evaluated too, so the records start from the
// untrained model. Checkpoint failures are logged and training
// continues; a failing step aborts the run.

use anyhow::{ensure, Context, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::RationaleBatcher;
use crate::domain::example::{SentenceExample, Split};
use crate::domain::traits::{BatchSource, EmbeddingMatrix};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, TrainingRecords},
};
use crate::ml::config::RationalizerConfig;
use crate::ml::evaluator::{evaluate, BatchMetrics};
use crate::ml::rationalizer::{Rationalizer, StepOutput};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Row of the sampled batch shown at every display iteration.
const DISPLAY_ROW: usize = 2;

pub fn run_training<S: BatchSource>(
    cfg:        &TrainConfig,
    model_cfg:  RationalizerConfig,
    embeddings: &EmbeddingMatrix,
    source:     &mut S,
    checkpoint: &CheckpointManager,
    logger:     &MetricsLogger,
) -> Result<TrainingRecords> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    MyBackend::seed(cfg.random_seed);
    train_loop::<MyBackend, S>(cfg, model_cfg, embeddings, source, checkpoint, logger, &device)
}

pub fn train_loop<B: AutodiffBackend, S: BatchSource>(
    cfg:        &TrainConfig,
    model_cfg:  RationalizerConfig,
    embeddings: &EmbeddingMatrix,
    source:     &mut S,
    checkpoint: &CheckpointManager,
    logger:     &MetricsLogger,
    device:     &B::Device,
) -> Result<TrainingRecords> {
    ensure!(cfg.batch_size > 0, "batch_size must be positive");

    let mut rationalizer = Rationalizer::<B>::new(model_cfg, embeddings, device)
        .context("Cannot build the rationalizer")?;
    tracing::info!(
        "Model ready: {} encoder, hidden_dim={}, {:?} rationales",
        rationalizer.config().model_type,
        rationalizer.config().hidden_dim,
        rationalizer.config().rationale_mode,
    );

    let batcher = RationaleBatcher::<B>::new(device.clone());
    let mut records = TrainingRecords::default();
    let mut running = BatchMetrics::default();
    let mut running_steps = 0usize;

    for i in 0..=cfg.num_iteration {
        let examples = source.get_train_batch(cfg.batch_size, true);
        ensure!(!examples.is_empty(), "the batch source returned no training examples");
        let batch = batcher.batch(&examples);

        let out = rationalizer
            .train_one_step(&batch)
            .with_context(|| format!("Training step {i} failed"))?;
        ensure!(out.losses.all_finite(), "non-finite loss at iteration {i}: {:?}", out.losses);

        running += BatchMetrics::compute(
            out.predict.clone(),
            out.anti_predict.clone(),
            out.z.clone(),
            batch.labels.clone(),
            batch.mask.clone(),
        );
        running_steps += 1;

        if cfg.display_iteration > 0 && i % cfg.display_iteration == 0 {
            display(i, &out, &examples, &*source, rationalizer.history().mean());
        }

        if cfg.eval_iteration > 0 && i % cfg.eval_iteration == 0 {
            let valid = rationalizer.valid();
            let dev = evaluate(&valid, &*source, Split::Dev, cfg.batch_size, device);
            let test = evaluate(&valid, &*source, Split::Test, cfg.batch_size, device);
            let train = running.scale(1.0 / running_steps as f64);

            for (split, metrics) in [(Split::Train, &train), (Split::Dev, &dev), (Split::Test, &test)] {
                records.push(split, metrics);
                if let Err(e) = logger.log(i, split, metrics) {
                    tracing::warn!("Cannot append metrics for iteration {i}: {e:#}");
                }
            }
            tracing::info!(
                "iter {:>5} | train_acc={:.4} | dev_acc={:.4} | test_acc={:.4} | dev_anti_acc={:.4} | dev_sparsity={:.4} | dev_continuity={:.4}",
                i, train.accuracy, dev.accuracy, test.accuracy, dev.anti_accuracy, dev.sparsity, dev.continuity,
            );

            if let Err(e) = checkpoint.save_model(rationalizer.model(), i) {
                tracing::warn!("Checkpoint for iteration {i} not saved: {e:#}");
            }

            running = BatchMetrics::default();
            running_steps = 0;
        }
    }

    tracing::info!("Best dev accuracy: {:.4}", records.accuracy.best(Split::Dev));
    tracing::info!("Best test accuracy: {:.4}", records.accuracy.best(Split::Test));
    Ok(records)
}

fn display<B: Backend, S: BatchSource + ?Sized>(
    iteration: usize,
    out:       &StepOutput<B>,
    examples:  &[SentenceExample],
    source:    &S,
    baseline:  f64,
) {
    let losses = &out.losses;
    tracing::info!(
        "iter {:>5} | cls_loss={:.4} | tagger_loss={} | anti_loss={} | reward={} | baseline={:.4} | continuity={} | sparsity={}",
        iteration,
        losses.classifier,
        fmt_opt(losses.tagger),
        fmt_opt(losses.anti_classifier),
        fmt_opt(out.reward),
        baseline,
        fmt_opt(batch_mean(&out.loss_continuity)),
        fmt_opt(batch_mean(&out.loss_sparsity)),
    );

    let row = DISPLAY_ROW.min(examples.len() - 1);
    let [_, seq_len] = out.z.dims();
    let [_, num_labels] = out.predict.dims();

    let z = out.z.clone().slice([row..row + 1, 0..seq_len]).into_data().convert::<f32>().to_vec::<f32>();
    let pred = out
        .predict
        .clone()
        .slice([row..row + 1, 0..num_labels])
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>();

    match (z, pred) {
        (Ok(z), Ok(pred)) => {
            let example = &examples[row];
            tracing::info!(
                "gold label: {} | pred label: {}",
                source.label_name(example.label),
                source.label_name(pred.first().copied().unwrap_or(0) as usize),
            );
            tracing::info!("{}", source.render_rationale(&example.token_ids, &z));
            if let Some(scores) = &out.z_scores {
                let [_, _, width] = scores.dims();
                if let Ok(scores) = scores
                    .clone()
                    .slice([row..row + 1, 0..seq_len, 0..width])
                    .into_data()
                    .convert::<f32>()
                    .to_vec::<f32>()
                {
                    tracing::debug!("tagger scores: {:?}", scores);
                }
            }
        }
        _ => tracing::debug!("Cannot read back the displayed example"),
    }
}

fn batch_mean<B: Backend>(values: &Option<Tensor<B, 1>>) -> Option<f64> {
    values.as_ref().map(|v| v.clone().mean().into_scalar().elem())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
