// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here. Built bottom-up:
//
//   config.rs       — RationalizerConfig, feature toggles and
//                     their effective loss weights
//
//   encoder.rs      — Recurrent / Convolutional / Attention
//                     sequence encoders behind one enum
//
//   classifier.rs   — label prediction from the selected tokens
//                     (also used as the anti-classifier)
//
//   tagger.rs       — the rationale selection policy, hard
//                     (sampled binary mask) or soft (attention)
//
//   model.rs        — RationalizerModel: the burn Module owning
//                     every parameter, and the forward pass
//
//   reward.rs       — losses, rewards, regularization and the
//                     reward history baseline
//
//   rationalizer.rs — one training step: rewards, REINFORCE,
//                     one Adam optimizer per parameter subset
//
//   evaluator.rs    — accuracy / sparsity / continuity metrics
//
//   trainer.rs      — the iteration loop with display, periodic
//                     evaluation and checkpoints

/// Model hyperparameters and feature toggles
pub mod config;

/// Sequence encoders
pub mod encoder;

/// Classifier and anti-classifier
pub mod classifier;

/// Rationale tagger
pub mod tagger;

/// Parameter container and forward pass
pub mod model;

/// Loss and reward functions, reward history
pub mod reward;

/// Training step orchestration
pub mod rationalizer;

/// Evaluation metrics
pub mod evaluator;

/// Training loop with evaluation and checkpointing
pub mod trainer;
