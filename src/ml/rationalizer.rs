// ============================================================
// Layer 5 — Rationalizer (training orchestrator)
// ============================================================
// Owns the model plus everything that is training state but not
// a parameter: one Adam optimizer per parameter subset and the
// reward history.
//
// train_one_step:
//   1. forward (sampled rationales)
//   2. classifier / anti-classifier CE + 0/1 rewards
//   3. hard tagger: regularization + guidance → reward →
//      baseline (history mean, then push) → advantage →
//      REINFORCE loss
//      soft tagger: guidance rewards become penalties on the
//      classifier loss
//   4. one backward over the sum of the active losses, then each
//      optimizer steps on its own subset, in the order
//      classifier, tagger, anti-classifier
//
// The forward pass detaches at the subset boundaries (see
// model.rs), so summing the losses before backward yields the
// same per-subset gradients as separate backward passes.

use burn::{
    module::AutodiffModule,
    nn::Embedding,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::RationaleBatch;
use crate::domain::error::RationaleError;
use crate::domain::traits::EmbeddingMatrix;
use crate::ml::classifier::Classifier;
use crate::ml::config::{LossWeights, RationaleMode, RationalizerConfig};
use crate::ml::model::RationalizerModel;
use crate::ml::reward::{
    binarize_scores, classifier_loss, guidance_reward, knowledge_relevance,
    regularization_loss, tagger_loss, RewardHistory,
};
use crate::ml::tagger::{Phase, Tagger};

/// Scalar losses of one step, in update order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub classifier:      f64,
    pub tagger:          Option<f64>,
    pub anti_classifier: Option<f64>,
}

impl StepLosses {
    pub fn all_finite(&self) -> bool {
        self.classifier.is_finite()
            && self.tagger.map_or(true, f64::is_finite)
            && self.anti_classifier.map_or(true, f64::is_finite)
    }
}

pub struct StepOutput<B: Backend> {
    pub losses:          StepLosses,
    pub predict:         Tensor<B, 2>,
    pub anti_predict:    Option<Tensor<B, 2>>,
    pub z:               Tensor<B, 2>,
    /// Raw tagger scores, tagger only
    pub z_scores:        Option<Tensor<B, 3>>,
    /// Batch-mean combined reward, hard tagger only
    pub reward:          Option<f64>,
    /// Per-example continuity / sparsity losses, hard tagger only
    pub loss_continuity: Option<Tensor<B, 1>>,
    pub loss_sparsity:   Option<Tensor<B, 1>>,
}

pub struct Rationalizer<B: AutodiffBackend> {
    model:               RationalizerModel<B>,
    config:              RationalizerConfig,
    weights:             LossWeights,
    opt_embedding:       OptimizerAdaptor<Adam, Embedding<B>, B>,
    opt_classifier:      OptimizerAdaptor<Adam, Classifier<B>, B>,
    opt_tagger:          OptimizerAdaptor<Adam, Tagger<B>, B>,
    opt_anti_classifier: OptimizerAdaptor<Adam, Classifier<B>, B>,
    history:             RewardHistory,
}

impl<B: AutodiffBackend> Rationalizer<B> {
    pub fn new(
        config:     RationalizerConfig,
        embeddings: &EmbeddingMatrix,
        device:     &B::Device,
    ) -> Result<Self, RationaleError> {
        let model = config.init::<B>(embeddings, device)?;
        Ok(Self::from_model(model, config))
    }

    /// Wrap an existing model (for example one restored from a checkpoint).
    pub fn from_model(model: RationalizerModel<B>, config: RationalizerConfig) -> Self {
        let adam = AdamConfig::new();
        tracing::debug!(
            "Rationalizer: mode={:?} tagger={} anti={} lr={} tagger_lr={}",
            config.rationale_mode,
            model.tagger.is_some(),
            model.anti_classifier.is_some(),
            config.learning_rate,
            config.tagger_learning_rate(),
        );
        Self {
            weights:             config.loss_weights(),
            opt_embedding:       adam.init(),
            opt_classifier:      adam.init(),
            opt_tagger:          adam.init(),
            opt_anti_classifier: adam.init(),
            history:             RewardHistory::default(),
            model,
            config,
        }
    }

    pub fn model(&self) -> &RationalizerModel<B> {
        &self.model
    }

    pub fn config(&self) -> &RationalizerConfig {
        &self.config
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    /// Inference copy on the inner backend, argmax rationales.
    pub fn valid(&self) -> RationalizerModel<B::InnerBackend> {
        self.model.valid()
    }

    /// Fail fast when the batch does not match itself or the model.
    pub fn check_batch(&self, batch: &RationaleBatch<B>) -> Result<(), RationaleError> {
        let dims = batch.tokens.dims();
        let labels = batch.labels.dims();
        if labels[0] != dims[0] {
            return Err(RationaleError::shape("labels", &[dims[0]], &labels));
        }
        let matrices = [
            ("mask", Some(&batch.mask)),
            ("rationale", batch.rationale.as_ref()),
            ("scores", batch.scores.as_ref()),
            ("knowledge", batch.knowledge.as_ref()),
        ];
        for (name, matrix) in matrices {
            if let Some(matrix) = matrix {
                if matrix.dims() != dims {
                    return Err(RationaleError::shape(name, &dims, &matrix.dims()));
                }
            }
        }
        check_ids("label", batch.labels.clone(), self.config.num_labels)?;
        check_ids("token id", batch.tokens.clone(), self.model.vocab_size())?;
        if self.weights.importance != 0.0 && batch.scores.is_none() {
            return Err(RationaleError::MissingGuidance("importance score"));
        }
        if self.weights.knowledge != 0.0 && batch.knowledge.is_none() {
            return Err(RationaleError::MissingGuidance("domain knowledge"));
        }
        Ok(())
    }

    /// One forward / backward / update pass over a batch.
    pub fn train_one_step(&mut self, batch: &RationaleBatch<B>) -> Result<StepOutput<B>, RationaleError> {
        self.check_batch(batch)?;
        let m = batch.mask.clone();
        let w = self.weights;

        let output = self.model.forward(batch.tokens.clone(), m.clone(), Phase::Train);
        let z = output.z.clone();

        let (mut loss_classifier, reward_classifier) = classifier_loss(output.predict.clone(), batch.labels.clone());
        let anti = output
            .anti_predict
            .clone()
            .map(|anti_predict| classifier_loss(anti_predict, batch.labels.clone()));

        let mut loss_tagger = None;
        let mut reward = None;
        let mut loss_continuity = None;
        let mut loss_sparsity = None;

        if self.model.tagger.is_some() {
            let reward_s = self.importance_reward(z.clone(), batch)?;
            let reward_d = self.knowledge_reward(z.clone(), batch)?;

            match self.config.rationale_mode {
                RationaleMode::Hard => {
                    let (continuity, sparsity) =
                        regularization_loss(z.clone(), m.clone(), w.rationale_len, w.rationale_num);

                    let mut rewards = reward_classifier.clone()
                        - continuity.clone().mul_scalar(w.continuity)
                        - sparsity.clone().mul_scalar(w.sparsity);
                    if let Some((_, reward_anti)) = &anti {
                        rewards = rewards - reward_anti.clone().mul_scalar(w.anti);
                    }
                    if let Some(r) = reward_s {
                        rewards = rewards + r.mul_scalar(w.importance);
                    }
                    if let Some(r) = reward_d {
                        rewards = rewards + r.mul_scalar(w.knowledge);
                    }
                    let rewards = rewards.detach();

                    let batch_reward: f64 = rewards.clone().mean().into_scalar().elem();
                    let baseline = self.history.mean_then_push(batch_reward);
                    let advantages = rewards.sub_scalar(baseline);

                    let neg_log_probs = output
                        .neg_log_probs
                        .clone()
                        .ok_or_else(|| RationaleError::InvalidConfig("hard tagger returned no log-probabilities".into()))?;
                    loss_tagger = Some(tagger_loss(neg_log_probs, advantages, m.clone()));

                    tracing::trace!("reward={:.4} baseline={:.4}", batch_reward, baseline);
                    reward = Some(batch_reward);
                    loss_continuity = Some(continuity);
                    loss_sparsity = Some(sparsity);
                }
                RationaleMode::Soft => {
                    if let Some(r) = reward_s {
                        loss_classifier = loss_classifier - r.mean().mul_scalar(w.importance);
                    }
                    if let Some(r) = reward_d {
                        loss_classifier = loss_classifier - r.mean().mul_scalar(w.knowledge);
                    }
                }
            }
        }

        let losses = StepLosses {
            classifier:      loss_classifier.clone().into_scalar().elem(),
            tagger:          loss_tagger.clone().map(|l| l.into_scalar().elem()),
            anti_classifier: anti.as_ref().map(|(l, _)| l.clone().into_scalar().elem()),
        };

        let mut total = loss_classifier;
        if let Some(loss) = loss_tagger {
            total = total + loss;
        }
        if let Some((loss, _)) = anti {
            total = total + loss;
        }
        self.apply_updates(total.backward());

        Ok(StepOutput {
            losses,
            predict: output.predict.detach(),
            anti_predict: output.anti_predict.map(|p| p.detach()),
            z: z.detach(),
            z_scores: output.z_scores.map(|s| s.detach()),
            reward,
            loss_continuity,
            loss_sparsity,
        })
    }

    fn importance_reward(&self, z: Tensor<B, 2>, batch: &RationaleBatch<B>) -> Result<Option<Tensor<B, 1>>, RationaleError> {
        if self.weights.importance == 0.0 {
            return Ok(None);
        }
        let scores = batch.scores.clone().ok_or(RationaleError::MissingGuidance("importance score"))?;
        let relevant = binarize_scores(scores, self.weights.threshold_s);
        Ok(Some(guidance_reward(z, relevant)))
    }

    fn knowledge_reward(&self, z: Tensor<B, 2>, batch: &RationaleBatch<B>) -> Result<Option<Tensor<B, 1>>, RationaleError> {
        if self.weights.knowledge == 0.0 {
            return Ok(None);
        }
        let knowledge = batch.knowledge.clone().ok_or(RationaleError::MissingGuidance("domain knowledge"))?;
        Ok(Some(guidance_reward(z, knowledge_relevance(knowledge))))
    }

    /// Step each (parameter subset, optimizer) pair with its own share
    /// of the gradients. In soft mode the tagger belongs to the
    /// classifier's subset and shares its learning rate.
    fn apply_updates(&mut self, mut grads: B::Gradients) {
        let lr = self.config.learning_rate;
        let mut model = self.model.clone();

        let classifier_grads = GradientsParams::from_module(&mut grads, &model.classifier);
        model.classifier = self.opt_classifier.step(lr, model.classifier, classifier_grads);

        if model.fine_tuning {
            let embedding_grads = GradientsParams::from_module(&mut grads, &model.embedding);
            model.embedding = self.opt_embedding.step(lr, model.embedding, embedding_grads);
        }

        if let Some(tagger) = model.tagger.take() {
            let tagger_grads = GradientsParams::from_module(&mut grads, &tagger);
            let tagger_lr = self.config.tagger_learning_rate();
            model.tagger = Some(self.opt_tagger.step(tagger_lr, tagger, tagger_grads));
        }

        if let Some(anti) = model.anti_classifier.take() {
            let anti_grads = GradientsParams::from_module(&mut grads, &anti);
            model.anti_classifier = Some(self.opt_anti_classifier.step(lr, anti, anti_grads));
        }

        self.model = model;
    }
}

/// Every id must index a row of a table of `bound` entries.
fn check_ids<B: Backend, const D: usize>(
    name:  &str,
    ids:   Tensor<B, D, Int>,
    bound: usize,
) -> Result<(), RationaleError> {
    if ids.shape().num_elements() == 0 {
        return Ok(());
    }
    let min: i64 = ids.clone().min().into_scalar().elem();
    let max: i64 = ids.max().into_scalar().elem();
    if min < 0 || max >= bound as i64 {
        return Err(RationaleError::Data(format!(
            "{name} out of range: found values in [{min}, {max}], expected [0, {bound})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::RationaleBatcher;
    use crate::domain::example::SentenceExample;
    use crate::ml::config::ModelType;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn one_hot_embeddings() -> EmbeddingMatrix {
        EmbeddingMatrix::new(
            vec![
                0.0, 0.0, 0.0, 1.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                1.0, 0.0, 0.0, 0.0,
            ],
            4,
            4,
        )
    }

    /// 3 examples, vocabulary 4, sequence length 5 with right padding.
    fn scenario_examples() -> Vec<SentenceExample> {
        let rows: [(Vec<u32>, usize, Vec<f32>, Vec<f32>); 3] = [
            (vec![1, 3, 3, 2, 2], 1, vec![0.1, 1.0, -0.1, 0.0, 0.0], vec![0.0, 0.0, 1.0, 1.0, 1.0]),
            (vec![2, 1, 3, 1],    0, vec![1.0, -0.1, 0.0, 0.0],     vec![0.0, 0.0, -1.0, 1.0]),
            (vec![3, 1, 2],       1, vec![0.0, 0.0, 0.1],           vec![0.0, 1.0, 1.0]),
        ];
        rows.into_iter()
            .map(|(tokens, label, scores, knowledge)| SentenceExample {
                rationale: Some(vec![1.0; tokens.len()]),
                scores:    Some(scores),
                knowledge: Some(knowledge),
                token_ids: tokens,
                label,
            })
            .collect()
    }

    fn scenario_batch() -> RationaleBatch<TestBackend> {
        RationaleBatcher::<TestBackend>::new(Default::default()).batch(&scenario_examples())
    }

    fn full_config(mode: RationaleMode) -> RationalizerConfig {
        RationalizerConfig::new(2, 4, 6)
            .with_rationale_mode(mode)
            .with_anti_predictor(true)
            .with_importance_score(true)
            .with_threshold_s(Some(0.1))
            .with_domain_knowledge(true)
            .with_rationale_regulation(true)
            .with_rationale_len(2)
            .with_rationale_num(1)
    }

    fn z_values(z: Tensor<TestBackend, 2>) -> Vec<f32> {
        z.into_data().convert::<f32>().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_hard_step_end_to_end() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let batch = scenario_batch();
        assert_eq!(batch.tokens.dims(), [3, 5]);

        let out = rationalizer.train_one_step(&batch).unwrap();
        assert!(out.losses.all_finite(), "{:?}", out.losses);
        assert!(out.losses.tagger.is_some());
        assert!(out.losses.anti_classifier.is_some());
        assert!(out.reward.map_or(false, f64::is_finite));

        assert_eq!(out.z.dims(), [3, 5]);
        assert!(z_values(out.z).iter().all(|v| *v == 0.0 || *v == 1.0));
        assert_eq!(out.predict.dims(), [3, 2]);
    }

    #[test]
    fn test_soft_step_end_to_end() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Soft), &one_hot_embeddings(), &device).unwrap();

        let out = rationalizer.train_one_step(&scenario_batch()).unwrap();
        assert!(out.losses.all_finite(), "{:?}", out.losses);
        assert!(out.losses.tagger.is_none());
        assert!(out.reward.is_none());
        assert_eq!(rationalizer.history().len(), 1);

        assert_eq!(out.z.dims(), [3, 5]);
        assert!(z_values(out.z).iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_every_encoder_trains() {
        let device = Default::default();
        for model_type in [ModelType::Recurrent, ModelType::Convolutional, ModelType::Attention] {
            let cfg = full_config(RationaleMode::Hard).with_model_type(model_type).with_kernel_size(3);
            let mut rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();
            let out = rationalizer.train_one_step(&scenario_batch()).unwrap();
            assert!(out.losses.all_finite(), "{model_type}: {:?}", out.losses);
        }
    }

    #[test]
    fn test_reward_history_grows_per_hard_step() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let batch = scenario_batch();
        for step in 1..=4 {
            let out = rationalizer.train_one_step(&batch).unwrap();
            assert_eq!(rationalizer.history().len(), step + 1);
            assert!(out.reward.is_some());
        }
    }

    #[test]
    fn test_parameters_change_after_step() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let before = rationalizer.model().classifier.predictor.weight.val().inner();
        rationalizer.train_one_step(&scenario_batch()).unwrap();
        let after = rationalizer.model().classifier.predictor.weight.val().inner();
        let moved: f32 = (after - before).abs().sum().into_scalar().elem();
        assert!(moved > 0.0);
    }

    fn max_abs_delta(before: Tensor<burn::backend::NdArray, 2>, after: Tensor<burn::backend::NdArray, 2>) -> f64 {
        (after - before).abs().max().into_scalar().elem()
    }

    #[test]
    fn test_each_subset_steps_at_its_own_learning_rate() {
        let device = Default::default();
        let lr = 0.01;
        let cfg = full_config(RationaleMode::Hard).with_learning_rate(lr);
        let mut rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();

        let weights = |r: &Rationalizer<TestBackend>| {
            let model = r.model();
            (
                model.classifier.predictor.weight.val().inner(),
                model.tagger.as_ref().unwrap().scorer.weight.val().inner(),
                model.anti_classifier.as_ref().unwrap().predictor.weight.val().inner(),
            )
        };
        let (classifier_before, tagger_before, anti_before) = weights(&rationalizer);
        rationalizer.train_one_step(&scenario_batch()).unwrap();
        let (classifier_after, tagger_after, anti_after) = weights(&rationalizer);

        // A first Adam step moves each weight by at most its learning rate.
        let classifier = max_abs_delta(classifier_before, classifier_after);
        let tagger = max_abs_delta(tagger_before, tagger_after);
        let anti = max_abs_delta(anti_before, anti_after);
        assert!(classifier > 0.5 * lr && classifier <= lr * 1.001, "classifier moved {classifier}");
        assert!(anti > 0.5 * lr && anti <= lr * 1.001, "anti-classifier moved {anti}");
        assert!(tagger > 0.0 && tagger <= 0.1 * lr * 1.001, "tagger moved {tagger}");
    }

    #[test]
    fn test_each_loss_reaches_only_its_own_subset() {
        let device = Default::default();
        let cfg = full_config(RationaleMode::Hard).with_fine_tuning(true);
        let rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();
        let model = rationalizer.model().clone();
        let tagger = model.tagger.clone().unwrap();
        let anti = model.anti_classifier.clone().unwrap();
        let batch = scenario_batch();
        let forward = || model.forward(batch.tokens.clone(), batch.mask.clone(), Phase::Train);

        // (classifier, embedding, tagger, anti-classifier) has gradients
        let reached = |mut grads: <TestBackend as AutodiffBackend>::Gradients| {
            (
                !GradientsParams::from_module(&mut grads, &model.classifier).is_empty(),
                !GradientsParams::from_module(&mut grads, &model.embedding).is_empty(),
                !GradientsParams::from_module(&mut grads, &tagger).is_empty(),
                !GradientsParams::from_module(&mut grads, &anti).is_empty(),
            )
        };

        let (loss, _) = classifier_loss(forward().predict, batch.labels.clone());
        assert_eq!(reached(loss.backward()), (true, true, false, false));

        let neg_log_probs = forward().neg_log_probs.unwrap();
        let advantages = Tensor::<TestBackend, 1>::from_floats([1.0, -0.5, 0.25], &device);
        let loss = tagger_loss(neg_log_probs, advantages, batch.mask.clone());
        assert_eq!(reached(loss.backward()), (false, false, true, false));

        let (loss, _) = classifier_loss(forward().anti_predict.unwrap(), batch.labels.clone());
        assert_eq!(reached(loss.backward()), (false, false, false, true));
    }

    #[test]
    fn test_soft_guidance_is_a_penalty_on_the_classifier_loss() {
        let device = Default::default();
        let cfg = full_config(RationaleMode::Soft).with_lambda_s(0.5).with_lambda_d(2.0);
        let mut rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();
        let batch = scenario_batch();

        let out = rationalizer.train_one_step(&batch).unwrap();

        let (ce, _) = classifier_loss(out.predict.clone(), batch.labels.clone());
        let ce: f64 = ce.into_scalar().elem();
        let reward_s: f64 = guidance_reward(out.z.clone(), binarize_scores(batch.scores.clone().unwrap(), 0.1))
            .mean()
            .into_scalar()
            .elem();
        let reward_d: f64 = guidance_reward(out.z.clone(), knowledge_relevance(batch.knowledge.clone().unwrap()))
            .mean()
            .into_scalar()
            .elem();
        assert!(reward_s > 0.0 && reward_d > 0.0);

        let expected = ce - 0.5 * reward_s - 2.0 * reward_d;
        assert!(
            (out.losses.classifier - expected).abs() < 1e-5,
            "loss {} expected {expected}",
            out.losses.classifier
        );
    }

    #[test]
    fn test_frozen_embeddings_stay_fixed() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Soft), &one_hot_embeddings(), &device).unwrap();
        rationalizer.train_one_step(&scenario_batch()).unwrap();
        let weight = rationalizer.model().embedding.weight.val().inner();
        let weight = weight.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(weight, one_hot_embeddings().data);
    }

    #[test]
    fn test_shape_mismatch_fails_fast() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let mut batch = scenario_batch();
        batch.labels = Tensor::from_ints([1, 0], &device);
        let err = rationalizer.train_one_step(&batch).err().unwrap();
        assert!(matches!(err, RationaleError::ShapeMismatch { name: "labels", .. }));
        assert_eq!(rationalizer.history().len(), 1);
    }

    #[test]
    fn test_label_outside_label_set_rejected() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let mut batch = scenario_batch();
        batch.labels = Tensor::from_ints([1, 5, 0], &device);
        let err = rationalizer.train_one_step(&batch).err().unwrap();
        assert!(matches!(&err, RationaleError::Data(msg) if msg.starts_with("label")), "{err}");
        assert_eq!(rationalizer.history().len(), 1);
    }

    #[test]
    fn test_token_id_outside_vocabulary_rejected() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let mut batch = scenario_batch();
        batch.tokens = Tensor::<TestBackend, 2, Int>::from_ints(
            [[1, 3, 3, 2, 2], [2, 1, 9, 1, 0], [3, 1, 2, 0, 0]],
            &device,
        );
        let err = rationalizer.train_one_step(&batch).err().unwrap();
        assert!(matches!(&err, RationaleError::Data(msg) if msg.starts_with("token id")), "{err}");
    }

    #[test]
    fn test_missing_guidance_matrix_rejected() {
        let device = Default::default();
        let mut rationalizer =
            Rationalizer::<TestBackend>::new(full_config(RationaleMode::Hard), &one_hot_embeddings(), &device).unwrap();
        let mut batch = scenario_batch();
        batch.scores = None;
        let err = rationalizer.train_one_step(&batch).err().unwrap();
        assert!(matches!(err, RationaleError::MissingGuidance(_)));
    }

    #[test]
    fn test_plain_classifier_without_tagger() {
        let device = Default::default();
        let cfg = RationalizerConfig::new(2, 4, 6).with_rationale_tagger(false);
        let mut rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();
        let batch = scenario_batch();
        let out = rationalizer.train_one_step(&batch).unwrap();
        assert!(out.losses.tagger.is_none());
        let diff: f32 = (out.z - batch.mask).abs().sum().into_scalar().elem();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn test_zero_weight_anti_classifier_is_not_trained() {
        let device = Default::default();
        let cfg = full_config(RationaleMode::Hard).with_lambda_anti(0.0);
        let mut rationalizer = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).unwrap();
        assert!(rationalizer.model().anti_classifier.is_none());

        let out = rationalizer.train_one_step(&scenario_batch()).unwrap();
        assert!(out.losses.anti_classifier.is_none());
        assert!(out.anti_predict.is_none());
        assert!(out.losses.tagger.is_some());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let device = Default::default();
        let cfg = RationalizerConfig::new(2, 4, 6).with_importance_score(true);
        let err = Rationalizer::<TestBackend>::new(cfg, &one_hot_embeddings(), &device).err().unwrap();
        assert!(matches!(err, RationaleError::InvalidConfig(_)));
    }
}
