// ============================================================
// Layer 5 — Classifier
// ============================================================
// Predicts a label from the selected rationale only. The same
// type, with its own parameters, serves as the anti-classifier
// when it is fed the complement selection `1 − z`.
//
//   Hard (binary z):
//     e · z  → own encoder under m → max over time of
//     hiddens + (1 − m·z) · NEG_INF → linear (with bias)
//
//   Soft (continuous z):
//     Σ_t h_t · z_t → linear (no bias)
//     h comes from the tagger; without a tagger the classifier
//     encodes the embeddings itself.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};

use crate::ml::config::RationalizerConfig;
use crate::ml::encoder::Encoder;

/// Additive bias that keeps excluded positions out of the max.
pub const NEG_INF: f32 = -1.0e6;

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub encoder:   Encoder<B>,
    pub predictor: Linear<B>,
    pub binary:    bool,
}

impl RationalizerConfig {
    pub fn init_classifier<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        let binary = self.rationale_mode.is_binary();
        Classifier {
            encoder:   self.encoder_config().init(device),
            predictor: LinearConfig::new(self.hidden_dim, self.num_labels)
                .with_bias(binary)
                .init(device),
            binary,
        }
    }
}

impl<B: Backend> Classifier<B> {
    /// e: [batch, seq_len, embedding_dim]
    /// h: [batch, seq_len, hidden_dim] hidden states of the tagger, if any
    /// z: [batch, seq_len] rationale selection
    /// m: [batch, seq_len] sequence mask
    /// → logits [batch, num_labels]
    pub fn forward(
        &self,
        e: Tensor<B, 3>,
        h: Option<Tensor<B, 3>>,
        z: Tensor<B, 2>,
        m: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let hidden = if self.binary {
            let rationales = e * z.clone().unsqueeze_dim::<3>(2);
            let hiddens = self.encoder.forward(rationales, m.clone());
            max_pool_selected(hiddens, z * m)
        } else {
            let hiddens = match h {
                Some(h) => h,
                None    => self.encoder.forward(e, m),
            };
            weighted_sum_pool(hiddens, z)
        };
        self.predictor.forward(hidden)
    }
}

/// Max over time restricted to positions where `keep` is 1.
///
/// hiddens: [batch, seq_len, hidden_dim], keep: [batch, seq_len]
/// → [batch, hidden_dim]
///
/// Time is moved to the last axis before the max: the max backward
/// scatters along the reduced axis, which has to be the last one.
pub fn max_pool_selected<B: Backend>(hiddens: Tensor<B, 3>, keep: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _, hidden_dim] = hiddens.dims();
    let bias = keep
        .neg()
        .add_scalar(1.0)
        .mul_scalar(NEG_INF)
        .unsqueeze_dim::<3>(1);
    (hiddens.swap_dims(1, 2) + bias).max_dim(2).reshape([batch, hidden_dim])
}

/// Σ_t h_t · z_t.
///
/// hiddens: [batch, seq_len, hidden_dim], z: [batch, seq_len]
/// → [batch, hidden_dim]
pub fn weighted_sum_pool<B: Backend>(hiddens: Tensor<B, 3>, z: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _, hidden_dim] = hiddens.dims();
    (hiddens * z.unsqueeze_dim::<3>(2))
        .sum_dim(1)
        .reshape([batch, hidden_dim])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::config::RationaleMode;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn max_abs_diff<const D: usize>(a: Tensor<TestBackend, D>, b: Tensor<TestBackend, D>) -> f32 {
        (a - b).abs().max().into_scalar().elem()
    }

    #[test]
    fn test_hard_pooling_ignores_excluded_positions() {
        let device = Default::default();
        // Excluded positions carry values far above every kept one.
        let hiddens = Tensor::<TestBackend, 3>::from_floats(
            [
                [[1.0, -2.0], [500.0, 900.0], [3.0, -1.0], [700.0, 800.0]],
                [[-4.0, -5.0], [-3.0, -6.0], [1000.0, 1000.0], [1000.0, 1000.0]],
            ],
            &device,
        );
        let z = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 1.0, 1.0], [1.0, 1.0, 1.0, 0.0]], &device);
        let m = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 1.0, 0.0], [1.0, 1.0, 0.0, 0.0]], &device);

        let pooled = max_pool_selected(hiddens, z * m);
        let expected = Tensor::<TestBackend, 2>::from_floats([[3.0, -1.0], [-3.0, -5.0]], &device);
        assert_eq!(pooled.dims(), [2, 2]);
        assert_eq!(max_abs_diff(pooled, expected), 0.0);
    }

    #[test]
    fn test_hard_pooling_backward_reaches_kept_positions_only() {
        type AutodiffBackend = burn::backend::Autodiff<TestBackend>;
        let device = Default::default();
        let hiddens = Tensor::<AutodiffBackend, 3>::random([3, 5, 6], Distribution::Uniform(-1.0, 1.0), &device)
            .require_grad();
        let keep = Tensor::<AutodiffBackend, 2>::from_floats(
            [[1.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0, 0.0], [1.0, 0.0, 1.0, 0.0, 0.0]],
            &device,
        );

        let pooled = max_pool_selected(hiddens.clone(), keep);
        assert_eq!(pooled.dims(), [3, 6]);
        let grads = pooled.sum().backward();
        let grad = hiddens.grad(&grads).unwrap();
        assert_eq!(grad.dims(), [3, 5, 6]);

        // Each (example, feature) routes its gradient to exactly one kept step.
        let grad = grad.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!((grad.iter().sum::<f32>() - 18.0).abs() < 1e-5);
        for t in [1, 3, 4] {
            for j in 0..6 {
                assert_eq!(grad[2 * 30 + t * 6 + j], 0.0);
            }
        }
    }

    #[test]
    fn test_soft_pooling_is_linear_in_z() {
        let device = Default::default();
        let hiddens = Tensor::<TestBackend, 3>::random([3, 5, 6], Distribution::Uniform(-1.0, 1.0), &device);
        let z = Tensor::<TestBackend, 2>::random([3, 5], Distribution::Uniform(0.0, 1.0), &device);

        let pooled = weighted_sum_pool(hiddens.clone(), z.clone());
        let scaled = weighted_sum_pool(hiddens.clone(), z.clone().mul_scalar(2.5));
        assert!(max_abs_diff(scaled, pooled.clone().mul_scalar(2.5)) < 1e-5);

        let manual = (hiddens * z.unsqueeze_dim::<3>(2)).sum_dim(1).reshape([3, 6]);
        assert!(max_abs_diff(pooled, manual) < 1e-6);
    }

    #[test]
    fn test_soft_classifier_ignores_mask_in_pooling() {
        let device = Default::default();
        let cfg = RationalizerConfig::new(2, 4, 6).with_rationale_mode(RationaleMode::Soft);
        let classifier = cfg.init_classifier::<TestBackend>(&device);

        let e = Tensor::<TestBackend, 3>::random([3, 5, 4], Distribution::Uniform(-1.0, 1.0), &device);
        let h = Tensor::<TestBackend, 3>::random([3, 5, 6], Distribution::Uniform(-1.0, 1.0), &device);
        let z = Tensor::<TestBackend, 2>::random([3, 5], Distribution::Uniform(0.0, 1.0), &device);
        let full = Tensor::<TestBackend, 2>::ones([3, 5], &device);
        let partial = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0, 0.0], [1.0, 1.0, 1.0, 0.0, 0.0]],
            &device,
        );

        let a = classifier.forward(e.clone(), Some(h.clone()), z.clone(), full);
        let b = classifier.forward(e, Some(h), z, partial);
        assert_eq!(max_abs_diff(a, b), 0.0);
    }

    #[test]
    fn test_output_shape_and_finite_logits() {
        let device = Default::default();
        for mode in [RationaleMode::Hard, RationaleMode::Soft] {
            let cfg = RationalizerConfig::new(2, 4, 6).with_rationale_mode(mode);
            let classifier = cfg.init_classifier::<TestBackend>(&device);
            let e = Tensor::<TestBackend, 3>::random([3, 5, 4], Distribution::Uniform(-1.0, 1.0), &device);
            let m = Tensor::<TestBackend, 2>::from_floats(
                [[1.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0, 0.0], [1.0, 1.0, 1.0, 0.0, 0.0]],
                &device,
            );
            let logits = classifier.forward(e, None, m.clone(), m);
            assert_eq!(logits.dims(), [3, 2]);
            let values = logits.into_data().convert::<f32>().to_vec::<f32>().unwrap();
            assert!(values.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_bias_only_in_hard_mode() {
        let device = Default::default();
        let hard = RationalizerConfig::new(2, 4, 6).init_classifier::<TestBackend>(&device);
        assert!(hard.predictor.bias.is_some());
        let soft = RationalizerConfig::new(2, 4, 6)
            .with_rationale_mode(RationaleMode::Soft)
            .init_classifier::<TestBackend>(&device);
        assert!(soft.predictor.bias.is_none());
    }
}
