// ============================================================
// Layer 5 — Rationalizer Model (all trainable parameters)
// ============================================================
// The burn Module that owns every parameter: the embedding
// table, the tagger, the classifier and the anti-classifier.
// It is what gets checkpointed. Training state that is not a
// parameter (optimizers, reward history) lives in
// `rationalizer::Rationalizer`.
//
// Forward pass:
//   x ─embed─▶ e ─tagger─▶ (z, neg_log_probs, z_scores, h)
//                 └─ no tagger: z = m
//   anti_classifier(e, h, 1 − z, m)   (optional)
//   classifier(e, h, z, m)
//
// Gradient boundaries keep the three losses on disjoint
// parameter subsets:
//   - a frozen embedding table is detached
//   - the hard-mode tagger sees detached embeddings, so only
//     the classifier loss reaches the embedding table
//   - the anti-classifier sees detached e, h and z, so its loss
//     only reaches its own parameters

use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::error::RationaleError;
use crate::domain::traits::EmbeddingMatrix;
use crate::ml::classifier::Classifier;
use crate::ml::config::RationalizerConfig;
use crate::ml::encoder::EncoderConfig;
use crate::ml::tagger::{Phase, Tagger};

#[derive(Module, Debug)]
pub struct RationalizerModel<B: Backend> {
    pub embedding:       Embedding<B>,
    pub tagger:          Option<Tagger<B>>,
    pub classifier:      Classifier<B>,
    pub anti_classifier: Option<Classifier<B>>,
    pub binary:          bool,
    pub fine_tuning:     bool,
}

pub struct RationalizerOutput<B: Backend> {
    /// [batch, num_labels]
    pub predict:       Tensor<B, 2>,
    /// [batch, num_labels], anti-classifier enabled only
    pub anti_predict:  Option<Tensor<B, 2>>,
    /// [batch, seq_len]
    pub z:             Tensor<B, 2>,
    /// [batch, seq_len], hard tagger only
    pub neg_log_probs: Option<Tensor<B, 2>>,
    /// [batch, seq_len, 1 or 2], tagger only
    pub z_scores:      Option<Tensor<B, 3>>,
}

impl RationalizerConfig {
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::new(
            self.model_type,
            self.cell_type,
            self.embedding_dim,
            self.hidden_dim,
            self.layer_num,
            self.kernel_size,
            self.head_num,
        )
        .with_dropout(self.dropout)
    }

    /// Build every component and copy the pretrained vectors into the
    /// embedding table.
    pub fn init<B: Backend>(
        &self,
        embeddings: &EmbeddingMatrix,
        device:     &B::Device,
    ) -> Result<RationalizerModel<B>, RationaleError> {
        self.validate()?;
        if embeddings.dim != self.embedding_dim {
            return Err(RationaleError::shape(
                "embedding matrix",
                &[embeddings.vocab_size, self.embedding_dim],
                &[embeddings.vocab_size, embeddings.dim],
            ));
        }
        if embeddings.data.len() != embeddings.vocab_size * embeddings.dim {
            return Err(RationaleError::shape(
                "embedding data",
                &[embeddings.vocab_size * embeddings.dim],
                &[embeddings.data.len()],
            ));
        }

        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(embeddings.data.clone(), [embeddings.vocab_size, embeddings.dim]),
            device,
        );
        let mut embedding = EmbeddingConfig::new(embeddings.vocab_size, embeddings.dim).init(device);
        embedding.weight = Param::from_tensor(weight);

        let tagger = self.rationale_tagger.then(|| self.init_tagger(device));
        // An anti-classifier with zero weight never reaches the reward.
        let anti_classifier = (self.loss_weights().anti != 0.0).then(|| self.init_classifier(device));

        Ok(RationalizerModel {
            embedding,
            tagger,
            classifier: self.init_classifier(device),
            anti_classifier,
            binary:      self.rationale_mode.is_binary(),
            fine_tuning: self.fine_tuning,
        })
    }
}

impl<B: Backend> RationalizerModel<B> {
    /// x: [batch, seq_len] token ids, m: [batch, seq_len] 0/1 mask
    pub fn forward(&self, x: Tensor<B, 2, Int>, m: Tensor<B, 2>, phase: Phase) -> RationalizerOutput<B> {
        let mut embeddings = self.embedding.forward(x);
        if !self.fine_tuning {
            embeddings = embeddings.detach();
        }

        let (z, neg_log_probs, z_scores, hiddens) = match &self.tagger {
            Some(tagger) => {
                let input = if self.binary { embeddings.clone().detach() } else { embeddings.clone() };
                let out = tagger.forward(input, m.clone(), phase);
                (out.z, out.neg_log_probs, Some(out.z_scores), Some(out.hiddens))
            }
            None => (m.clone(), None, None, None),
        };

        let anti_predict = self.anti_classifier.as_ref().map(|anti| {
            anti.forward(
                embeddings.clone().detach(),
                hiddens.clone().map(|h| h.detach()),
                z.clone().detach().neg().add_scalar(1.0),
                m.clone(),
            )
        });

        let predict = self.classifier.forward(embeddings, hiddens, z.clone(), m);

        RationalizerOutput { predict, anti_predict, z, neg_log_probs, z_scores }
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.weight.val().dims()[0]
    }
}
